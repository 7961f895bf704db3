use http::HeaderMap;
use std::net::IpAddr;

/// Header set by reverse proxies with the chain of client addresses.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Determine the address of the client that sent a request.
///
/// The first parseable entry of `X-Forwarded-For` wins over the socket's remote address.
pub fn client_ip(headers: &HeaderMap, remote_addr: Option<IpAddr>) -> Option<IpAddr> {
    headers
        .get(X_FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            value
                .split(',')
                .map(str::trim)
                .find_map(|entry| entry.parse::<IpAddr>().ok())
        })
        .or(remote_addr)
}
