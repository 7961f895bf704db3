use http::{HeaderMap, HeaderValue, Method};
use registra_core::utils;
use serde::Deserialize;
use std::net::IpAddr;

/// Fields posted by the registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RegistrationSubmission {
    /// Chosen username.
    pub username: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name(s).
    pub last_name: Option<String>,
    /// ISO-4217 currency code.
    pub currency: Option<String>,
}

/// The parts of an HTTP request the registration flow looks at.
#[derive(Debug, Clone, Default)]
pub struct RegistrationRequest {
    /// HTTP method; only `POST` submits the form.
    pub method: Method,
    /// Request headers.
    pub headers: HeaderMap,
    /// Address of the connected peer.
    pub remote_addr: Option<IpAddr>,
    /// Posted form fields.
    pub submission: Option<RegistrationSubmission>,
}

impl RegistrationRequest {
    /// A request that displays the form.
    pub fn get() -> Self {
        Self::default()
    }

    /// A request that submits the form.
    pub fn post(submission: RegistrationSubmission) -> Self {
        Self {
            method: Method::POST,
            submission: Some(submission),
            ..Self::default()
        }
    }

    /// Set the address of the peer that sent the request.
    pub fn with_remote_addr(mut self, addr: IpAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Add a header.
    pub fn with_header(mut self, name: &'static str, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Whether the form was submitted.
    pub fn is_post(&self) -> bool {
        self.method == Method::POST
    }

    /// The client address, honouring `X-Forwarded-For`.
    pub fn client_ip(&self) -> Option<IpAddr> {
        utils::client_ip(&self.headers, self.remote_addr)
    }
}
