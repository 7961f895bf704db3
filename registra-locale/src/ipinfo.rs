use async_trait::async_trait;
use registra_core::{Currency, LocaleResolver, RegistrationError};
use serde::Deserialize;
use std::net::IpAddr;
use url::Url;

use crate::{currency::currency_for_country, is_routable};

const IPINFO_BASE_URL: &str = "https://ipinfo.io";

#[derive(Debug, Deserialize)]
struct IpInfoResponse {
    country: Option<String>,
}

/// Resolves the currency of a client by geolocating its address with ipinfo.io.
///
/// Addresses that cannot be geolocated and countries without a known currency resolve to
/// the fallback currency. Transport and HTTP errors are returned to the caller.
#[derive(Debug, Clone)]
pub struct IpInfoLocaleResolver {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    fallback: Currency,
}

impl IpInfoLocaleResolver {
    /// Create a resolver against the public ipinfo.io API.
    pub fn new(fallback: Currency) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: IPINFO_BASE_URL.to_string(),
            token: None,
            fallback,
        }
    }

    /// Point the resolver at another ipinfo compatible endpoint.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, RegistrationError> {
        Url::parse(base_url)
            .map_err(|e| RegistrationError::Locale(format!("Invalid ipinfo base url: {e}")))?;
        self.base_url = base_url.to_string();
        Ok(self)
    }

    /// Authenticate requests with an ipinfo access token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Use a preconfigured HTTP client, e.g. one with a request timeout.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// The currency returned when nothing better is known.
    pub fn fallback(&self) -> &Currency {
        &self.fallback
    }

    fn lookup_url(&self, ip: IpAddr) -> Result<Url, RegistrationError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| RegistrationError::Locale(format!("Invalid ipinfo base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| RegistrationError::Locale("ipinfo base url cannot be a base".into()))?
            .pop_if_empty()
            .push(&ip.to_string())
            .push("json");
        Ok(url)
    }

    async fn lookup_country(&self, ip: IpAddr) -> Result<Option<String>, RegistrationError> {
        let mut request = self.client.get(self.lookup_url(ip)?);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| RegistrationError::Locale(format!("ipinfo request failed: {e}")))?;

        let info: IpInfoResponse = response
            .json()
            .await
            .map_err(|e| RegistrationError::Locale(format!("Invalid ipinfo response: {e}")))?;

        Ok(info.country)
    }
}

#[async_trait]
impl LocaleResolver for IpInfoLocaleResolver {
    async fn currency_for(&self, ip: Option<IpAddr>) -> Result<Currency, RegistrationError> {
        let ip = match ip {
            Some(ip) if is_routable(&ip) => ip,
            _ => return Ok(self.fallback.clone()),
        };

        let country = self.lookup_country(ip).await?;
        let currency = country
            .as_deref()
            .and_then(currency_for_country)
            .unwrap_or_else(|| self.fallback.clone());

        tracing::debug!(%ip, ?country, %currency, "resolved client currency");
        Ok(currency)
    }
}
