//! # Registra Locale
//!
//! Implementations of [`LocaleResolver`] that decide which currency a new account is
//! opened in.
//!
//! - **[`StaticLocaleResolver`]**: always answers with the same currency.
//! - **[`IpInfoLocaleResolver`]**: geolocates the client address with ipinfo.io and maps
//!   the country to its currency.

#![warn(missing_docs)]

use async_trait::async_trait;
use registra_core::{Currency, LocaleResolver, RegistrationError};
use std::net::IpAddr;

/// Country to currency mapping.
pub mod currency;
/// ipinfo.io backed resolver.
pub mod ipinfo;

pub use currency::currency_for_country;
pub use ipinfo::IpInfoLocaleResolver;

/// A resolver that ignores the client address.
#[derive(Debug, Clone, Default)]
pub struct StaticLocaleResolver {
    currency: Currency,
}

impl StaticLocaleResolver {
    /// Create a resolver that always returns `currency`.
    pub fn new(currency: Currency) -> Self {
        Self { currency }
    }
}

#[async_trait]
impl LocaleResolver for StaticLocaleResolver {
    async fn currency_for(&self, _ip: Option<IpAddr>) -> Result<Currency, RegistrationError> {
        Ok(self.currency.clone())
    }
}

/// Whether an address can be geolocated at all.
pub(crate) fn is_routable(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_documentation())
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            let unique_local = first & 0xfe00 == 0xfc00;
            let link_local = first & 0xffc0 == 0xfe80;
            !(v6.is_loopback() || v6.is_unspecified() || unique_local || link_local)
        }
    }
}
