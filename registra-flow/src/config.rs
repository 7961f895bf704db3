use registra_core::{username::DEFAULT_MAX_ITERATIONS, Currency};
use serde::{Deserialize, Serialize};

/// Settings for registering users from a social login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// How many suffixed usernames are tried after the base name.
    pub max_iterations: u32,
    /// Balance new accounts start with.
    pub initial_balance: i64,
    /// Currency used when the client's locale cannot be resolved.
    pub fallback_currency: Currency,
    /// Whether new users must confirm their email before they are enabled.
    pub confirmation_enabled: bool,
    /// Whether a provider identity may be linked to an unlinked local user with the same
    /// email. Only enable this for providers that verify email addresses.
    pub link_by_email: bool,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            initial_balance: 1,
            fallback_currency: Currency::mxn(),
            confirmation_enabled: false,
            link_by_email: false,
        }
    }
}
