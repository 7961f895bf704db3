use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::RegistrationError;

/// A unified identity structure returned by all providers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// The provider identifier, e.g. "github".
    pub provider_id: String,
    /// The account id at the provider.
    pub external_id: String,
    /// The email reported by the provider.
    pub email: Option<String>,
    /// The provider-side username or nickname.
    pub username: Option<String>,
    /// The real name of the user, e.g. "Jane Doe".
    pub display_name: Option<String>,
    /// Any other profile attribute the provider returned.
    pub attributes: HashMap<String, String>,
}

impl Identity {
    /// The link between this identity and a local user.
    pub fn link(&self) -> ProviderLink {
        ProviderLink {
            provider_id: self.provider_id.clone(),
            external_id: self.external_id.clone(),
        }
    }

    /// The name a local username is derived from.
    ///
    /// Falls back from the email to the provider username, then the display name,
    /// then `"{provider_id}_{external_id}"`.
    pub fn username_base(&self) -> String {
        [&self.email, &self.username, &self.display_name]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}_{}", self.provider_id, self.external_id))
    }
}

/// An ISO-4217 currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// The Mexican peso, used when nothing better is known.
    pub fn mxn() -> Self {
        Self("MXN".to_string())
    }

    /// The code, always three uppercase ASCII letters.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::mxn()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Currency {
    type Err = RegistrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(RegistrationError::Locale(format!(
                "Invalid currency code: {s:?}"
            )));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }
}

impl TryFrom<String> for Currency {
    type Error = RegistrationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.0
    }
}

/// The data a registration form is pre-filled with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUserProfile {
    /// A username no other user holds.
    pub username: String,
    /// Email address, when the provider shared one.
    pub email: Option<String>,
    /// Starting account balance.
    pub balance: i64,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name(s).
    pub last_name: Option<String>,
    /// Currency the account is kept in.
    pub currency: Currency,
}

impl NewUserProfile {
    /// Fill first and last name from a real name.
    pub fn set_real_name(&mut self, real_name: &str) {
        let (first, last) = split_real_name(real_name);
        self.first_name = first;
        self.last_name = last;
    }
}

/// Split a real name at the first space into first name and last name.
///
/// Everything after the first space belongs to the last name. Blank input yields neither.
pub fn split_real_name(real_name: &str) -> (Option<String>, Option<String>) {
    let mut parts = real_name.trim().splitn(2, ' ');
    let first = parts
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    let last = parts
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    (first, last)
}

/// Links a local user to an account at an OAuth provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderLink {
    /// The provider identifier.
    pub provider_id: String,
    /// The account id at the provider.
    pub external_id: String,
}

/// A local user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Local id.
    pub id: uuid::Uuid,
    /// Unique username.
    pub username: String,
    /// Email address.
    pub email: Option<String>,
    /// Account balance.
    pub balance: i64,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name(s).
    pub last_name: Option<String>,
    /// Account currency.
    pub currency: Currency,
    /// Disabled users are waiting for email confirmation.
    pub enabled: bool,
    /// Token sent in the confirmation email.
    pub confirmation_token: Option<String>,
    /// The provider account the user registered with.
    pub provider: Option<ProviderLink>,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a new, enabled user from a registration profile.
    pub fn from_profile(profile: NewUserProfile) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            username: profile.username,
            email: profile.email,
            balance: profile.balance,
            first_name: profile.first_name,
            last_name: profile.last_name,
            currency: profile.currency,
            enabled: true,
            confirmation_token: None,
            provider: None,
            created_at: Utc::now(),
        }
    }

    /// Link the user to a provider account.
    pub fn with_provider(mut self, link: ProviderLink) -> Self {
        self.provider = Some(link);
        self
    }
}
