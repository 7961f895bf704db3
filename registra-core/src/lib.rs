//! # Registra Core
//!
//! `registra-core` provides the foundational traits and types for registering local users
//! from a social (OAuth) login. It defines the provider identity, the strongly typed
//! new-user profile, the unique username resolver and the collaborator traits that the
//! rest of the workspace is built on.

#![warn(missing_docs)]

use async_trait::async_trait;
use std::net::IpAddr;

/// Errors that can occur during registration.
pub mod error;
pub use crate::error::RegistrationError;

/// Identity and user record types.
pub mod state;
pub use crate::state::{Currency, Identity, NewUserProfile, ProviderLink, User};

/// Unique username resolution.
pub mod username;
pub use crate::username::{Exhausted, UsernameResolver};

/// Confirmation token generation.
pub mod token;
pub use crate::token::{RandomTokenGenerator, TokenGenerator};

/// Request helpers.
pub mod utils;

/// Storage for local user records.
///
/// Usernames and emails are compared canonically (lowercase) by implementations.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RegistrationError>;

    /// Find a user by email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RegistrationError>;

    /// Find the user linked to a provider account.
    async fn find_by_provider(
        &self,
        provider_id: &str,
        external_id: &str,
    ) -> Result<Option<User>, RegistrationError>;

    /// Insert or update a user.
    async fn save_user(&self, user: &User) -> Result<(), RegistrationError>;

    /// Whether a username is already taken.
    async fn username_exists(&self, username: &str) -> Result<bool, RegistrationError> {
        Ok(self.find_by_username(username).await?.is_some())
    }
}

/// Maps a network address to the currency a new user should be billed in.
#[async_trait]
pub trait LocaleResolver: Send + Sync {
    /// Resolve the currency for the given client address.
    ///
    /// `None` means the address of the client is unknown.
    async fn currency_for(&self, ip: Option<IpAddr>) -> Result<Currency, RegistrationError>;
}

/// Sends registration emails.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send the account confirmation email to a freshly registered user.
    async fn send_confirmation_email(&self, user: &User) -> Result<(), RegistrationError>;
}

/// Trait for mapping a provider identity to a local user.
#[async_trait]
pub trait UserMapper: Send + Sync {
    /// The type of the local user object.
    type LocalUser: Send + Sync;

    /// Map an identity to a local user.
    /// This could involve creating a new user or finding an existing one.
    async fn map_user(&self, identity: &Identity) -> Result<Self::LocalUser, RegistrationError>;
}

#[async_trait]
impl UserMapper for () {
    type LocalUser = ();
    async fn map_user(&self, _identity: &Identity) -> Result<Self::LocalUser, RegistrationError> {
        Ok(())
    }
}

#[async_trait]
impl<T: UserStore + ?Sized> UserStore for std::sync::Arc<T> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RegistrationError> {
        (**self).find_by_username(username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RegistrationError> {
        (**self).find_by_email(email).await
    }

    async fn find_by_provider(
        &self,
        provider_id: &str,
        external_id: &str,
    ) -> Result<Option<User>, RegistrationError> {
        (**self).find_by_provider(provider_id, external_id).await
    }

    async fn save_user(&self, user: &User) -> Result<(), RegistrationError> {
        (**self).save_user(user).await
    }

    async fn username_exists(&self, username: &str) -> Result<bool, RegistrationError> {
        (**self).username_exists(username).await
    }
}

#[async_trait]
impl<T: LocaleResolver + ?Sized> LocaleResolver for std::sync::Arc<T> {
    async fn currency_for(&self, ip: Option<IpAddr>) -> Result<Currency, RegistrationError> {
        (**self).currency_for(ip).await
    }
}
