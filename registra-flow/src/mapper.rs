use async_trait::async_trait;
use registra_core::{Identity, NewUserProfile, RegistrationError, User, UserMapper};
use std::net::IpAddr;
use std::sync::Arc;

use crate::handler::RegistrationFormHandler;

/// Maps a provider identity to a local user, registering one when none exists.
///
/// Users are matched by provider account first. With
/// [`RegistrationConfig::link_by_email`](crate::RegistrationConfig::link_by_email) set, an
/// unlinked user with the same email is linked to this identity; otherwise a new user is
/// registered.
#[derive(Clone)]
pub struct RegisteringUserMapper {
    handler: Arc<RegistrationFormHandler>,
}

impl RegisteringUserMapper {
    /// Create a mapper that registers through `handler`.
    pub fn new(handler: Arc<RegistrationFormHandler>) -> Self {
        Self { handler }
    }

    /// Map an identity, resolving the currency of new users from `client_ip`.
    pub async fn map_user_from(
        &self,
        identity: &Identity,
        client_ip: Option<IpAddr>,
    ) -> Result<User, RegistrationError> {
        let services = self.handler.services();

        if let Some(user) = services
            .store
            .find_by_provider(&identity.provider_id, &identity.external_id)
            .await?
        {
            tracing::debug!(user_id = %user.id, provider = %identity.provider_id, "reusing linked user");
            return Ok(user);
        }

        let email = identity.email.as_deref().filter(|e| !e.trim().is_empty());
        if let Some(email) = email.filter(|_| self.handler.config().link_by_email) {
            if let Some(mut user) = services.store.find_by_email(email).await? {
                if user.provider.is_some() {
                    return Err(RegistrationError::Form(format!(
                        "User with email {email:?} is already linked to another account"
                    )));
                }
                user.provider = Some(identity.link());
                services.store.save_user(&user).await?;
                tracing::info!(user_id = %user.id, provider = %identity.provider_id, "linked existing user");
                return Ok(user);
            }
        }

        let profile = self
            .handler
            .populate(NewUserProfile::default(), identity, client_ip)
            .await?;
        services
            .register(
                profile,
                Some(identity.link()),
                self.handler.config().confirmation_enabled,
            )
            .await
    }
}

#[async_trait]
impl UserMapper for RegisteringUserMapper {
    type LocalUser = User;

    async fn map_user(&self, identity: &Identity) -> Result<Self::LocalUser, RegistrationError> {
        self.map_user_from(identity, None).await
    }
}
