use async_trait::async_trait;
use registra_core::{
    Mailer, NewUserProfile, ProviderLink, RegistrationError, TokenGenerator, User, UserStore,
};
use std::sync::Arc;

use crate::form::RegistrationForm;
use crate::request::RegistrationRequest;

/// The collaborators a registration needs, shared with delegate form handlers.
#[derive(Clone)]
pub struct RegistrationServices {
    /// Where users are looked up and saved.
    pub store: Arc<dyn UserStore>,
    /// Sends confirmation emails.
    pub mailer: Arc<dyn Mailer>,
    /// Generates confirmation tokens. Required when confirmation is enabled.
    pub token_generator: Option<Arc<dyn TokenGenerator>>,
}

impl RegistrationServices {
    /// Persist a new user built from `profile`.
    ///
    /// With `confirmation` the user is saved disabled and a confirmation email is sent.
    pub async fn register(
        &self,
        profile: NewUserProfile,
        link: Option<ProviderLink>,
        confirmation: bool,
    ) -> Result<User, RegistrationError> {
        let mut user = User::from_profile(profile);
        user.provider = link;

        if confirmation {
            user.enabled = false;
            let generator = self.token_generator.as_ref().ok_or_else(|| {
                RegistrationError::Form(
                    "Confirmation is enabled but no token generator is configured".into(),
                )
            })?;
            user.confirmation_token = Some(generator.generate_token());
        }

        self.store.save_user(&user).await?;
        if confirmation {
            self.mailer.send_confirmation_email(&user).await?;
        }

        tracing::info!(
            user_id = %user.id,
            username = %user.username,
            enabled = user.enabled,
            "registered user"
        );
        Ok(user)
    }
}

/// A registration form handler that takes over binding and persisting the form.
///
/// Handlers receive the form to process and the shared services on every call, so the
/// same handler serves any form.
#[async_trait]
pub trait FormHandler: Send + Sync {
    /// Process the form. Returns `true` once a user was registered.
    async fn process(
        &self,
        request: &RegistrationRequest,
        form: &mut RegistrationForm,
        services: &RegistrationServices,
    ) -> Result<bool, RegistrationError>;
}

/// Registers users from a submitted form, optionally requiring email confirmation.
#[derive(Debug, Clone, Default)]
pub struct ConfirmingFormHandler {
    confirmation: bool,
    template: NewUserProfile,
}

impl ConfirmingFormHandler {
    /// Create a handler; `confirmation` disables new users until they confirm their email.
    pub fn new(confirmation: bool) -> Self {
        Self {
            confirmation,
            template: NewUserProfile::default(),
        }
    }

    /// Profile the form starts from, e.g. to carry a starting balance.
    pub fn with_template(mut self, template: NewUserProfile) -> Self {
        self.template = template;
        self
    }
}

#[async_trait]
impl FormHandler for ConfirmingFormHandler {
    async fn process(
        &self,
        request: &RegistrationRequest,
        form: &mut RegistrationForm,
        services: &RegistrationServices,
    ) -> Result<bool, RegistrationError> {
        form.set_data(self.template.clone());

        if !request.is_post() {
            return Ok(false);
        }
        let submission = request
            .submission
            .as_ref()
            .ok_or_else(|| RegistrationError::Form("Missing form submission".into()))?;

        form.bind(submission);
        form.validate_unique(services.store.as_ref()).await?;
        if !form.is_valid() {
            return Ok(false);
        }

        let profile = form
            .data()
            .cloned()
            .ok_or_else(|| RegistrationError::Form("Form has no data".into()))?;
        services.register(profile, None, self.confirmation).await?;
        Ok(true)
    }
}
