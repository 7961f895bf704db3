use registra_core::{
    Identity, LocaleResolver, Mailer, NewUserProfile, RegistrationError, TokenGenerator, User,
    UserStore, UsernameResolver,
};
use registra_locale::StaticLocaleResolver;
use std::net::IpAddr;
use std::sync::Arc;

use crate::config::RegistrationConfig;
use crate::delegate::{FormHandler, RegistrationServices};
use crate::form::RegistrationForm;
use crate::request::RegistrationRequest;

/// Registers local users from social login callbacks.
///
/// The form is pre-filled from the provider profile: a unique username, the email, the
/// real name split into first and last name, the starting balance and the currency of the
/// client's locale. When a delegate [`FormHandler`] is configured it owns binding and
/// persisting the form.
pub struct RegistrationFormHandler {
    services: RegistrationServices,
    locale: Arc<dyn LocaleResolver>,
    resolver: UsernameResolver,
    config: RegistrationConfig,
    form_handler: Option<Arc<dyn FormHandler>>,
}

impl RegistrationFormHandler {
    /// Create a new [`RegistrationFormHandlerBuilder`].
    pub fn builder(
        store: Arc<dyn UserStore>,
        mailer: Arc<dyn Mailer>,
    ) -> RegistrationFormHandlerBuilder {
        RegistrationFormHandlerBuilder {
            store,
            mailer,
            token_generator: None,
            locale: None,
            config: RegistrationConfig::default(),
            form_handler: None,
        }
    }

    /// Set or remove the delegate form handler.
    pub fn set_form_handler(&mut self, form_handler: Option<Arc<dyn FormHandler>>) {
        self.form_handler = form_handler;
    }

    /// The active configuration.
    pub fn config(&self) -> &RegistrationConfig {
        &self.config
    }

    /// The collaborators shared with delegate form handlers.
    pub fn services(&self) -> &RegistrationServices {
        &self.services
    }

    /// Process the registration form for a social login.
    ///
    /// Returns `true` when the submitted form is valid (or, with a delegate, when the
    /// delegate registered the user).
    pub async fn process(
        &self,
        request: &RegistrationRequest,
        form: &mut RegistrationForm,
        identity: &Identity,
    ) -> Result<bool, RegistrationError> {
        if let Some(form_handler) = &self.form_handler {
            let processed = form_handler.process(request, form, &self.services).await?;

            if !request.is_post() {
                let profile = form.take_data().unwrap_or_default();
                let profile = self.populate(profile, identity, request.client_ip()).await?;
                form.set_data(profile);
            }

            return Ok(processed);
        }

        let profile = self
            .populate(NewUserProfile::default(), identity, request.client_ip())
            .await?;
        form.set_data(profile);

        if !request.is_post() {
            return Ok(false);
        }
        let submission = request
            .submission
            .as_ref()
            .ok_or_else(|| RegistrationError::Form("Missing form submission".into()))?;

        form.bind(submission);
        form.validate_unique(self.services.store.as_ref()).await?;
        Ok(form.is_valid())
    }

    /// Fill `profile` with what the provider told us about the user.
    pub async fn populate(
        &self,
        mut profile: NewUserProfile,
        identity: &Identity,
        client_ip: Option<IpAddr>,
    ) -> Result<NewUserProfile, RegistrationError> {
        profile.username = self
            .resolver
            .resolve_in(&identity.username_base(), self.services.store.as_ref())
            .await?;

        if let Some(email) = &identity.email {
            profile.email = Some(email.clone());
        }

        profile.balance = self.config.initial_balance;

        if let Some(real_name) = identity.display_name.as_deref() {
            profile.set_real_name(real_name);
        }

        profile.currency = match self.locale.currency_for(client_ip).await {
            Ok(currency) => currency,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    fallback = %self.config.fallback_currency,
                    "locale resolution failed, using fallback currency"
                );
                self.config.fallback_currency.clone()
            }
        };

        Ok(profile)
    }

    /// Connect a successfully processed form to the provider identity.
    ///
    /// Without a delegate the user is created here. A delegate already saved the user, so
    /// it is only linked to the provider account. Invalid forms and users linked to a
    /// different provider account are rejected.
    pub async fn complete(
        &self,
        form: &RegistrationForm,
        identity: &Identity,
    ) -> Result<User, RegistrationError> {
        let profile = form
            .data()
            .ok_or_else(|| RegistrationError::Form("Form has no data".into()))?;
        if !form.is_valid() {
            return Err(RegistrationError::Form("Form is not valid".into()));
        }

        if self.form_handler.is_some() {
            let mut user = self
                .services
                .store
                .find_by_username(&profile.username)
                .await?
                .ok_or_else(|| {
                    RegistrationError::Form(format!(
                        "No registered user named {:?}",
                        profile.username
                    ))
                })?;
            let link = identity.link();
            if let Some(existing) = user.provider.as_ref().filter(|p| **p != link) {
                tracing::warn!(
                    user_id = %user.id,
                    linked = %existing.provider_id,
                    provider = %link.provider_id,
                    "refusing to relink user"
                );
                return Err(RegistrationError::Form(format!(
                    "User {:?} is already linked to another account",
                    user.username
                )));
            }
            if user.provider.is_none() {
                user.provider = Some(link);
                self.services.store.save_user(&user).await?;
            }
            return Ok(user);
        }

        self.services
            .register(
                profile.clone(),
                Some(identity.link()),
                self.config.confirmation_enabled,
            )
            .await
    }
}

/// A builder for configuring and creating a [`RegistrationFormHandler`].
pub struct RegistrationFormHandlerBuilder {
    store: Arc<dyn UserStore>,
    mailer: Arc<dyn Mailer>,
    token_generator: Option<Arc<dyn TokenGenerator>>,
    locale: Option<Arc<dyn LocaleResolver>>,
    config: RegistrationConfig,
    form_handler: Option<Arc<dyn FormHandler>>,
}

impl RegistrationFormHandlerBuilder {
    /// Set the generator for confirmation tokens.
    pub fn token_generator(mut self, generator: Arc<dyn TokenGenerator>) -> Self {
        self.token_generator = Some(generator);
        self
    }

    /// Set the locale resolver. Defaults to the fallback currency for everyone.
    pub fn locale_resolver(mut self, locale: Arc<dyn LocaleResolver>) -> Self {
        self.locale = Some(locale);
        self
    }

    /// Set the configuration.
    pub fn config(mut self, config: RegistrationConfig) -> Self {
        self.config = config;
        self
    }

    /// Delegate binding and persisting the form to another handler.
    pub fn form_handler(mut self, form_handler: Arc<dyn FormHandler>) -> Self {
        self.form_handler = Some(form_handler);
        self
    }

    /// Build the [`RegistrationFormHandler`].
    pub fn build(self) -> RegistrationFormHandler {
        let locale: Arc<dyn LocaleResolver> = match self.locale {
            Some(locale) => locale,
            None => Arc::new(StaticLocaleResolver::new(
                self.config.fallback_currency.clone(),
            )),
        };
        RegistrationFormHandler {
            services: RegistrationServices {
                store: self.store,
                mailer: self.mailer,
                token_generator: self.token_generator,
            },
            locale,
            resolver: UsernameResolver::new(self.config.max_iterations),
            config: self.config,
            form_handler: self.form_handler,
        }
    }
}
