//! # Social Registration Example
//!
//! Walks through what happens after an OAuth callback for a user we have never seen:
//! the registration form is displayed pre-filled from the provider profile, the user
//! submits it and the new account is linked to the provider identity.
//!
//! Configuration is read from the environment (a `.env` file works too):
//!
//! - `REGISTRA_MAX_ITERATIONS`, `REGISTRA_INITIAL_BALANCE`, `REGISTRA_FALLBACK_CURRENCY`,
//!   `REGISTRA_CONFIRMATION`, `REGISTRA_LINK_BY_EMAIL`
//! - `IPINFO_TOKEN`: geolocate clients with ipinfo.io instead of using the fallback currency
//! - `REGISTRA_CLIENT_IP`: the client address to pretend the request came from

use async_trait::async_trait;
use registra::flow::{
    ConfirmingFormHandler, RegisteringUserMapper, RegistrationConfig, RegistrationForm,
    RegistrationFormHandler, RegistrationRequest, RegistrationSubmission,
};
use registra::locale::IpInfoLocaleResolver;
use registra::store::MemoryUserStore;
use registra::{
    Identity, LocaleResolver, Mailer, NewUserProfile, RandomTokenGenerator, RegistrationError,
    User, UserMapper,
};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Logs confirmation emails instead of sending them.
struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_confirmation_email(&self, user: &User) -> Result<(), RegistrationError> {
        tracing::info!(
            to = ?user.email,
            token = ?user.confirmation_token,
            "confirmation email"
        );
        Ok(())
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn config_from_env() -> Result<RegistrationConfig, RegistrationError> {
    let defaults = RegistrationConfig::default();
    let fallback_currency = match std::env::var("REGISTRA_FALLBACK_CURRENCY") {
        Ok(code) => code.parse()?,
        Err(_) => defaults.fallback_currency,
    };
    Ok(RegistrationConfig {
        max_iterations: env_or("REGISTRA_MAX_ITERATIONS", defaults.max_iterations),
        initial_balance: env_or("REGISTRA_INITIAL_BALANCE", defaults.initial_balance),
        fallback_currency,
        confirmation_enabled: env_or("REGISTRA_CONFIRMATION", defaults.confirmation_enabled),
        link_by_email: env_or("REGISTRA_LINK_BY_EMAIL", defaults.link_by_email),
    })
}

fn locale_from_env(
    config: &RegistrationConfig,
) -> Result<Option<Arc<dyn LocaleResolver>>, Box<dyn std::error::Error>> {
    let Ok(token) = std::env::var("IPINFO_TOKEN") else {
        return Ok(None);
    };
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()?;
    let resolver = IpInfoLocaleResolver::new(config.fallback_currency.clone())
        .with_client(client)
        .with_token(token);
    Ok(Some(Arc::new(resolver)))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,registra=debug")),
        )
        .init();

    let config = config_from_env()?;
    let client_ip: Option<IpAddr> = std::env::var("REGISTRA_CLIENT_IP")
        .ok()
        .and_then(|ip| ip.parse().ok());

    // Somebody already registered with the name the provider hands us.
    let store = Arc::new(MemoryUserStore::with_users([User::from_profile(
        NewUserProfile {
            username: "jdoe@example.com".into(),
            email: Some("someone.else@example.com".into()),
            ..Default::default()
        },
    )]));

    let mut builder = RegistrationFormHandler::builder(store.clone(), Arc::new(LogMailer))
        .token_generator(Arc::new(RandomTokenGenerator))
        .config(config.clone());
    if let Some(locale) = locale_from_env(&config)? {
        builder = builder.locale_resolver(locale);
    }
    if config.confirmation_enabled {
        let template = NewUserProfile {
            balance: config.initial_balance,
            ..Default::default()
        };
        builder = builder.form_handler(Arc::new(
            ConfirmingFormHandler::new(true).with_template(template),
        ));
    }
    let handler = Arc::new(builder.build());

    let identity = Identity {
        provider_id: "google".into(),
        external_id: "109876543210".into(),
        email: Some("jdoe@example.com".into()),
        display_name: Some("Jane Doe Smith".into()),
        ..Default::default()
    };

    // 1. The callback lands on the registration page.
    let mut display = RegistrationForm::new();
    let mut request = RegistrationRequest::get();
    request.remote_addr = client_ip;
    handler.process(&request, &mut display, &identity).await?;
    let prefilled = display
        .data()
        .cloned()
        .ok_or_else(|| RegistrationError::Form("Form was not pre-filled".into()))?;
    println!("Pre-filled form: {prefilled:#?}");

    // 2. The user accepts the suggestion.
    let mut submit = RegistrationForm::new();
    submit.set_data(prefilled.clone());
    let mut request = RegistrationRequest::post(RegistrationSubmission {
        username: Some(prefilled.username.clone()),
        email: prefilled.email.clone(),
        first_name: prefilled.first_name.clone(),
        last_name: prefilled.last_name.clone(),
        currency: Some(prefilled.currency.to_string()),
    });
    request.remote_addr = client_ip;
    if !handler.process(&request, &mut submit, &identity).await? {
        println!("Registration rejected: {:?}", submit.errors());
        return Ok(());
    }
    let user = handler.complete(&submit, &identity).await?;
    println!("Registered: {user:#?}");

    // 3. The next login with the same account maps straight to the user.
    let mapper = RegisteringUserMapper::new(handler.clone());
    let again = mapper.map_user(&identity).await?;
    println!("Next login maps to {} ({})", again.username, again.id);

    Ok(())
}
