use async_trait::async_trait;
use http::HeaderValue;
use registra_core::{
    Currency, Identity, LocaleResolver, Mailer, NewUserProfile, ProviderLink, RegistrationError,
    TokenGenerator, User, UserMapper, UserStore,
};
use registra_flow::{
    ConfirmingFormHandler, RegisteringUserMapper, RegistrationConfig, RegistrationForm,
    RegistrationFormHandler, RegistrationRequest, RegistrationSubmission,
};
use registra_locale::StaticLocaleResolver;
use registra_store::MemoryUserStore;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<User>>,
}

impl RecordingMailer {
    fn sent(&self) -> Vec<User> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_confirmation_email(&self, user: &User) -> Result<(), RegistrationError> {
        self.sent.lock().unwrap().push(user.clone());
        Ok(())
    }
}

struct FixedTokenGenerator;

impl TokenGenerator for FixedTokenGenerator {
    fn generate_token(&self) -> String {
        "fixed-token".to_string()
    }
}

#[derive(Default)]
struct RecordingLocale {
    seen: Mutex<Vec<Option<IpAddr>>>,
}

#[async_trait]
impl LocaleResolver for RecordingLocale {
    async fn currency_for(&self, ip: Option<IpAddr>) -> Result<Currency, RegistrationError> {
        self.seen.lock().unwrap().push(ip);
        Ok("USD".parse()?)
    }
}

struct FailingLocale;

#[async_trait]
impl LocaleResolver for FailingLocale {
    async fn currency_for(&self, _ip: Option<IpAddr>) -> Result<Currency, RegistrationError> {
        Err(RegistrationError::Locale("geolocation service down".into()))
    }
}

struct UnavailableStore;

#[async_trait]
impl UserStore for UnavailableStore {
    async fn find_by_username(&self, _username: &str) -> Result<Option<User>, RegistrationError> {
        Err(RegistrationError::Store("connection refused".into()))
    }

    async fn find_by_email(&self, _email: &str) -> Result<Option<User>, RegistrationError> {
        Err(RegistrationError::Store("connection refused".into()))
    }

    async fn find_by_provider(
        &self,
        _provider_id: &str,
        _external_id: &str,
    ) -> Result<Option<User>, RegistrationError> {
        Err(RegistrationError::Store("connection refused".into()))
    }

    async fn save_user(&self, _user: &User) -> Result<(), RegistrationError> {
        Err(RegistrationError::Store("connection refused".into()))
    }
}

fn identity() -> Identity {
    Identity {
        provider_id: "google".into(),
        external_id: "109876".into(),
        email: Some("jdoe@example.com".into()),
        username: None,
        display_name: Some("Jane Doe Smith".into()),
        ..Default::default()
    }
}

fn existing(username: &str, email: &str) -> User {
    User::from_profile(NewUserProfile {
        username: username.into(),
        email: Some(email.into()),
        ..Default::default()
    })
}

fn submission(username: &str) -> RegistrationSubmission {
    RegistrationSubmission {
        username: Some(username.into()),
        email: Some("jdoe@example.com".into()),
        ..Default::default()
    }
}

struct Harness {
    store: Arc<MemoryUserStore>,
    mailer: Arc<RecordingMailer>,
}

impl Harness {
    fn new(users: Vec<User>) -> Self {
        Self {
            store: Arc::new(MemoryUserStore::with_users(users)),
            mailer: Arc::new(RecordingMailer::default()),
        }
    }

    fn handler(&self) -> registra_flow::RegistrationFormHandlerBuilder {
        RegistrationFormHandler::builder(self.store.clone(), self.mailer.clone())
            .locale_resolver(Arc::new(StaticLocaleResolver::new("EUR".parse().unwrap())))
    }
}

#[tokio::test]
async fn get_prefills_the_form_from_the_provider_profile() {
    let harness = Harness::new(vec![
        existing("jdoe@example.com", "other@example.com"),
        existing("jdoe@example.com1", "other1@example.com"),
    ]);
    let handler = harness.handler().build();
    let mut form = RegistrationForm::new();

    let processed = handler
        .process(&RegistrationRequest::get(), &mut form, &identity())
        .await
        .unwrap();

    assert!(!processed);
    assert!(!form.is_submitted());
    let data = form.data().unwrap();
    assert_eq!(data.username, "jdoe@example.com2");
    assert_eq!(data.email.as_deref(), Some("jdoe@example.com"));
    assert_eq!(data.first_name.as_deref(), Some("Jane"));
    assert_eq!(data.last_name.as_deref(), Some("Doe Smith"));
    assert_eq!(data.balance, 1);
    assert_eq!(data.currency.as_str(), "EUR");
}

#[tokio::test]
async fn valid_submission_registers_a_linked_user() {
    let harness = Harness::new(vec![]);
    let handler = harness.handler().build();
    let mut form = RegistrationForm::new();
    let request = RegistrationRequest::post(submission("jane"));

    assert!(handler
        .process(&request, &mut form, &identity())
        .await
        .unwrap());

    let user = handler.complete(&form, &identity()).await.unwrap();
    assert_eq!(user.username, "jane");
    assert!(user.enabled);
    assert_eq!(user.currency.as_str(), "EUR");
    assert_eq!(
        user.provider,
        Some(ProviderLink {
            provider_id: "google".into(),
            external_id: "109876".into(),
        })
    );
    assert_eq!(
        harness.store.find_by_provider("google", "109876").await.unwrap(),
        Some(user)
    );
    assert!(harness.mailer.sent().is_empty());
}

#[tokio::test]
async fn invalid_submission_is_not_processed() {
    let harness = Harness::new(vec![existing("jane", "jane@example.com")]);
    let handler = harness.handler().build();
    let mut form = RegistrationForm::new();

    let processed = handler
        .process(
            &RegistrationRequest::post(submission("jane")),
            &mut form,
            &identity(),
        )
        .await
        .unwrap();

    assert!(!processed);
    assert_eq!(form.errors()[0].field, "username");
    assert!(matches!(
        handler.complete(&form, &identity()).await,
        Err(RegistrationError::Form(_))
    ));
    assert_eq!(harness.store.len().await, 1);
}

#[tokio::test]
async fn exhausted_usernames_fail_the_registration() {
    let mut users = vec![existing("jdoe@example.com", "a@example.com")];
    for i in 1..=2 {
        users.push(existing(&format!("jdoe@example.com{i}"), &format!("{i}@example.com")));
    }
    let harness = Harness::new(users);
    let handler = harness
        .handler()
        .config(RegistrationConfig {
            max_iterations: 2,
            ..Default::default()
        })
        .build();
    let mut form = RegistrationForm::new();

    let err = handler
        .process(&RegistrationRequest::get(), &mut form, &identity())
        .await
        .unwrap_err();

    assert!(matches!(err, RegistrationError::UsernameExhausted(_)));
    assert!(err
        .to_string()
        .contains("could not allocate a unique identifier"));
}

#[tokio::test]
async fn store_errors_propagate() {
    let handler = RegistrationFormHandler::builder(
        Arc::new(UnavailableStore),
        Arc::new(RecordingMailer::default()),
    )
    .build();
    let mut form = RegistrationForm::new();

    let err = handler
        .process(&RegistrationRequest::get(), &mut form, &identity())
        .await
        .unwrap_err();
    assert!(matches!(err, RegistrationError::Store(_)));
}

#[tokio::test]
async fn locale_failure_uses_the_fallback_currency() {
    let harness = Harness::new(vec![]);
    let handler = harness
        .handler()
        .locale_resolver(Arc::new(FailingLocale))
        .config(RegistrationConfig {
            fallback_currency: "COP".parse().unwrap(),
            ..Default::default()
        })
        .build();
    let mut form = RegistrationForm::new();

    handler
        .process(&RegistrationRequest::get(), &mut form, &identity())
        .await
        .unwrap();
    assert_eq!(form.data().unwrap().currency.as_str(), "COP");
}

#[tokio::test]
async fn forwarded_client_address_reaches_the_locale_resolver() {
    let harness = Harness::new(vec![]);
    let locale = Arc::new(RecordingLocale::default());
    let handler = harness.handler().locale_resolver(locale.clone()).build();
    let mut form = RegistrationForm::new();
    let request = RegistrationRequest::get()
        .with_remote_addr("10.0.0.1".parse().unwrap())
        .with_header("x-forwarded-for", HeaderValue::from_static("189.203.0.1"));

    handler
        .process(&request, &mut form, &identity())
        .await
        .unwrap();

    assert_eq!(
        *locale.seen.lock().unwrap(),
        vec![Some("189.203.0.1".parse().unwrap())]
    );
    assert_eq!(form.data().unwrap().currency.as_str(), "USD");
}

#[tokio::test]
async fn delegate_display_is_prefilled() {
    let harness = Harness::new(vec![]);
    let handler = harness
        .handler()
        .form_handler(Arc::new(ConfirmingFormHandler::new(false)))
        .build();
    let mut form = RegistrationForm::new();

    let processed = handler
        .process(&RegistrationRequest::get(), &mut form, &identity())
        .await
        .unwrap();

    assert!(!processed);
    let data = form.data().unwrap();
    assert_eq!(data.username, "jdoe@example.com");
    assert_eq!(data.first_name.as_deref(), Some("Jane"));
    assert_eq!(harness.store.len().await, 0);
}

#[tokio::test]
async fn delegate_registers_and_sends_confirmation() {
    let harness = Harness::new(vec![]);
    let handler = harness
        .handler()
        .token_generator(Arc::new(FixedTokenGenerator))
        .form_handler(Arc::new(ConfirmingFormHandler::new(true)))
        .build();
    let mut form = RegistrationForm::new();

    let processed = handler
        .process(
            &RegistrationRequest::post(submission("jane")),
            &mut form,
            &identity(),
        )
        .await
        .unwrap();
    assert!(processed);

    let sent = harness.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert!(!sent[0].enabled);
    assert_eq!(sent[0].confirmation_token.as_deref(), Some("fixed-token"));

    let linked = handler.complete(&form, &identity()).await.unwrap();
    assert_eq!(linked.id, sent[0].id);
    assert_eq!(linked.provider, Some(identity().link()));
    assert_eq!(harness.store.len().await, 1);
}

#[tokio::test]
async fn delegate_rejected_submission_cannot_be_completed() {
    let harness = Harness::new(vec![existing("jane", "jane@example.com")]);
    let handler = harness
        .handler()
        .form_handler(Arc::new(ConfirmingFormHandler::new(false)))
        .build();
    let mut form = RegistrationForm::new();

    let processed = handler
        .process(
            &RegistrationRequest::post(submission("jane")),
            &mut form,
            &identity(),
        )
        .await
        .unwrap();
    assert!(!processed);
    assert!(!form.is_valid());
    assert_eq!(form.errors()[0].field, "username");

    let err = handler.complete(&form, &identity()).await.unwrap_err();
    assert!(matches!(err, RegistrationError::Form(_)));
    let jane = harness.store.find_by_username("jane").await.unwrap().unwrap();
    assert_eq!(jane.provider, None);
}

#[tokio::test]
async fn delegate_completion_keeps_an_existing_link() {
    let harness = Harness::new(vec![]);
    let handler = harness
        .handler()
        .form_handler(Arc::new(ConfirmingFormHandler::new(false)))
        .build();
    let mut form = RegistrationForm::new();
    let processed = handler
        .process(
            &RegistrationRequest::post(submission("jane")),
            &mut form,
            &identity(),
        )
        .await
        .unwrap();
    assert!(processed);

    let first = handler.complete(&form, &identity()).await.unwrap();
    assert_eq!(handler.complete(&form, &identity()).await.unwrap(), first);

    let stranger = Identity {
        provider_id: "github".into(),
        external_id: "666".into(),
        ..identity()
    };
    let err = handler.complete(&form, &stranger).await.unwrap_err();
    assert!(matches!(err, RegistrationError::Form(_)));
    assert_eq!(
        harness.store.find_by_username("jane").await.unwrap().unwrap().provider,
        Some(identity().link())
    );
}

#[tokio::test]
async fn confirmation_requires_a_token_generator() {
    let harness = Harness::new(vec![]);
    let mut handler = harness.handler().build();
    handler.set_form_handler(Some(Arc::new(ConfirmingFormHandler::new(true))));
    let mut form = RegistrationForm::new();

    let err = handler
        .process(
            &RegistrationRequest::post(submission("jane")),
            &mut form,
            &identity(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RegistrationError::Form(_)));
    assert!(harness.store.is_empty().await);
}

#[tokio::test]
async fn mapper_reuses_linked_users() {
    let linked = existing("jane", "jane@example.com").with_provider(identity().link());
    let harness = Harness::new(vec![linked.clone()]);
    let mapper = RegisteringUserMapper::new(Arc::new(harness.handler().build()));

    assert_eq!(mapper.map_user(&identity()).await.unwrap(), linked);
    assert_eq!(harness.store.len().await, 1);
}

#[tokio::test]
async fn mapper_links_users_found_by_email_when_enabled() {
    let harness = Harness::new(vec![existing("jane", "JDoe@example.com")]);
    let handler = harness
        .handler()
        .config(RegistrationConfig {
            link_by_email: true,
            ..Default::default()
        })
        .build();
    let mapper = RegisteringUserMapper::new(Arc::new(handler));

    let user = mapper.map_user(&identity()).await.unwrap();
    assert_eq!(user.username, "jane");
    assert_eq!(user.provider, Some(identity().link()));
    assert_eq!(
        harness.store.find_by_provider("google", "109876").await.unwrap(),
        Some(user)
    );
}

#[tokio::test]
async fn mapper_does_not_link_by_email_by_default() {
    let harness = Harness::new(vec![existing("jane", "jdoe@example.com")]);
    let mapper = RegisteringUserMapper::new(Arc::new(harness.handler().build()));

    let user = mapper.map_user(&identity()).await.unwrap();
    assert_eq!(user.username, "jdoe@example.com");
    assert_eq!(user.provider, Some(identity().link()));

    let jane = harness.store.find_by_username("jane").await.unwrap().unwrap();
    assert_eq!(jane.provider, None);
    assert_eq!(harness.store.len().await, 2);
}

#[tokio::test]
async fn mapper_never_relinks_a_user_found_by_email() {
    let other = ProviderLink {
        provider_id: "github".into(),
        external_id: "42".into(),
    };
    let harness = Harness::new(vec![
        existing("jane", "jdoe@example.com").with_provider(other.clone())
    ]);
    let handler = harness
        .handler()
        .config(RegistrationConfig {
            link_by_email: true,
            ..Default::default()
        })
        .build();
    let mapper = RegisteringUserMapper::new(Arc::new(handler));

    let err = mapper.map_user(&identity()).await.unwrap_err();
    assert!(matches!(err, RegistrationError::Form(_)));
    let jane = harness.store.find_by_username("jane").await.unwrap().unwrap();
    assert_eq!(jane.provider, Some(other));
}

#[tokio::test]
async fn mapper_registers_unknown_identities() {
    let harness = Harness::new(vec![existing("jdoe@example.com", "someone@example.com")]);
    let mapper = RegisteringUserMapper::new(Arc::new(harness.handler().build()));

    let user = mapper.map_user(&identity()).await.unwrap();
    assert_eq!(user.username, "jdoe@example.com1");
    assert_eq!(user.last_name.as_deref(), Some("Doe Smith"));
    assert_eq!(user.balance, 1);
    assert!(user.enabled);
    assert_eq!(harness.store.len().await, 2);
}
