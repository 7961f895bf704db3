use crate::username::Exhausted;

/// Errors that can occur while registering a user.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// No free username could be found within the configured attempts.
    #[error(transparent)]
    UsernameExhausted(#[from] Exhausted),
    /// The user store failed.
    #[error("Store error: {0}")]
    Store(String),
    /// The locale resolver failed.
    #[error("Locale error: {0}")]
    Locale(String),
    /// The mailer failed.
    #[error("Mailer error: {0}")]
    Mailer(String),
    /// The registration form could not be processed.
    #[error("Form error: {0}")]
    Form(String),
    /// The provider identity lacks data required to register.
    #[error("Incomplete identity: {0}")]
    IncompleteIdentity(String),
}
