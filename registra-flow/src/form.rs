use registra_core::{Currency, NewUserProfile, RegistrationError, UserStore};

use crate::request::RegistrationSubmission;

const USERNAME_MIN_LEN: usize = 2;
const FIELD_MAX_LEN: usize = 180;

/// A validation failure on a single form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormError {
    /// The offending field.
    pub field: &'static str,
    /// Human readable reason.
    pub message: String,
}

impl FormError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// The registration form: the profile shown to the user and the outcome of submitting it.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    data: Option<NewUserProfile>,
    submitted: bool,
    errors: Vec<FormError>,
}

impl RegistrationForm {
    /// An empty, unsubmitted form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the form data.
    pub fn set_data(&mut self, data: NewUserProfile) {
        self.data = Some(data);
    }

    /// The current form data.
    pub fn data(&self) -> Option<&NewUserProfile> {
        self.data.as_ref()
    }

    /// Take the form data out of the form.
    pub fn take_data(&mut self) -> Option<NewUserProfile> {
        self.data.take()
    }

    /// Whether a submission was bound.
    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Whether a submission was bound and passed validation.
    pub fn is_valid(&self) -> bool {
        self.submitted && self.errors.is_empty()
    }

    /// Validation failures of the last submission.
    pub fn errors(&self) -> &[FormError] {
        &self.errors
    }

    /// Apply submitted fields on top of the current data and validate them.
    ///
    /// Fields missing from the submission keep their current value.
    pub fn bind(&mut self, submission: &RegistrationSubmission) {
        let mut data = self.data.take().unwrap_or_default();
        let mut errors = Vec::new();

        if let Some(username) = &submission.username {
            data.username = username.trim().to_string();
        }
        if let Some(email) = &submission.email {
            let email = email.trim();
            data.email = (!email.is_empty()).then(|| email.to_string());
        }
        if let Some(first_name) = &submission.first_name {
            data.first_name = non_blank(first_name);
        }
        if let Some(last_name) = &submission.last_name {
            data.last_name = non_blank(last_name);
        }
        if let Some(code) = &submission.currency {
            match code.parse::<Currency>() {
                Ok(currency) => data.currency = currency,
                Err(_) => errors.push(FormError::new("currency", "The currency is not valid.")),
            }
        }

        errors.extend(validate(&data));
        self.data = Some(data);
        self.errors = errors;
        self.submitted = true;
    }

    /// Reject usernames and emails that already belong to someone.
    pub async fn validate_unique<S>(&mut self, store: &S) -> Result<(), RegistrationError>
    where
        S: UserStore + ?Sized,
    {
        let Some(data) = &self.data else {
            return Ok(());
        };

        if !data.username.is_empty() && store.username_exists(&data.username).await? {
            self.errors
                .push(FormError::new("username", "The username is already used."));
        }
        if let Some(email) = &data.email {
            if store.find_by_email(email).await?.is_some() {
                self.errors
                    .push(FormError::new("email", "The email is already used."));
            }
        }
        Ok(())
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn validate(data: &NewUserProfile) -> Vec<FormError> {
    let mut errors = Vec::new();

    let username_len = data.username.chars().count();
    if username_len == 0 {
        errors.push(FormError::new("username", "Please enter a username."));
    } else if username_len < USERNAME_MIN_LEN {
        errors.push(FormError::new("username", "The username is too short."));
    } else if username_len > FIELD_MAX_LEN {
        errors.push(FormError::new("username", "The username is too long."));
    }

    match &data.email {
        None => errors.push(FormError::new("email", "Please enter an email.")),
        Some(email) if email.chars().count() > FIELD_MAX_LEN => {
            errors.push(FormError::new("email", "The email is too long."))
        }
        Some(email) if !looks_like_email(email) => {
            errors.push(FormError::new("email", "The email is not valid."))
        }
        Some(_) => {}
    }

    errors
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(' ')
        }
        None => false,
    }
}
