//! # Registra Flow
//!
//! `registra-flow` turns a completed social login into a local user. It pre-fills the
//! registration form from the provider profile, lets the user submit it and persists the
//! result, optionally through a delegate registration form handler.
//!
//! ## Key Components
//!
//! - **[`RegistrationFormHandler`]**: The glue between the OAuth callback and the form.
//! - **[`RegistrationForm`]**: The form data, binding and validation.
//! - **[`FormHandler`]**: Delegate handlers; [`ConfirmingFormHandler`] is the built-in one.
//! - **[`RegisteringUserMapper`]**: A [`UserMapper`] that registers users without a form.

#![warn(missing_docs)]

pub use registra_core::{
    Currency, Identity, NewUserProfile, RegistrationError, User, UserMapper, UsernameResolver,
};

/// Registration settings.
pub mod config;
/// Delegate form handlers and shared services.
pub mod delegate;
/// The registration form.
pub mod form;
/// The registration form handler.
pub mod handler;
/// Formless registration through [`UserMapper`].
pub mod mapper;
/// Request types.
pub mod request;

pub use config::RegistrationConfig;
pub use delegate::{ConfirmingFormHandler, FormHandler, RegistrationServices};
pub use form::{FormError, RegistrationForm};
pub use handler::{RegistrationFormHandler, RegistrationFormHandlerBuilder};
pub use mapper::RegisteringUserMapper;
pub use request::{RegistrationRequest, RegistrationSubmission};
