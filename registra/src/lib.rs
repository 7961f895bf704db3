//! # Registra
//!
//! Register local users from social logins.
//!
//! This crate re-exports the `registra-*` crates behind cargo features:
//!
//! - `flow`: the registration form handler and user mapper ([`flow`]).
//! - `locale`: currency resolution from the client address ([`locale`]).
//! - `store`: the in-memory user store ([`store`]).
//! - `full`: all of the above.

pub use registra_core::*;

#[cfg(feature = "flow")]
pub use registra_flow as flow;

#[cfg(feature = "locale")]
pub use registra_locale as locale;

#[cfg(feature = "store")]
pub use registra_store as store;
