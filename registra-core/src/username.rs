use crate::{RegistrationError, UserStore};

/// The default number of suffixed variants tried after the base name.
pub const DEFAULT_MAX_ITERATIONS: u32 = 5;

/// Every candidate derived from a base name was already taken.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("registration failed: could not allocate a unique identifier for {base:?} after {attempts} attempts")]
pub struct Exhausted {
    /// The name the candidates were derived from.
    pub base: String,
    /// Number of suffixed variants tried.
    pub attempts: u32,
}

/// Finds a username nobody holds by appending an increasing counter to a base name.
///
/// `jdoe` is tried first, then `jdoe1`, `jdoe2` and so on up to `jdoe{max_iterations}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsernameResolver {
    max_iterations: u32,
}

impl Default for UsernameResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITERATIONS)
    }
}

impl UsernameResolver {
    /// Create a resolver that tries at most `max_iterations` suffixed variants.
    pub fn new(max_iterations: u32) -> Self {
        Self { max_iterations }
    }

    /// The configured number of suffixed variants.
    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// The candidates for `base`, in probing order.
    pub fn candidates<'a>(&self, base: &'a str) -> Candidates<'a> {
        Candidates {
            base,
            next: Some(0),
            max: self.max_iterations,
        }
    }

    /// Resolve a unique name given an infallible existence check.
    pub fn resolve<F>(&self, base: &str, mut exists: F) -> Result<String, Exhausted>
    where
        F: FnMut(&str) -> bool,
    {
        self.try_resolve(base, |candidate| Ok::<_, Exhausted>(exists(candidate)))
    }

    /// Resolve a unique name given a fallible existence check.
    ///
    /// A lookup error aborts the resolution and is returned unchanged.
    pub fn try_resolve<F, E>(&self, base: &str, mut exists: F) -> Result<String, E>
    where
        F: FnMut(&str) -> Result<bool, E>,
        E: From<Exhausted>,
    {
        for candidate in self.candidates(base) {
            if !exists(&candidate)? {
                return Ok(candidate);
            }
        }
        Err(self.exhausted(base).into())
    }

    /// Resolve a unique name against a user store.
    pub async fn resolve_in<S>(&self, base: &str, store: &S) -> Result<String, RegistrationError>
    where
        S: UserStore + ?Sized,
    {
        for candidate in self.candidates(base) {
            if !store.username_exists(&candidate).await? {
                tracing::debug!(base, username = %candidate, "resolved unique username");
                return Ok(candidate);
            }
            tracing::debug!(username = %candidate, "username taken");
        }
        Err(self.exhausted(base).into())
    }

    fn exhausted(&self, base: &str) -> Exhausted {
        Exhausted {
            base: base.to_string(),
            attempts: self.max_iterations,
        }
    }
}

/// Iterator over the candidate names for a base name.
#[derive(Debug, Clone)]
pub struct Candidates<'a> {
    base: &'a str,
    next: Option<u32>,
    max: u32,
}

impl Iterator for Candidates<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let attempt = self.next?;
        self.next = attempt.checked_add(1).filter(|n| *n <= self.max);
        if attempt == 0 {
            Some(self.base.to_string())
        } else {
            Some(format!("{}{}", self.base, attempt))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let Some(next) = self.next else {
            return (0, Some(0));
        };
        // `max - next + 1` can exceed `u32::MAX`.
        let remaining = u64::from(self.max - next) + 1;
        match usize::try_from(remaining) {
            Ok(remaining) => (remaining, Some(remaining)),
            Err(_) => (usize::MAX, None),
        }
    }
}
