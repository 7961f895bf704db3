use async_trait::async_trait;
use registra_core::{RegistrationError, User, UserStore};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Keeps users in memory. Lost on restart; meant for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<uuid::Uuid, User>>,
}

fn canonicalize(value: &str) -> String {
    value.trim().to_lowercase()
}

impl MemoryUserStore {
    /// Create a store seeded with `users`.
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: RwLock::new(users.into_iter().map(|u| (u.id, u)).collect()),
        }
    }

    /// Number of stored users.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    /// Whether the store holds no users.
    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    async fn find<F>(&self, predicate: F) -> Option<User>
    where
        F: Fn(&User) -> bool,
    {
        self.users
            .read()
            .await
            .values()
            .find(|u| predicate(u))
            .cloned()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RegistrationError> {
        let wanted = canonicalize(username);
        Ok(self.find(|u| canonicalize(&u.username) == wanted).await)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RegistrationError> {
        let wanted = canonicalize(email);
        Ok(self
            .find(|u| u.email.as_deref().map(canonicalize).as_deref() == Some(wanted.as_str()))
            .await)
    }

    async fn find_by_provider(
        &self,
        provider_id: &str,
        external_id: &str,
    ) -> Result<Option<User>, RegistrationError> {
        Ok(self
            .find(|u| {
                u.provider.as_ref().is_some_and(|link| {
                    link.provider_id == provider_id && link.external_id == external_id
                })
            })
            .await)
    }

    async fn save_user(&self, user: &User) -> Result<(), RegistrationError> {
        let mut users = self.users.write().await;
        let wanted = canonicalize(&user.username);
        if users
            .values()
            .any(|u| u.id != user.id && canonicalize(&u.username) == wanted)
        {
            return Err(RegistrationError::Store(format!(
                "Username {:?} is already taken",
                user.username
            )));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }
}
