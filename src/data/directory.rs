//! User directory capability
//!
//! The federation core reads accounts through [`UserDirectory`] only, so it
//! can run against SQLite in production and an in-memory map in tests.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::models::ActorIdentity;
use crate::error::AppError;

/// Read-only account lookup
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Find an account by exact username
    async fn find_by_username(&self, username: &str) -> Result<Option<ActorIdentity>, AppError>;

    /// Number of accounts; may be approximate
    async fn count(&self) -> Result<u64, AppError>;
}

/// In-memory directory
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    users: RwLock<HashMap<String, ActorIdentity>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an identity
    pub async fn insert(&self, identity: ActorIdentity) {
        let mut users = self.users.write().await;
        users.insert(identity.username.clone(), identity);
    }
}

impl FromIterator<ActorIdentity> for MemoryDirectory {
    fn from_iter<I: IntoIterator<Item = ActorIdentity>>(iter: I) -> Self {
        let users = iter
            .into_iter()
            .map(|identity| (identity.username.clone(), identity))
            .collect();
        Self {
            users: RwLock::new(users),
        }
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<ActorIdentity>, AppError> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.users.read().await.len() as u64)
    }
}
