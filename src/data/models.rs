//! Data models
//!
//! Rust structs representing database rows and the identity view the
//! federation core reads. Row IDs are ULIDs, timestamps are chrono.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Longest accepted username
pub const MAX_USERNAME_LEN: usize = 64;

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Users
// =============================================================================

/// A local account row
///
/// `private_key_pem` stays in the data and provisioning layers; the
/// federation core only ever sees [`ActorIdentity`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    /// RSA public key (PEM SPKI), empty until provisioned
    pub public_key_pem: String,
    /// RSA private key (PEM PKCS#8), empty until provisioned
    pub private_key_pem: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// New row without key material
    pub fn new(username: &str) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new().0,
            username: username.to_string(),
            public_key_pem: String::new(),
            private_key_pem: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_key(&self) -> bool {
        !self.public_key_pem.is_empty()
    }
}

/// One local account as exposed to the federation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorIdentity {
    pub username: String,
    /// May be empty before key provisioning
    pub public_key_pem: String,
}

impl ActorIdentity {
    pub fn new(username: impl Into<String>, public_key_pem: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            public_key_pem: public_key_pem.into(),
        }
    }
}

impl From<UserRecord> for ActorIdentity {
    fn from(record: UserRecord) -> Self {
        Self {
            username: record.username,
            public_key_pem: record.public_key_pem,
        }
    }
}

/// Check that a username is safe as a URL path segment and WebFinger local part.
///
/// Accepts ASCII letters, digits, `_`, `-` and `.`.
pub fn validate_username(username: &str) -> Result<(), AppError> {
    if username.is_empty() {
        return Err(AppError::Validation("username cannot be empty".to_string()));
    }

    if username.len() > MAX_USERNAME_LEN {
        return Err(AppError::Validation(format!(
            "username must be at most {} characters",
            MAX_USERNAME_LEN
        )));
    }

    if let Some(c) = username
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
    {
        return Err(AppError::Validation(format!(
            "username contains invalid character {:?}",
            c
        )));
    }

    Ok(())
}
