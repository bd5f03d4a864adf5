//! Account service
//!
//! Provisions local accounts and their signing keys.

use std::sync::Arc;

use crate::data::{ActorIdentity, Database, UserRecord, validate_username};
use crate::error::{AppError, Result};
use crate::federation::generate_key_pair_async;

/// Account service
pub struct AccountService {
    db: Arc<Database>,
    key_bits: usize,
}

impl AccountService {
    /// Create new account service
    pub fn new(db: Arc<Database>, key_bits: usize) -> Self {
        Self { db, key_bits }
    }

    /// Make sure `username` exists and has a keypair.
    ///
    /// A missing user is created with fresh keys. An existing user without a
    /// public key gets one. An existing key is never replaced.
    ///
    /// # Errors
    /// - `Validation` for an invalid username
    /// - `KeyGeneration` / `Encoding` if keygen fails; nothing is written then
    pub async fn provision(&self, username: &str) -> Result<ActorIdentity> {
        validate_username(username)?;

        let existing = self.db.get_user(username).await?;
        if let Some(user) = existing.as_ref().filter(|user| user.has_key()) {
            tracing::debug!(username = %user.username, "Account already provisioned");
            return Ok(ActorIdentity::from(user.clone()));
        }

        let key_pair = generate_key_pair_async(self.key_bits).await?;
        let fingerprint = key_pair.fingerprint().to_string();
        let public_key_pem = key_pair.public_key_pem().to_string();
        let private_key_pem = key_pair.into_private_key_pem();

        if existing.is_some() {
            self.db
                .set_key_pair(username, &public_key_pem, &private_key_pem)
                .await?;
            tracing::info!(username = %username, %fingerprint, "Key pair provisioned for existing account");
        } else {
            let mut user = UserRecord::new(username);
            user.public_key_pem = public_key_pem;
            user.private_key_pem = private_key_pem;

            if self.db.insert_user(&user).await? {
                tracing::info!(username = %username, %fingerprint, "Account created");
            } else {
                // Lost a race with another provisioner; only fill in a missing key.
                self.db
                    .set_key_pair(username, &user.public_key_pem, &user.private_key_pem)
                    .await?;
            }
        }

        self.db
            .get_user(username)
            .await?
            .map(ActorIdentity::from)
            .ok_or(AppError::NotFound)
    }

    /// Provision every configured account, stopping at the first failure.
    pub async fn ensure_configured_accounts(&self, usernames: &[String]) -> Result<()> {
        for username in usernames {
            self.provision(username).await.inspect_err(|error| {
                tracing::error!(username = %username, %error, "Account provisioning failed");
            })?;
        }

        tracing::info!(count = usernames.len(), "Configured accounts provisioned");
        Ok(())
    }
}
