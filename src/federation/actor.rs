//! ActivityPub actor documents
//!
//! Builds the `Person` object served at `/users/{username}`. Every URL in the
//! document hangs off the actor id, so they all share one origin.

use serde::{Deserialize, Serialize};

use super::origin::Origin;
use crate::data::{ActorIdentity, UserDirectory};
use crate::error::AppError;

pub const ACTIVITY_STREAMS_CONTEXT: &str = "https://www.w3.org/ns/activitystreams";
pub const SECURITY_CONTEXT: &str = "https://w3id.org/security/v1";

/// ActivityPub actor document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorDocument {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub preferred_username: String,
    /// Always true. Some implementations (Misskey) ignore actors without it.
    pub discoverable: bool,
    pub inbox: String,
    pub outbox: String,
    pub followers: String,
    pub following: String,
    /// Profile page
    pub url: String,
    pub public_key: PublicKey,
}

/// Actor public key, federated for HTTP signature verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKey {
    pub id: String,
    pub owner: String,
    pub public_key_pem: String,
}

impl PublicKey {
    pub fn new(owner: &str, public_key_pem: &str) -> Self {
        Self {
            id: main_key_id(owner),
            owner: owner.to_string(),
            public_key_pem: public_key_pem.to_string(),
        }
    }
}

pub fn main_key_id(owner: &str) -> String {
    format!("{}#main-key", owner)
}

/// `{origin}/users/{username}`
pub fn actor_url(origin: &Origin, username: &str) -> String {
    origin.join(&format!("/users/{}", username))
}

/// `{origin}/@{username}`
pub fn profile_url(origin: &Origin, username: &str) -> String {
    origin.join(&format!("/@{}", username))
}

/// Local part of a username path segment.
///
/// Accepts `alice`, `@alice`, `alice@example.com` and `@alice@example.com`;
/// everything from the first `@` after the optional leading one is dropped.
pub fn local_part(segment: &str) -> &str {
    let handle = segment.strip_prefix('@').unwrap_or(segment);
    match handle.split_once('@') {
        Some((local, _domain)) => local,
        None => handle,
    }
}

impl ActorDocument {
    /// Build the document for an identity served under `origin`.
    pub fn new(identity: &ActorIdentity, origin: &Origin) -> Self {
        let id = actor_url(origin, &identity.username);

        Self {
            context: vec![
                ACTIVITY_STREAMS_CONTEXT.to_string(),
                SECURITY_CONTEXT.to_string(),
            ],
            kind: "Person".to_string(),
            preferred_username: identity.username.clone(),
            discoverable: true,
            inbox: format!("{}/inbox", id),
            outbox: format!("{}/outbox", id),
            followers: format!("{}/followers", id),
            following: format!("{}/following", id),
            url: profile_url(origin, &identity.username),
            public_key: PublicKey::new(&id, &identity.public_key_pem),
            id,
        }
    }
}

/// Look up `username` and build its actor document.
///
/// # Errors
/// `NotFound` if the local part is not in the directory.
pub async fn build_actor(
    username: &str,
    origin: &Origin,
    directory: &dyn UserDirectory,
) -> Result<ActorDocument, AppError> {
    let local = local_part(username);
    if local.is_empty() {
        return Err(AppError::NotFound);
    }

    let identity = directory
        .find_by_username(local)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ActorDocument::new(&identity, origin))
}
