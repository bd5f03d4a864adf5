//! NodeInfo discovery
//!
//! Two-stage: `/.well-known/nodeinfo` links to the versioned 2.1 document.

use serde::{Deserialize, Serialize};

use super::origin::Origin;
use crate::config::InstanceConfig;
use crate::data::UserDirectory;
use crate::metrics::USERS_TOTAL;

pub const NODEINFO_2_1_REL: &str = "http://nodeinfo.diaspora.software/ns/schema/2.1";
pub const NODEINFO_2_1_PATH: &str = "/nodeinfo/2.1";
pub const NODEINFO_2_1_CONTENT_TYPE: &str =
    "application/json; profile=\"http://nodeinfo.diaspora.software/ns/schema/2.1#\"";

/// `/.well-known/nodeinfo` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfoIndex {
    pub links: Vec<NodeInfoLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfoLink {
    pub rel: String,
    pub href: String,
}

/// NodeInfo 2.1 document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfoDocument {
    pub version: String,
    pub software: Software,
    pub protocols: Vec<String>,
    pub services: Services,
    pub open_registrations: bool,
    pub usage: Usage,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Software {
    /// `[a-z0-9-]` only
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Services {
    pub inbound: Vec<String>,
    pub outbound: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub users: UsersUsage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersUsage {
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
}

/// Index linking to the 2.1 document under the same origin.
pub fn nodeinfo_index(origin: &Origin) -> NodeInfoIndex {
    NodeInfoIndex {
        links: vec![NodeInfoLink {
            rel: NODEINFO_2_1_REL.to_string(),
            href: origin.join(NODEINFO_2_1_PATH),
        }],
    }
}

/// NodeInfo 2.1 document for this instance.
pub fn nodeinfo_document(instance: &InstanceConfig, user_count: u64) -> NodeInfoDocument {
    NodeInfoDocument {
        version: "2.1".to_string(),
        software: Software {
            name: instance.software_name.clone(),
            version: instance.software_version.clone(),
            repository: instance.repository.clone(),
            homepage: instance.homepage.clone(),
        },
        protocols: vec!["activitypub".to_string()],
        services: Services::default(),
        open_registrations: false,
        usage: Usage {
            users: UsersUsage { total: user_count },
        },
        metadata: Metadata {
            node_name: instance.name.clone(),
        },
    }
}

/// Advisory user count; a failing directory reports 0.
pub async fn user_count(directory: &dyn UserDirectory) -> u64 {
    match directory.count().await {
        Ok(count) => {
            USERS_TOTAL.set(i64::try_from(count).unwrap_or(i64::MAX));
            count
        }
        Err(error) => {
            tracing::warn!(%error, "User count unavailable; reporting 0");
            0
        }
    }
}
