//! ActivityPub identity and discovery
//!
//! Handles:
//! - RSA key material for actors
//! - Origin resolution
//! - Actor documents
//! - WebFinger
//! - NodeInfo

mod actor;
mod keys;
mod nodeinfo;
mod origin;
mod webfinger;

pub use actor::{
    ACTIVITY_STREAMS_CONTEXT, ActorDocument, PublicKey, SECURITY_CONTEXT, actor_url, build_actor,
    local_part, main_key_id, profile_url,
};
pub use keys::{
    KeyPair, MIN_KEY_BITS, generate_key_pair, generate_key_pair_async, parse_public_key_pem,
};
pub use nodeinfo::{
    NODEINFO_2_1_CONTENT_TYPE, NODEINFO_2_1_PATH, NODEINFO_2_1_REL, NodeInfoDocument,
    NodeInfoIndex, NodeInfoLink, nodeinfo_document, nodeinfo_index, user_count,
};
pub use origin::{Origin, OriginPolicy, TransportContext, resolve_origin};
pub use webfinger::{
    REL_PROFILE_PAGE, REL_SELF, REL_SUBSCRIBE, ResourceQuery, WebFingerLink, WebFingerResponse,
    build_jrd, check_domain, host_meta, parse_resource, resolve_webfinger,
};
