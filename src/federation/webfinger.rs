//! WebFinger protocol implementation
//!
//! Resolves `acct:user@domain` queries for local accounts to a JRD
//! (RFC 7033) pointing at the ActivityPub actor.

use serde::{Deserialize, Serialize};

use super::actor::{actor_url, profile_url};
use super::origin::Origin;
use crate::config::{DomainMatch, WebFingerConfig};
use crate::data::UserDirectory;
use crate::error::AppError;
use crate::metrics::WEBFINGER_DOMAIN_MISMATCH_TOTAL;

pub const REL_PROFILE_PAGE: &str = "http://webfinger.net/rel/profile-page";
pub const REL_SELF: &str = "self";
pub const REL_SUBSCRIBE: &str = "http://ostatus.org/schema/1.0/subscribe";

/// WebFinger JRD response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WebFingerResponse {
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aliases: Option<Vec<String>>,
    pub links: Vec<WebFingerLink>,
}

/// WebFinger link
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WebFingerLink {
    pub rel: String,
    #[serde(rename = "type")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl WebFingerResponse {
    /// Find the first link with the given relation
    pub fn find_link(&self, rel: &str) -> Option<&WebFingerLink> {
        self.links.iter().find(|link| link.rel == rel)
    }
}

/// Parsed `resource` query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceQuery<'a> {
    Account { local: &'a str, domain: &'a str },
    Malformed,
}

/// Parse `[acct:]local@domain`.
///
/// The split happens at the first `@`. Both sides must be non-empty and the
/// domain must not span lines.
pub fn parse_resource(resource: &str) -> ResourceQuery<'_> {
    let acct = resource.strip_prefix("acct:").unwrap_or(resource);

    match acct.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && !domain.is_empty() && !domain.contains(['\n', '\r']) =>
        {
            ResourceQuery::Account { local, domain }
        }
        _ => ResourceQuery::Malformed,
    }
}

/// Check that a queried domain is the one this request is served under.
///
/// A server must never vouch for an account on a domain it does not serve.
pub fn check_domain(
    domain: &str,
    request_scheme: &str,
    origin: &Origin,
    mode: DomainMatch,
) -> Result<(), AppError> {
    let claimed = format!("{}://{}", request_scheme, domain);

    let matches = match mode {
        DomainMatch::Origin => claimed == origin.as_str(),
        DomainMatch::Host => domain.eq_ignore_ascii_case(origin.authority()),
    };

    if matches {
        return Ok(());
    }

    WEBFINGER_DOMAIN_MISMATCH_TOTAL.inc();
    tracing::warn!(
        claimed = %claimed,
        serving = %origin,
        mode = ?mode,
        "WebFinger query for a domain this server does not serve"
    );

    Err(AppError::DomainMismatch {
        claimed,
        serving: origin.to_string(),
    })
}

/// Build the JRD for a local account.
///
/// `subject` is `acct:` followed by the resource exactly as queried.
pub fn build_jrd(resource: &str, local: &str, origin: &Origin) -> WebFingerResponse {
    let actor = actor_url(origin, local);
    let profile = profile_url(origin, local);

    WebFingerResponse {
        subject: format!("acct:{}", resource),
        aliases: Some(vec![actor.clone(), profile.clone()]),
        links: vec![
            WebFingerLink {
                rel: REL_PROFILE_PAGE.to_string(),
                link_type: Some("text/html".to_string()),
                href: Some(profile),
                template: None,
            },
            WebFingerLink {
                rel: REL_SELF.to_string(),
                link_type: Some("application/activity+json".to_string()),
                href: Some(actor),
                template: None,
            },
            // Remote follow is not supported yet; the relation is advertised without a template.
            WebFingerLink {
                rel: REL_SUBSCRIBE.to_string(),
                link_type: None,
                href: None,
                template: None,
            },
        ],
    }
}

/// Resolve a WebFinger query against the local directory.
///
/// # Errors
/// - `MissingParameter` for an empty resource
/// - `MalformedResource` if it is not `[acct:]local@domain`
/// - `DomainMismatch` if the domain is not the serving origin
/// - `NotFound` if the local part is not a known account
pub async fn resolve_webfinger(
    resource: &str,
    request_scheme: &str,
    origin: &Origin,
    config: &WebFingerConfig,
    directory: &dyn UserDirectory,
) -> Result<WebFingerResponse, AppError> {
    if resource.is_empty() {
        return Err(AppError::MissingParameter("resource"));
    }

    let ResourceQuery::Account { local, domain } = parse_resource(resource) else {
        tracing::debug!(resource = %resource, "Malformed WebFinger resource");
        return Err(AppError::MalformedResource);
    };

    check_domain(domain, request_scheme, origin, config.domain_match)?;

    let identity = directory
        .find_by_username(local)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(build_jrd(resource, &identity.username, origin))
}

/// host-meta XRD pointing clients at the WebFinger endpoint
pub fn host_meta(origin: &Origin) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<XRD xmlns="http://docs.oasis-open.org/ns/xri/xrd-1.0">
  <Link rel="lrdd" type="application/jrd+json" template="{}/.well-known/webfinger?resource={{uri}}"/>
</XRD>"#,
        origin
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ActorIdentity, MemoryDirectory, MockUserDirectory};

    fn directory() -> MemoryDirectory {
        [ActorIdentity::new("alice", "pem")].into_iter().collect()
    }

    fn origin() -> Origin {
        Origin::new("https", "example.com")
    }

    async fn resolve(resource: &str) -> Result<WebFingerResponse, AppError> {
        resolve_webfinger(
            resource,
            "https",
            &origin(),
            &WebFingerConfig::default(),
            &directory(),
        )
        .await
    }

    #[test]
    fn parse_resource_forms() {
        assert_eq!(
            parse_resource("acct:alice@example.com"),
            ResourceQuery::Account {
                local: "alice",
                domain: "example.com"
            }
        );
        assert_eq!(
            parse_resource("alice@example.com:3000"),
            ResourceQuery::Account {
                local: "alice",
                domain: "example.com:3000"
            }
        );
        assert_eq!(
            parse_resource("a@b@c"),
            ResourceQuery::Account {
                local: "a",
                domain: "b@c"
            }
        );
        assert_eq!(parse_resource("not-a-valid-resource"), ResourceQuery::Malformed);
        assert_eq!(parse_resource("acct:alice"), ResourceQuery::Malformed);
        assert_eq!(parse_resource("@example.com"), ResourceQuery::Malformed);
        assert_eq!(parse_resource("alice@"), ResourceQuery::Malformed);
        assert_eq!(parse_resource("acct:@example.com"), ResourceQuery::Malformed);
        assert_eq!(parse_resource("alice@exa\nmple.com"), ResourceQuery::Malformed);
    }

    #[tokio::test]
    async fn prefixed_resource_keeps_subject_verbatim() {
        let jrd = resolve("acct:alice@example.com").await.unwrap();
        assert_eq!(jrd.subject, "acct:acct:alice@example.com");
    }

    #[tokio::test]
    async fn bare_resource_gets_acct_subject() {
        let jrd = resolve("alice@example.com").await.unwrap();
        assert_eq!(jrd.subject, "acct:alice@example.com");
    }

    #[tokio::test]
    async fn jrd_links_point_at_actor_and_profile() {
        let jrd = resolve("alice@example.com").await.unwrap();

        assert_eq!(
            jrd.aliases,
            Some(vec![
                "https://example.com/users/alice".to_string(),
                "https://example.com/@alice".to_string(),
            ])
        );
        assert_eq!(jrd.links.len(), 3);

        let profile = jrd.find_link(REL_PROFILE_PAGE).unwrap();
        assert_eq!(profile.link_type.as_deref(), Some("text/html"));
        assert_eq!(profile.href.as_deref(), Some("https://example.com/@alice"));

        let actor = jrd.find_link(REL_SELF).unwrap();
        assert_eq!(actor.link_type.as_deref(), Some("application/activity+json"));
        assert_eq!(actor.href.as_deref(), Some("https://example.com/users/alice"));

        let subscribe = jrd.find_link(REL_SUBSCRIBE).unwrap();
        assert!(subscribe.template.is_none());
        assert!(subscribe.href.is_none());
    }

    #[tokio::test]
    async fn subscribe_link_serializes_without_template() {
        let jrd = resolve("alice@example.com").await.unwrap();
        let json = serde_json::to_value(&jrd).unwrap();
        assert_eq!(json["links"][2], serde_json::json!({ "rel": REL_SUBSCRIBE }));
    }

    #[tokio::test]
    async fn empty_resource_is_missing_parameter() {
        assert!(matches!(
            resolve("").await,
            Err(AppError::MissingParameter("resource"))
        ));
    }

    #[tokio::test]
    async fn resource_without_at_is_malformed() {
        assert!(matches!(
            resolve("not-a-valid-resource").await,
            Err(AppError::MalformedResource)
        ));
    }

    #[tokio::test]
    async fn foreign_domain_is_rejected() {
        match resolve("acct:alice@evil.example").await {
            Err(AppError::DomainMismatch { claimed, serving }) => {
                assert_eq!(claimed, "https://evil.example");
                assert_eq!(serving, "https://example.com");
            }
            other => panic!("expected DomainMismatch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn domain_check_runs_before_directory_lookup() {
        let mut directory = MockUserDirectory::new();
        directory.expect_find_by_username().never();

        let result = resolve_webfinger(
            "alice@evil.example",
            "https",
            &origin(),
            &WebFingerConfig::default(),
            &directory,
        )
        .await;
        assert!(matches!(result, Err(AppError::DomainMismatch { .. })));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        assert!(matches!(
            resolve("bob@example.com").await,
            Err(AppError::NotFound)
        ));
    }

    #[test]
    fn origin_mode_compares_request_scheme() {
        let origin = origin();
        assert!(check_domain("example.com", "https", &origin, DomainMatch::Origin).is_ok());
        assert!(check_domain("example.com", "http", &origin, DomainMatch::Origin).is_err());
        assert!(check_domain("EXAMPLE.com", "https", &origin, DomainMatch::Origin).is_err());
        assert!(check_domain("example.com:443", "https", &origin, DomainMatch::Origin).is_err());
    }

    #[test]
    fn host_mode_ignores_scheme_and_case() {
        let origin = origin();
        assert!(check_domain("example.com", "http", &origin, DomainMatch::Host).is_ok());
        assert!(check_domain("EXAMPLE.com", "https", &origin, DomainMatch::Host).is_ok());
        assert!(check_domain("evil.example", "https", &origin, DomainMatch::Host).is_err());
    }

    #[test]
    fn host_meta_points_at_webfinger() {
        let xml = host_meta(&origin());
        assert!(xml.contains(
            r#"template="https://example.com/.well-known/webfinger?resource={uri}""#
        ));
    }
}
