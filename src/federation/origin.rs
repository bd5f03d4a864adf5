//! Serving origin resolution
//!
//! Every URL this server emits is built from an [`Origin`], the
//! `scheme://host` pair the request was addressed to.

use std::fmt;

use crate::config::{OriginSource, ServerConfig};

/// `scheme://authority` of a serving domain
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    value: String,
    scheme_len: usize,
}

impl Origin {
    pub fn new(scheme: &str, authority: &str) -> Self {
        Self {
            value: format!("{}://{}", scheme, authority),
            scheme_len: scheme.len(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn scheme(&self) -> &str {
        &self.value[..self.scheme_len]
    }

    /// Host, with port when one was given
    pub fn authority(&self) -> &str {
        &self.value[self.scheme_len + "://".len()..]
    }

    /// Append an absolute path (`/users/alice`) to the origin.
    pub fn join(&self, path: &str) -> String {
        format!("{}{}", self.value, path)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// What the transport layer saw of an inbound request
#[derive(Debug, Clone)]
pub struct TransportContext {
    /// Protocol scheme ("http" / "https")
    pub scheme: String,
    /// Host header value, port included
    pub host: Option<String>,
}

/// How to turn a [`TransportContext`] into an [`Origin`]
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    pub source: OriginSource,
    /// Configured `protocol://domain`
    pub configured: Origin,
}

impl OriginPolicy {
    pub fn from_server_config(server: &ServerConfig) -> Self {
        Self {
            source: server.origin_source,
            configured: Origin::new(&server.protocol, &server.domain),
        }
    }
}

/// Resolve the serving origin for a request.
///
/// With `OriginSource::Request` the host header is trusted as-is and only
/// concatenated with the scheme. A request without a host falls back to the
/// configured domain.
pub fn resolve_origin(context: &TransportContext, policy: &OriginPolicy) -> Origin {
    match policy.source {
        OriginSource::Config => policy.configured.clone(),
        OriginSource::Request => {
            let host = context
                .host
                .as_deref()
                .filter(|host| !host.is_empty())
                .unwrap_or_else(|| policy.configured.authority());
            Origin::new(&context.scheme, host)
        }
    }
}
