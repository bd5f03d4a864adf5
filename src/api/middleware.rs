//! Request middleware and extractors
//!
//! - Serving origin of a request
//! - Error status promotion
//! - Request metrics

use axum::{
    async_trait,
    body::Body,
    extract::{FromRef, FromRequestParts, MatchedPath, State},
    http::{HeaderMap, Request, header, request::Parts},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;

use crate::AppState;
use crate::config::ServerConfig;
use crate::error::LogicalStatus;
use crate::federation::{Origin, TransportContext, resolve_origin};
use crate::metrics::{HTTP_REQUEST_DURATION_SECONDS, observe_request};

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";
const X_FORWARDED_HOST: &str = "x-forwarded-host";

/// Serving origin of the current request
///
/// # Usage
/// ```ignore
/// async fn handler(RequestOrigin { origin, .. }: RequestOrigin) -> String {
///     origin.join("/users/alice")
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequestOrigin {
    pub origin: Origin,
    /// Scheme the request arrived with, which may differ from `origin`'s
    /// when the origin is pinned by configuration.
    pub scheme: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestOrigin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let context = transport_context(parts, &state.config.server);
        let origin = resolve_origin(&context, &state.origin_policy);

        Ok(RequestOrigin {
            origin,
            scheme: context.scheme,
        })
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// First entry of a possibly comma-separated forwarded header
fn first_forwarded(value: &str) -> &str {
    value.split(',').next().unwrap_or(value).trim()
}

/// Read scheme and host as the transport saw them.
///
/// `X-Forwarded-*` headers are only honored behind a trusted proxy.
fn transport_context(parts: &Parts, server: &ServerConfig) -> TransportContext {
    let forwarded = |name: &str| {
        server
            .trust_forwarded_headers
            .then(|| header_value(&parts.headers, name).map(first_forwarded))
            .flatten()
    };

    let scheme = forwarded(X_FORWARDED_PROTO)
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| server.protocol.clone());

    let host = forwarded(X_FORWARDED_HOST)
        .or_else(|| header_value(&parts.headers, header::HOST.as_str()))
        .map(ToOwned::to_owned)
        .or_else(|| parts.uri.authority().map(|authority| authority.to_string()));

    TransportContext { scheme, host }
}

/// Promote logical error statuses when `server.strict_error_status` is set.
///
/// Error bodies are unchanged; only the status line moves from 200 to the
/// error's natural 4xx.
pub async fn error_status(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    if state.config.server.strict_error_status {
        if let Some(LogicalStatus(status)) = response.extensions().get::<LogicalStatus>().copied() {
            *response.status_mut() = status;
        }
    }

    response
}

/// Record request count and latency per matched route.
pub async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let method = request.method().to_string();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_string());

    let timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[&method, &endpoint])
        .start_timer();
    let response = next.run(request).await;
    timer.observe_duration();

    observe_request(&method, &endpoint, response.status().as_u16());
    response
}
