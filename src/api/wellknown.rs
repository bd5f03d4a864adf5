//! Well-known endpoints
//!
//! - /.well-known/webfinger
//! - /.well-known/nodeinfo
//! - /.well-known/host-meta
//! - /nodeinfo/2.1

use axum::{
    Router,
    extract::{RawQuery, State},
    http::header,
    response::{IntoResponse, Json, Response},
    routing::get,
};

use super::middleware::RequestOrigin;
use crate::AppState;
use crate::error::AppError;
use crate::federation::{
    NODEINFO_2_1_CONTENT_TYPE, NODEINFO_2_1_PATH, nodeinfo_document, nodeinfo_index,
    resolve_webfinger, user_count,
};
use crate::metrics::WEBFINGER_LOOKUPS_TOTAL;

pub const JRD_JSON: &str = "application/jrd+json";
const XRD_XML: &str = "application/xrd+xml";

/// Create well-known router
///
/// Routes:
/// - GET /.well-known/webfinger
/// - GET /.well-known/nodeinfo
/// - GET /.well-known/host-meta
/// - GET /nodeinfo/2.1
/// - GET /.well-known/nodeinfo/2.1
pub fn wellknown_router() -> Router<AppState> {
    Router::new()
        .route("/.well-known/webfinger", get(webfinger))
        .route("/.well-known/nodeinfo", get(nodeinfo_links))
        .route("/.well-known/host-meta", get(host_meta))
        .route(NODEINFO_2_1_PATH, get(nodeinfo))
        .route("/.well-known/nodeinfo/2.1", get(nodeinfo))
}

/// First `resource` value of a raw query string, empty when absent.
///
/// Repeated parameters are tolerated and invalid UTF-8 is decoded lossily, so
/// a bad query always reaches the resolver and fails as a JSON error.
fn resource_param(query: Option<&str>) -> String {
    query
        .and_then(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == "resource")
                .map(|(_, value)| value.into_owned())
        })
        .unwrap_or_default()
}

/// GET /.well-known/webfinger
///
/// Responds to WebFinger queries for local accounts.
///
/// Query: ?resource=acct:user@domain
async fn webfinger(
    State(state): State<AppState>,
    RequestOrigin { origin, scheme }: RequestOrigin,
    RawQuery(query): RawQuery,
) -> Result<Response, AppError> {
    let resource = resource_param(query.as_deref());

    let result = resolve_webfinger(
        &resource,
        &scheme,
        &origin,
        &state.config.webfinger,
        state.directory.as_ref(),
    )
    .await;

    let outcome = match &result {
        Ok(_) => "found",
        Err(error) => error.kind(),
    };
    WEBFINGER_LOOKUPS_TOTAL.with_label_values(&[outcome]).inc();

    let jrd = result?;
    tracing::debug!(subject = %jrd.subject, "WebFinger resolved");

    Ok(([(header::CONTENT_TYPE, JRD_JSON)], Json(jrd)).into_response())
}

/// GET /.well-known/nodeinfo
///
/// Returns links to nodeinfo documents.
async fn nodeinfo_links(RequestOrigin { origin, .. }: RequestOrigin) -> Response {
    Json(nodeinfo_index(&origin)).into_response()
}

/// GET /nodeinfo/2.1
///
/// Returns NodeInfo 2.1 document.
async fn nodeinfo(State(state): State<AppState>) -> Response {
    let users = user_count(state.directory.as_ref()).await;
    let document = nodeinfo_document(&state.config.instance, users);

    (
        [(header::CONTENT_TYPE, NODEINFO_2_1_CONTENT_TYPE)],
        Json(document),
    )
        .into_response()
}

/// GET /.well-known/host-meta
///
/// Returns host-meta XML for WebFinger discovery.
async fn host_meta(RequestOrigin { origin, .. }: RequestOrigin) -> Response {
    (
        [(header::CONTENT_TYPE, XRD_XML)],
        crate::federation::host_meta(&origin),
    )
        .into_response()
}
