//! ActivityPub endpoints
//!
//! - Actor document
//! - Profile handle lookup

use axum::{
    Router,
    extract::{Path, State, rejection::PathRejection},
    response::{IntoResponse, Json, Response},
    routing::get,
};
use http::{HeaderMap, header};

use super::middleware::RequestOrigin;
use crate::AppState;
use crate::error::AppError;
use crate::federation::{ActorDocument, build_actor, local_part};

pub const ACTIVITY_JSON: &str = "application/activity+json";
const LD_JSON: &str = "application/ld+json";

/// Create ActivityPub router
///
/// Routes:
/// - GET /users/:username - Actor document
/// - GET /:handle - Profile lookup (`/@alice`, `/alice`, `/alice@domain`)
pub fn activitypub_router() -> Router<AppState> {
    Router::new()
        .route("/users/:username", get(actor))
        .route("/:handle", get(profile))
}

fn activity_json(document: ActorDocument) -> Response {
    ([(header::CONTENT_TYPE, ACTIVITY_JSON)], Json(document)).into_response()
}

/// Username path segment; one that does not decode names no local user.
fn path_segment(path: Result<Path<String>, PathRejection>) -> Result<String, AppError> {
    path.map(|Path(segment)| segment).map_err(|rejection| {
        tracing::debug!(%rejection, "Undecodable username segment");
        AppError::NotFound
    })
}

fn wants_activity_json(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|accept| accept.contains(ACTIVITY_JSON) || accept.contains(LD_JSON))
}

/// GET /users/:username
///
/// Returns the ActivityPub actor document.
///
/// Content-Type: application/activity+json
async fn actor(
    State(state): State<AppState>,
    RequestOrigin { origin, .. }: RequestOrigin,
    username: Result<Path<String>, PathRejection>,
) -> Result<Response, AppError> {
    let username = path_segment(username)?;
    let document = build_actor(&username, &origin, state.directory.as_ref()).await?;
    Ok(activity_json(document))
}

/// GET /:handle
///
/// Profile lookup by `@handle`, bare username or `user@domain`.
/// ActivityPub clients asking for `application/activity+json` get the actor
/// document instead.
async fn profile(
    State(state): State<AppState>,
    RequestOrigin { origin, .. }: RequestOrigin,
    handle: Result<Path<String>, PathRejection>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let handle = path_segment(handle)?;
    let document = build_actor(&handle, &origin, state.directory.as_ref()).await?;

    if wants_activity_json(&headers) {
        return Ok(activity_json(document));
    }

    tracing::debug!(handle = %handle, local = %local_part(&handle), "Profile lookup");
    Ok(Json(serde_json::json!({ "username": document.preferred_username })).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accept(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, value.parse().unwrap());
        headers
    }

    #[test]
    fn activity_json_negotiation() {
        assert!(wants_activity_json(&accept("application/activity+json")));
        assert!(wants_activity_json(&accept(
            "application/ld+json; profile=\"https://www.w3.org/ns/activitystreams\""
        )));
        assert!(wants_activity_json(&accept(
            "text/html, application/activity+json;q=0.9"
        )));
        assert!(!wants_activity_json(&accept("text/html")));
        assert!(!wants_activity_json(&HeaderMap::new()));
    }
}
