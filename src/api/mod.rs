//! API layer
//!
//! HTTP handlers for:
//! - ActivityPub (actor documents)
//! - Discovery (WebFinger, NodeInfo, host-meta)
//! - Metrics (Prometheus)

mod activitypub;
pub mod metrics;
mod middleware;
mod wellknown;

pub use activitypub::{ACTIVITY_JSON, activitypub_router};
pub use metrics::metrics_router;
pub use middleware::{RequestOrigin, error_status, track_metrics};
pub use wellknown::{JRD_JSON, wellknown_router};
