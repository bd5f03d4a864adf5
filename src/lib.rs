//! fub - ActivityPub identity and discovery for local accounts
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - Actor documents                                          │
//! │  - WebFinger, NodeInfo, host-meta                           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Federation Core                           │
//! │  - Origin resolution                                        │
//! │  - Document builders                                        │
//! │  - Key material                                             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - UserDirectory trait                                      │
//! │  - SQLite (sqlx), in-memory directory                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers and middleware
//! - `service`: Account provisioning
//! - `federation`: ActivityPub identity documents and discovery
//! - `data`: User directory and database
//! - `config`: Configuration management
//! - `error`: Error types
//! - `metrics`: Prometheus instruments

pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod federation;
pub mod metrics;
pub mod service;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// Cloned for each request; everything inside is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Account lookup for the federation core
    pub directory: Arc<dyn data::UserDirectory>,

    /// How request origins are resolved
    pub origin_policy: federation::OriginPolicy,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to SQLite database
    /// 2. Provision configured accounts
    /// 3. Serve the database as the user directory
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        // 1. Connect to SQLite database
        let db = Arc::new(data::Database::connect(&config.database.path).await?);

        // 2. Provision configured accounts
        service::AccountService::new(db.clone(), config.accounts.key_bits)
            .ensure_configured_accounts(&config.accounts.usernames)
            .await?;

        let usernames = db.list_usernames().await?;
        tracing::info!(
            count = usernames.len(),
            usernames = ?usernames,
            "User directory ready"
        );

        // 3. Serve the database as the user directory
        let state = Self::with_directory(config, db);
        tracing::info!("Application state initialized successfully");
        Ok(state)
    }

    /// State over an existing directory, without touching the database.
    pub fn with_directory(
        config: config::AppConfig,
        directory: Arc<dyn data::UserDirectory>,
    ) -> Self {
        if config.server.origin_source == config::OriginSource::Request {
            tracing::warn!(
                domain = %config.server.domain,
                "Serving origin follows the Host header; set server.origin_source = \"config\" \
                 unless a trusted proxy sets it"
            );
        }

        let origin_policy = federation::OriginPolicy::from_server_config(&config.server);

        Self {
            config: Arc::new(config),
            directory,
            origin_policy,
        }
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::{Router, middleware, routing::get};
    use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

    let metrics_enabled = state.config.metrics.enabled;

    let router = Router::new()
        .route("/health", get(health_check))
        .merge(api::wellknown_router())
        .merge(api::activitypub_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::error_status,
        ))
        .layer(middleware::from_fn(api::track_metrics))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        // Discovery documents are public
        .layer(CorsLayer::permissive())
        .with_state(state);

    if metrics_enabled {
        router.merge(api::metrics_router())
    } else {
        router
    }
}

async fn health_check() -> &'static str {
    "OK"
}
