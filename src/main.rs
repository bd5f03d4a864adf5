//! fub binary entry point

use fub::config::{AppConfig, LoggingConfig};
use fub::AppState;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber from `[logging]`; `RUST_LOG` overrides the level.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.default_directive()));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    }
}

/// Application entry point
///
/// # Setup
/// 1. Load configuration from file and environment
/// 2. Initialize tracing from the logging section
/// 3. Initialize metrics
/// 4. Initialize AppState (database, account provisioning)
/// 5. Build Axum router and serve
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Nothing is logged before this point; a bad config is reported by the error return.
    let config = AppConfig::load()?;
    init_tracing(&config.logging);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting fub...");
    tracing::info!(
        domain = %config.server.domain,
        protocol = %config.server.protocol,
        origin_source = ?config.server.origin_source,
        accounts = config.accounts.usernames.len(),
        log_format = %config.logging.format,
        "Configuration loaded"
    );

    fub::metrics::init_metrics();

    let state = AppState::new(config.clone()).await?;
    let app = fub::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(%addr, public_url = %config.server.base_url(), "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
