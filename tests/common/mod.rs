//! Common test utilities for E2E tests

pub mod schema_validator;

use std::sync::Arc;

use fub::data::{Database, UserRecord};
use fub::{AppState, config};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Fixed public key for accounts created without key generation
pub const TEST_PUBLIC_KEY_PEM: &str = "-----BEGIN PUBLIC KEY-----\ntest_public_key\n-----END PUBLIC KEY-----\n";

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub db: Arc<Database>,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

/// Configuration used by [`TestServer::new`]
pub fn test_config(db_path: std::path::PathBuf) -> config::AppConfig {
    config::AppConfig {
        server: config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Let OS assign port
            domain: "test.example.com".to_string(),
            protocol: "https".to_string(),
            origin_source: config::OriginSource::Request,
            trust_forwarded_headers: false,
            strict_error_status: false,
        },
        database: config::DatabaseConfig { path: db_path },
        instance: config::InstanceConfig {
            software_name: "fub".to_string(),
            software_version: "0.1.0".to_string(),
            name: Some("Test Instance".to_string()),
            repository: None,
            homepage: None,
        },
        webfinger: config::WebFingerConfig::default(),
        accounts: config::AccountsConfig {
            usernames: Vec::new(),
            key_bits: 2048,
        },
        metrics: config::MetricsConfig { enabled: true },
        logging: config::LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server after adjusting the default test configuration
    pub async fn with_config(configure: impl FnOnce(&mut config::AppConfig)) -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(temp_dir.path().join("test.db"));
        configure(&mut config);

        let db = Arc::new(Database::connect(&config.database.path).await.unwrap());
        let state = AppState::with_directory(config, db.clone());

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = fub::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: addr_str,
            state,
            db,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// `host:port` the server is reachable at, as sent in the Host header
    pub fn authority(&self) -> &str {
        self.addr.trim_start_matches("http://")
    }

    /// Insert an account with a fixed public key
    pub async fn create_test_user(&self, username: &str) -> UserRecord {
        let mut user = UserRecord::new(username);
        user.public_key_pem = TEST_PUBLIC_KEY_PEM.to_string();
        user.private_key_pem = "test_private_key".to_string();
        assert!(self.db.insert_user(&user).await.unwrap());
        user
    }

    /// Insert an account that has not been given keys yet
    pub async fn create_unkeyed_user(&self, username: &str) -> UserRecord {
        let user = UserRecord::new(username);
        assert!(self.db.insert_user(&user).await.unwrap());
        user
    }
}
