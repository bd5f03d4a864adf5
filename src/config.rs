//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/default.toml, config/local.toml)
//! 3. Environment variables (override, `FUB__SECTION__KEY`)

use serde::Deserialize;
use std::path::PathBuf;

use crate::federation::MIN_KEY_BITS;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub instance: InstanceConfig,
    #[serde(default)]
    pub webfinger: WebFingerConfig,
    pub accounts: AccountsConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
    /// Canonical public domain, with port if non-default (e.g., "social.example.com")
    pub domain: String,
    /// Protocol ("http" or "https")
    pub protocol: String,
    /// Where the serving origin comes from
    #[serde(default)]
    pub origin_source: OriginSource,
    /// Honor X-Forwarded-Proto / X-Forwarded-Host from a reverse proxy
    #[serde(default)]
    pub trust_forwarded_headers: bool,
    /// Return 4xx statuses for logical errors instead of 200 + error body
    #[serde(default)]
    pub strict_error_status: bool,
}

impl ServerConfig {
    /// Get the base URL for the instance
    ///
    /// # Returns
    /// Full URL like "https://social.example.com"
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }
}

/// Origin source selector
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OriginSource {
    /// `scheme://host` as seen on the inbound request
    #[default]
    Request,
    /// Always the configured `protocol://domain`
    Config,
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Instance metadata advertised through NodeInfo
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceConfig {
    /// Software name, `[a-z0-9-]` only
    pub software_name: String,
    pub software_version: String,
    /// Human readable node name (NodeInfo metadata.nodeName)
    pub name: Option<String>,
    pub repository: Option<String>,
    pub homepage: Option<String>,
}

/// WebFinger configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WebFingerConfig {
    /// How the resource domain is compared against the serving origin
    #[serde(default)]
    pub domain_match: DomainMatch,
}

/// WebFinger domain comparison mode
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DomainMatch {
    /// `request_scheme://domain` must equal the serving origin
    #[default]
    Origin,
    /// `domain` must equal the serving origin's authority, scheme ignored
    Host,
}

/// Local accounts provisioned at startup
#[derive(Debug, Clone, Deserialize)]
pub struct AccountsConfig {
    /// Usernames to create if missing
    #[serde(default)]
    pub usernames: Vec<String>,
    /// RSA modulus size for generated keys (minimum 2048)
    pub key_bits: usize,
}

/// Metrics configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Expose GET /metrics
    pub enabled: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl LoggingConfig {
    /// Filter used when `RUST_LOG` is unset
    pub fn default_directive(&self) -> String {
        format!("fub={},tower_http=debug", self.level.to_ascii_lowercase())
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (FUB__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.domain", "localhost:3000")?
            .set_default("server.protocol", "http")?
            .set_default("server.origin_source", "request")?
            .set_default("server.trust_forwarded_headers", false)?
            .set_default("server.strict_error_status", false)?
            .set_default("database.path", "data/fub.db")?
            .set_default("instance.software_name", "fub")?
            .set_default("instance.software_version", env!("CARGO_PKG_VERSION"))?
            .set_default("webfinger.domain_match", "origin")?
            .set_default("accounts.key_bits", MIN_KEY_BITS as i64)?
            .set_default("metrics.enabled", true)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (FUB__*)
            .add_source(
                Environment::with_prefix("FUB")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("accounts.usernames")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub(crate) fn validate(&self) -> Result<(), crate::error::AppError> {
        use crate::error::AppError;

        if !matches!(self.server.protocol.as_str(), "http" | "https") {
            return Err(AppError::Config(
                "server.protocol must be \"http\" or \"https\"".to_string(),
            ));
        }

        validate_domain(&self.server.protocol, &self.server.domain)?;

        if self.accounts.key_bits < MIN_KEY_BITS {
            return Err(AppError::Config(format!(
                "accounts.key_bits must be at least {}",
                MIN_KEY_BITS
            )));
        }

        if !is_valid_software_name(&self.instance.software_name) {
            return Err(AppError::Config(
                "instance.software_name may only contain [a-z0-9-]".to_string(),
            ));
        }

        if self.instance.software_version.trim().is_empty() {
            return Err(AppError::Config(
                "instance.software_version must not be empty".to_string(),
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(AppError::Config(format!(
                "logging.level must be one of {}, got {:?}",
                LOG_LEVELS.join(", "),
                self.logging.level
            )));
        }

        if !matches!(self.logging.format.to_ascii_lowercase().as_str(), "pretty" | "json") {
            return Err(AppError::Config(
                "logging.format must be \"pretty\" or \"json\"".to_string(),
            ));
        }

        for username in &self.accounts.usernames {
            crate::data::validate_username(username).map_err(|e| {
                AppError::Config(format!("accounts.usernames: {}", e))
            })?;
        }

        Ok(())
    }
}

/// NodeInfo software names are restricted to lowercase alphanumerics and hyphens.
pub fn is_valid_software_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn validate_domain(protocol: &str, domain: &str) -> Result<(), crate::error::AppError> {
    let invalid = || {
        crate::error::AppError::Config(format!(
            "server.domain must be a bare host[:port], got {:?}",
            domain
        ))
    };

    if domain.is_empty() || domain.contains('/') || domain.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let parsed = url::Url::parse(&format!("{protocol}://{domain}")).map_err(|_| invalid())?;
    if parsed.host_str().is_none() || !parsed.username().is_empty() {
        return Err(invalid());
    }

    Ok(())
}

#[cfg(test)]
/// Valid configuration for unit tests
pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            domain: "example.com".to_string(),
            protocol: "https".to_string(),
            origin_source: OriginSource::Request,
            trust_forwarded_headers: false,
            strict_error_status: false,
        },
        database: DatabaseConfig {
            path: PathBuf::from("/tmp/fub-test.db"),
        },
        instance: InstanceConfig {
            software_name: "fub".to_string(),
            software_version: "0.0.1".to_string(),
            name: None,
            repository: None,
            homepage: None,
        },
        webfinger: WebFingerConfig::default(),
        accounts: AccountsConfig {
            usernames: vec!["alice".to_string()],
            key_bits: 2048,
        },
        metrics: MetricsConfig { enabled: true },
        logging: LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}
