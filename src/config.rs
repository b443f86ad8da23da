//! # Configuration
//!
//! Layered service configuration: built-in defaults, an optional config
//! file, then `SETTLEMENT_`-prefixed environment variables.
//!
//! Nested keys use a double underscore in the environment, for example
//! `SETTLEMENT_DATABASE__URL` or `SETTLEMENT_ENGINE__COMMIT_MAX_ATTEMPTS`.

use crate::application::services::{EngineSettings, RetryPolicy};
use crate::telemetry::LogFormat;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "SETTLEMENT";

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Storage settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Settlement engine settings.
    pub engine: EngineConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address.
    pub bind_address: SocketAddr,
    /// Allowed CORS origins; empty allows any.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
            cors_origins: Vec::new(),
        }
    }
}

/// Where ledgers are stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local ledgers.
    #[default]
    Memory,
    /// PostgreSQL.
    Postgres,
}

/// Storage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Storage backend.
    pub backend: StorageBackend,
    /// Connection URL, required for PostgreSQL.
    pub url: Option<String>,
    /// Pool size.
    pub max_connections: u32,
    /// Create tables at start-up.
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            url: None,
            max_connections: 10,
            run_migrations: true,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            level: "info".to_string(),
        }
    }
}

/// Settlement engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Attempts per forward commit step.
    pub commit_max_attempts: u32,
    /// First backoff of a forward step, in milliseconds.
    pub commit_base_delay_ms: u64,
    /// Backoff ceiling of a forward step, in milliseconds.
    pub commit_max_delay_ms: u64,
    /// How long a request waits for its commit, in milliseconds.
    pub commit_deadline_ms: u64,
    /// Attempts per rollback step.
    pub rollback_max_attempts: u32,
    /// First backoff of a rollback step, in milliseconds.
    pub rollback_base_delay_ms: u64,
    /// Age after which a pending settlement is considered abandoned.
    pub recovery_grace_secs: u64,
    /// Interval between recovery sweeps; 0 disables the sweeper.
    pub recovery_interval_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            commit_max_attempts: 3,
            commit_base_delay_ms: 50,
            commit_max_delay_ms: 1_000,
            commit_deadline_ms: 30_000,
            rollback_max_attempts: 5,
            rollback_base_delay_ms: 100,
            recovery_grace_secs: 300,
            recovery_interval_secs: 60,
        }
    }
}

impl EngineConfig {
    /// Converts to engine settings.
    #[must_use]
    pub fn settings(&self) -> EngineSettings {
        let max_delay = Duration::from_millis(self.commit_max_delay_ms);
        EngineSettings {
            commit_retry: RetryPolicy::new(
                self.commit_max_attempts,
                Duration::from_millis(self.commit_base_delay_ms),
                max_delay,
            ),
            rollback_retry: RetryPolicy::new(
                self.rollback_max_attempts,
                Duration::from_millis(self.rollback_base_delay_ms),
                max_delay,
            ),
            commit_deadline: Duration::from_millis(self.commit_deadline_ms),
        }
    }

    /// Returns the recovery grace period.
    #[must_use]
    pub fn recovery_grace(&self) -> Duration {
        Duration::from_secs(self.recovery_grace_secs)
    }

    /// Returns the sweep interval, or `None` if sweeping is disabled.
    #[must_use]
    pub fn recovery_interval(&self) -> Option<Duration> {
        (self.recovery_interval_secs > 0).then(|| Duration::from_secs(self.recovery_interval_secs))
    }
}

impl AppConfig {
    /// Loads `.env`, then `config_file` if present, then the environment.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a source is malformed or validation fails.
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        if dotenvy::dotenv().is_err() {
            tracing::debug!("no .env file found");
        }

        let mut builder = Config::builder()
            .add_source(File::with_name("config/settlement").required(false));
        if let Some(path) = config_file {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        app_config.validate()?;

        info!(
            bind_address = %app_config.server.bind_address,
            backend = ?app_config.database.backend,
            log_format = %app_config.logging.format,
            "configuration loaded"
        );
        Ok(app_config)
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` naming the first invalid setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.backend == StorageBackend::Postgres
            && self.database.url.as_deref().is_none_or(|u| u.trim().is_empty())
        {
            return Err(ConfigError::Message(
                "database.url is required for the postgres backend".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Message(
                "database.max_connections must be greater than 0".to_string(),
            ));
        }
        if self.engine.commit_max_attempts == 0 || self.engine.rollback_max_attempts == 0 {
            return Err(ConfigError::Message(
                "engine retry attempts must be greater than 0".to_string(),
            ));
        }
        if self.engine.commit_deadline_ms == 0 {
            return Err(ConfigError::Message(
                "engine.commit_deadline_ms must be greater than 0".to_string(),
            ));
        }
        if self.engine.recovery_grace_secs == 0 {
            return Err(ConfigError::Message(
                "engine.recovery_grace_secs must be greater than 0".to_string(),
            ));
        }
        if self.server.cors_origins.is_empty() {
            warn!("no CORS origins configured, allowing any origin");
        }
        Ok(())
    }
}
