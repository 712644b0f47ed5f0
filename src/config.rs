//! Application configuration.
//!
//! Options are resolved in three layers of increasing precedence:
//!
//! 1. JSON config file (path from `CONFIG_PATH` or `-c/--config`)
//! 2. Environment variables
//! 3. Command-line flags
//!
//! ## Environment variables
//!
//! - `HTTP_SERVER_ADDRESS` - bind address (default: `localhost:8080`)
//! - `BASE_URL` - base of shortened links (default: `http://localhost:8080`)
//! - `RELEASE_MODE` - `debug`, `release`, or `test` (default: `debug`)
//! - `LOG_LEVEL` - tracing filter (default: `info`)
//! - `FILE_STORAGE_PATH` - enables the file backend when set
//! - `DATABASE_DSN` - enables the Postgres backend when set
//! - `ENABLE_HTTPS`, `TLS_CERT_PATH`, `TLS_KEY_PATH`
//! - `TRUSTED_SUBNET` - CIDR allowed to query internal stats
//! - `AUTH_SECRET` - HS256 secret for the identity cookie
//! - `DATABASE_MAX_CONNS`, `DATABASE_MIN_CONNS`,
//!   `DATABASE_CONN_MAX_LIFETIME`, `DATABASE_CONN_MAX_IDLE_TIME` (seconds)
//! - `GRACEFUL_SHUTDOWN_TIMEOUT` (seconds)
//! - `DELETE_QUEUE_CAPACITY`, `DELETE_BATCH_SIZE`,
//!   `DELETE_FLUSH_INTERVAL_MS`
//! - `FILE_SAVE_INTERVAL` (seconds)

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use ipnetwork::IpNetwork;
use serde::Deserialize;

use crate::domain::delete_worker::DeleteWorkerConfig;
use crate::infrastructure::persistence::FileRepositoryConfig;

// Development fallback; any real deployment overrides it.
const DEFAULT_AUTH_SECRET: &str = "NuQu82Q2";

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub http_server_address: String,
    pub base_url: String,
    pub release_mode: String,
    pub log_level: String,
    pub file_storage_path: String,
    pub database_dsn: String,
    pub enable_https: bool,
    pub tls_cert_path: String,
    pub tls_key_path: String,
    pub trusted_subnet: String,
    pub auth_secret: String,

    pub database_max_conns: u32,
    pub database_min_conns: u32,
    /// Maximum connection lifetime in seconds.
    pub database_conn_max_lifetime: u64,
    /// Idle connection lifetime in seconds.
    pub database_conn_max_idle_time: u64,

    /// Budget in seconds for draining the worker and store at shutdown.
    pub graceful_shutdown_timeout: u64,

    pub delete_queue_capacity: usize,
    pub delete_batch_size: usize,
    pub delete_flush_interval_ms: u64,

    /// File backend snapshot interval in seconds.
    pub file_save_interval: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_server_address: "localhost:8080".to_string(),
            base_url: "http://localhost:8080".to_string(),
            release_mode: "debug".to_string(),
            log_level: "info".to_string(),
            file_storage_path: String::new(),
            database_dsn: String::new(),
            enable_https: false,
            tls_cert_path: String::new(),
            tls_key_path: String::new(),
            trusted_subnet: String::new(),
            auth_secret: DEFAULT_AUTH_SECRET.to_string(),
            database_max_conns: 10,
            database_min_conns: 2,
            database_conn_max_lifetime: 1800,
            database_conn_max_idle_time: 600,
            graceful_shutdown_timeout: 20,
            delete_queue_capacity: 100,
            delete_batch_size: 50,
            delete_flush_interval_ms: 500,
            file_save_interval: 10,
        }
    }
}

/// One configuration layer; every field optional so layers can be stacked.
#[derive(Debug, Default, Deserialize)]
pub struct PartialConfig {
    pub http_server_address: Option<String>,
    pub base_url: Option<String>,
    pub release_mode: Option<String>,
    pub log_level: Option<String>,
    pub file_storage_path: Option<String>,
    pub database_dsn: Option<String>,
    pub enable_https: Option<bool>,
    pub tls_cert_path: Option<String>,
    pub tls_key_path: Option<String>,
    pub trusted_subnet: Option<String>,
    pub auth_secret: Option<String>,
    pub database_max_conns: Option<u32>,
    pub database_min_conns: Option<u32>,
    pub database_conn_max_lifetime: Option<u64>,
    pub database_conn_max_idle_time: Option<u64>,
    pub graceful_shutdown_timeout: Option<u64>,
    pub delete_queue_capacity: Option<usize>,
    pub delete_batch_size: Option<usize>,
    pub delete_flush_interval_ms: Option<u64>,
    pub file_save_interval: Option<u64>,
}

/// Command-line flags. Short names mirror the service's historical flag set.
#[derive(Debug, Parser)]
#[command(name = "urlshort", about = "URL shortening service")]
struct Flags {
    /// HTTP server address
    #[arg(short = 'a', long)]
    http_server_address: Option<String>,

    /// Base URL for shortened links
    #[arg(short = 'b', long)]
    base_url: Option<String>,

    /// Release mode: debug, release, or test
    #[arg(short = 'r', long)]
    release_mode: Option<String>,

    /// Log level
    #[arg(short = 'l', long)]
    log_level: Option<String>,

    /// File storage path (enables the file backend)
    #[arg(short = 'f', long)]
    file_storage_path: Option<String>,

    /// Database DSN (enables the Postgres backend)
    #[arg(short = 'd', long)]
    database_dsn: Option<String>,

    /// Trusted subnet CIDR for the internal stats endpoint
    #[arg(short = 't', long)]
    trusted_subnet: Option<String>,

    /// Serve HTTPS
    #[arg(long, action = clap::ArgAction::SetTrue)]
    enable_https: Option<bool>,

    /// TLS certificate path
    #[arg(long)]
    tls_cert_path: Option<String>,

    /// TLS private key path
    #[arg(long)]
    tls_key_path: Option<String>,

    /// Path to a JSON config file
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from all three layers and validates it.
    pub fn load() -> Result<Self> {
        let flags = Flags::parse();

        let mut config = Config::default();

        let config_path = flags
            .config
            .clone()
            .or_else(|| env::var("CONFIG_PATH").ok().map(PathBuf::from));
        if let Some(path) = config_path {
            config.apply(Self::from_json_file(&path)?);
        }

        config.apply(Self::from_env());
        config.apply(flags.into_partial());

        config.validate()?;
        Ok(config)
    }

    /// Applies one layer on top of the current values.
    pub fn apply(&mut self, partial: PartialConfig) {
        macro_rules! take {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = partial.$field {
                    self.$field = value;
                })*
            };
        }
        take!(
            http_server_address,
            base_url,
            release_mode,
            log_level,
            file_storage_path,
            database_dsn,
            enable_https,
            tls_cert_path,
            tls_key_path,
            trusted_subnet,
            auth_secret,
            database_max_conns,
            database_min_conns,
            database_conn_max_lifetime,
            database_conn_max_idle_time,
            graceful_shutdown_timeout,
            delete_queue_capacity,
            delete_batch_size,
            delete_flush_interval_ms,
            file_save_interval,
        );
    }

    fn from_json_file(path: &PathBuf) -> Result<PartialConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    fn from_env() -> PartialConfig {
        PartialConfig {
            http_server_address: env_var("HTTP_SERVER_ADDRESS"),
            base_url: env_var("BASE_URL"),
            release_mode: env_var("RELEASE_MODE"),
            log_level: env_var("LOG_LEVEL"),
            file_storage_path: env_var("FILE_STORAGE_PATH"),
            database_dsn: env_var("DATABASE_DSN"),
            enable_https: env_parsed("ENABLE_HTTPS"),
            tls_cert_path: env_var("TLS_CERT_PATH"),
            tls_key_path: env_var("TLS_KEY_PATH"),
            trusted_subnet: env_var("TRUSTED_SUBNET"),
            auth_secret: env_var("AUTH_SECRET"),
            database_max_conns: env_parsed("DATABASE_MAX_CONNS"),
            database_min_conns: env_parsed("DATABASE_MIN_CONNS"),
            database_conn_max_lifetime: env_parsed("DATABASE_CONN_MAX_LIFETIME"),
            database_conn_max_idle_time: env_parsed("DATABASE_CONN_MAX_IDLE_TIME"),
            graceful_shutdown_timeout: env_parsed("GRACEFUL_SHUTDOWN_TIMEOUT"),
            delete_queue_capacity: env_parsed("DELETE_QUEUE_CAPACITY"),
            delete_batch_size: env_parsed("DELETE_BATCH_SIZE"),
            delete_flush_interval_ms: env_parsed("DELETE_FLUSH_INTERVAL_MS"),
            file_save_interval: env_parsed("FILE_SAVE_INTERVAL"),
        }
    }

    /// Validates the configuration, failing fast on nonsense.
    pub fn validate(&self) -> Result<()> {
        if !self.http_server_address.contains(':') {
            bail!(
                "HTTP_SERVER_ADDRESS must be in 'host:port' form, got '{}'",
                self.http_server_address
            );
        }

        if self.base_url.is_empty() {
            bail!("BASE_URL must not be empty");
        }

        if !matches!(self.release_mode.as_str(), "debug" | "release" | "test") {
            bail!(
                "RELEASE_MODE must be debug, release, or test, got '{}'",
                self.release_mode
            );
        }

        if self.auth_secret.is_empty() {
            bail!("AUTH_SECRET must not be empty");
        }

        if self.enable_https && (self.tls_cert_path.is_empty() || self.tls_key_path.is_empty()) {
            bail!("TLS_CERT_PATH and TLS_KEY_PATH must be set when HTTPS is enabled");
        }

        if !self.trusted_subnet.is_empty() {
            IpNetwork::from_str(&self.trusted_subnet).with_context(|| {
                format!("TRUSTED_SUBNET is not a valid CIDR: '{}'", self.trusted_subnet)
            })?;
        }

        if self.database_max_conns == 0 {
            bail!("DATABASE_MAX_CONNS must be at least 1");
        }
        if self.database_min_conns > self.database_max_conns {
            bail!("DATABASE_MIN_CONNS must not exceed DATABASE_MAX_CONNS");
        }

        if self.delete_queue_capacity == 0 {
            bail!("DELETE_QUEUE_CAPACITY must be at least 1");
        }
        if self.delete_batch_size == 0 {
            bail!("DELETE_BATCH_SIZE must be at least 1");
        }
        if self.delete_flush_interval_ms == 0 {
            bail!("DELETE_FLUSH_INTERVAL_MS must be greater than 0");
        }
        if self.file_save_interval == 0 {
            bail!("FILE_SAVE_INTERVAL must be greater than 0");
        }

        Ok(())
    }

    /// Parsed trusted subnet; `None` when unconfigured. `validate` has
    /// already rejected malformed values.
    pub fn trusted_network(&self) -> Option<IpNetwork> {
        if self.trusted_subnet.is_empty() {
            return None;
        }
        IpNetwork::from_str(&self.trusted_subnet).ok()
    }

    pub fn delete_worker_config(&self) -> DeleteWorkerConfig {
        DeleteWorkerConfig {
            queue_capacity: self.delete_queue_capacity,
            batch_size: self.delete_batch_size,
            flush_interval: Duration::from_millis(self.delete_flush_interval_ms),
        }
    }

    pub fn file_repository_config(&self) -> FileRepositoryConfig {
        FileRepositoryConfig {
            save_interval: Duration::from_secs(self.file_save_interval),
        }
    }

    /// Logs a configuration summary. Secrets and DSN credentials stay out.
    pub fn log_summary(&self) {
        tracing::info!(
            address = %self.http_server_address,
            base_url = %self.base_url,
            release_mode = %self.release_mode,
            log_level = %self.log_level,
            https = self.enable_https,
            "configuration loaded"
        );

        let storage = if !self.database_dsn.is_empty() {
            "postgres"
        } else if !self.file_storage_path.is_empty() {
            "file"
        } else {
            "memory"
        };
        tracing::info!(storage, "storage backend selected");
    }
}

impl Flags {
    fn into_partial(self) -> PartialConfig {
        PartialConfig {
            http_server_address: self.http_server_address,
            base_url: self.base_url,
            release_mode: self.release_mode,
            log_level: self.log_level,
            file_storage_path: self.file_storage_path,
            database_dsn: self.database_dsn,
            // SetTrue yields Some(false) when the flag is absent; only an
            // explicit flag may override lower layers.
            enable_https: self.enable_https.filter(|&on| on),
            tls_cert_path: self.tls_cert_path,
            tls_key_path: self.tls_key_path,
            trusted_subnet: self.trusted_subnet,
            auth_secret: None,
            database_max_conns: None,
            database_min_conns: None,
            database_conn_max_lifetime: None,
            database_conn_max_idle_time: None,
            graceful_shutdown_timeout: None,
            delete_queue_capacity: None,
            delete_batch_size: None,
            delete_flush_interval_ms: None,
            file_save_interval: None,
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

fn env_parsed<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|value| value.parse().ok())
}
