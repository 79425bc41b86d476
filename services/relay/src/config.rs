use config::{ConfigError, Environment, File};
use ledger_service::config::{DEFAULT_LOG_DIR, DEFAULT_N_MAX};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub validation: ValidationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            workers: 4,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UpstreamConfig {
    /// Ledger service base URL, without the `/process` path
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5001".to_string(),
            timeout_secs: 5,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ValidationConfig {
    pub n_max: i64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            n_max: DEFAULT_N_MAX,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: DEFAULT_LOG_DIR.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let defaults = Config::default();

        let mut builder = config::Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", defaults.server.port as i64)?
            .set_default("server.workers", defaults.server.workers as i64)?
            .set_default("upstream.base_url", defaults.upstream.base_url)?
            .set_default("upstream.timeout_secs", defaults.upstream.timeout_secs as i64)?
            .set_default("validation.n_max", defaults.validation.n_max)?
            .set_default("logging.dir", defaults.logging.dir)?;

        if let Ok(config_file) = env::var("RELAY_CONFIG_FILE") {
            builder = builder.add_source(File::with_name(&config_file).required(false));
        } else {
            builder = builder.add_source(
                File::with_name(&format!("config/relay-{}", environment)).required(false),
            );
        }

        builder = builder.add_source(Environment::with_prefix("RELAY").separator("__"));

        if let Ok(n_max) = env::var("N_MAX") {
            builder = builder.set_override("validation.n_max", n_max)?;
        }

        if let Ok(url) = env::var("APP_SERVER_URL") {
            builder = builder.set_override("upstream.base_url", url)?;
        }

        if let Ok(host) = env::var("WEB_SERVER_HOST") {
            builder = builder.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("WEB_SERVER_PORT") {
            builder = builder.set_override("server.port", port)?;
        }

        if let Ok(log_dir) = env::var("LOG_DIR") {
            builder = builder.set_override("logging.dir", log_dir)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port cannot be 0".to_string());
        }

        if self.server.workers == 0 {
            return Err("At least one server worker is required".to_string());
        }

        if self.upstream.base_url.is_empty() {
            return Err("Ledger service URL is required".to_string());
        }

        if self.upstream.timeout_secs == 0 {
            return Err("Upstream timeout must be positive".to_string());
        }

        if self.validation.n_max < 0 || self.validation.n_max == i64::MAX {
            return Err(format!(
                "N_MAX must be between 0 and {}, got {}",
                i64::MAX - 1,
                self.validation.n_max
            ));
        }

        if self.logging.dir.is_empty() {
            return Err("Log directory is required".to_string());
        }

        Ok(())
    }
}
