use config::{ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_N_MAX: i64 = 1_000_000;
pub const DEFAULT_DB_PATH: &str = "./numbers.db";
pub const DEFAULT_LOG_DIR: &str = "./logs";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub ledger: LedgerConfig,
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
            port: 5001,
            workers: 4,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    /// SQLite file, created on first start
    pub path: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Bound on waiting for a pooled connection (not for the write lock)
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_DB_PATH.to_string(),
            max_connections: 16,
            min_connections: 1,
            acquire_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LedgerConfig {
    /// Largest accepted `n`, inclusive
    pub n_max: i64,
}

impl Default for LedgerConfig {
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
            // Start with default configuration
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", defaults.server.port as i64)?
            .set_default("server.workers", defaults.server.workers as i64)?
            .set_default("database.path", defaults.database.path)?
            .set_default("database.max_connections", defaults.database.max_connections as i64)?
            .set_default("database.min_connections", defaults.database.min_connections as i64)?
            .set_default(
                "database.acquire_timeout_secs",
                defaults.database.acquire_timeout_secs as i64,
            )?
            .set_default("ledger.n_max", defaults.ledger.n_max)?
            .set_default("logging.dir", defaults.logging.dir)?;

        // Add environment-specific config file if it exists
        if let Ok(config_file) = env::var("CONFIG_FILE") {
            builder = builder.add_source(File::with_name(&config_file).required(false));
        } else {
            builder = builder.add_source(
                File::with_name(&format!("config/{}", environment)).required(false),
            );
        }

        // Override with environment variables
        builder = builder.add_source(Environment::with_prefix("LEDGER_SERVICE").separator("__"));

        // Variables shared with the relay
        if let Ok(n_max) = env::var("N_MAX") {
            builder = builder.set_override("ledger.n_max", n_max)?;
        }

        if let Ok(db_path) = env::var("DB_PATH") {
            builder = builder.set_override("database.path", db_path)?;
        }

        if let Ok(host) = env::var("APP_SERVER_HOST") {
            builder = builder.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("APP_SERVER_PORT") {
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

        if self.database.path.is_empty() {
            return Err("Database path is required".to_string());
        }

        if self.database.max_connections == 0 {
            return Err("Database pool needs at least one connection".to_string());
        }

        if self.database.min_connections > self.database.max_connections {
            return Err("Database min_connections exceeds max_connections".to_string());
        }

        // n + 1 must stay representable
        if self.ledger.n_max < 0 || self.ledger.n_max == i64::MAX {
            return Err(format!(
                "N_MAX must be between 0 and {}, got {}",
                i64::MAX - 1,
                self.ledger.n_max
            ));
        }

        if self.logging.dir.is_empty() {
            return Err("Log directory is required".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ledger.n_max, DEFAULT_N_MAX);
        assert_eq!(config.server.port, 5001);
    }

    #[test]
    fn test_rejects_unrepresentable_bound() {
        let mut config = Config::default();
        config.ledger.n_max = i64::MAX;
        assert!(config.validate().is_err());

        config.ledger.n_max = -1;
        assert!(config.validate().is_err());

        config.ledger.n_max = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_pool_sizes() {
        let mut config = Config::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.database.min_connections = 32;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }
}
