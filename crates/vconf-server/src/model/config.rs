//! Configuration management for the vconf server
//!
//! Loaded once in `main` from a YAML file plus `VCONF_`-prefixed environment
//! overrides, then passed by reference to every component that needs it.

use std::time::Duration;

use clap::Parser;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use vconf_persistence::StorageConfig;

/// Config file read when no path is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "./conf/application.yml";

/// Command line arguments for the server
#[derive(Debug, Parser)]
#[command(name = "vconf-server", about = "Versioned configuration distribution server")]
pub struct Cli {
    /// Path to the config file
    #[arg(short = 'c', long = "config", env = "VCONF_CONFIG")]
    pub config: Option<String>,
}

/// Logging parameters
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LoggingParams {
    /// Human-readable debug output instead of JSON
    pub is_debug: bool,
    /// Level override; defaults to debug or info depending on `is_debug`
    pub level: Option<String>,
    /// Directory for a daily-rolling log file
    pub log_dir: Option<String>,
}

impl Default for LoggingParams {
    fn default() -> Self {
        Self {
            is_debug: true,
            level: None,
            log_dir: None,
        }
    }
}

impl LoggingParams {
    pub fn level(&self) -> &str {
        match &self.level {
            Some(level) => level,
            None if self.is_debug => "debug",
            None => "info",
        }
    }
}

/// HTTP listener parameters
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    pub bind_ip: String,
    pub port: u16,
    pub read_timeout_ms: u64,
    pub write_timeout_ms: u64,
    pub shutdown_timeout_ms: u64,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            bind_ip: "127.0.0.1".to_string(),
            port: 8080,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
            shutdown_timeout_ms: 5000,
        }
    }
}

impl ListenConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind_ip, self.port)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    /// Graceful shutdown budget, rounded up to whole seconds
    pub fn shutdown_timeout_secs(&self) -> u64 {
        self.shutdown_timeout_ms.div_ceil(1000)
    }
}

/// Application configuration
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub logging: LoggingParams,
    pub listen: ListenConfig,
    pub storage: StorageConfig,
}

impl ServerConfig {
    /// Load from the given file, or from the default location if it exists.
    ///
    /// A path given explicitly must exist. Environment variables such as
    /// `VCONF_LISTEN__PORT=9090` override file values.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let (path, required) = match path {
            Some(p) => (p, true),
            None => (DEFAULT_CONFIG_PATH, false),
        };

        let config = Config::builder()
            .add_source(File::new(path, FileFormat::Yaml).required(required))
            .add_source(
                Environment::with_prefix("VCONF")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| anyhow::anyhow!("failed to load configuration from {}: {}", path, e))?;

        config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("invalid configuration in {}: {}", path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.listen.addr(), "127.0.0.1:8080");
        assert_eq!(cfg.listen.shutdown_timeout_secs(), 5);
        assert_eq!(cfg.storage.backend, "memory");
        assert_eq!(cfg.logging.level(), "debug");
    }

    #[test]
    fn test_load_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(
            file,
            "logging:\n  is_debug: false\nlisten:\n  port: 9191\n  shutdown_timeout_ms: 1500\nstorage:\n  lifetime_ms: 2500\n"
        )
        .unwrap();

        let cfg = ServerConfig::load(file.path().to_str()).unwrap();
        assert_eq!(cfg.listen.port, 9191);
        assert_eq!(cfg.listen.bind_ip, "127.0.0.1");
        assert_eq!(cfg.listen.shutdown_timeout_secs(), 2);
        assert_eq!(cfg.storage.grace_window(), Duration::from_millis(2500));
        assert_eq!(cfg.logging.level(), "info");
    }

    #[test]
    fn test_explicit_missing_file_fails() {
        assert!(ServerConfig::load(Some("/nonexistent/vconf.yml")).is_err());
    }
}
