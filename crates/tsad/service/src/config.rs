//! Configuration for tsad-service

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tsad_core::DEFAULT_MIN_VALID_POINTS;

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Detection defaults
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Maximum request body size in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    /// Longest series accepted by the detection and smoothing endpoints
    #[serde(default = "default_max_series_len")]
    pub max_series_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            enable_cors: true,
            max_body_size: default_max_body_size(),
            max_series_len: default_max_series_len(),
        }
    }
}

/// Detection defaults applied to every request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Minimum number of finite points a series must contain
    #[serde(default = "default_min_valid_points")]
    pub min_valid_points: usize,

    /// Seed for K-Means requests that do not carry their own
    #[serde(default)]
    pub default_seed: Option<u64>,

    /// Longest series accepted by KNN, LOF and Matrix Profile
    #[serde(default = "default_max_pairwise_len")]
    pub max_pairwise_len: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_valid_points: DEFAULT_MIN_VALID_POINTS,
            default_seed: None,
            max_pairwise_len: default_max_pairwise_len(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5555))
}

fn default_max_body_size() -> usize {
    10 * 1024 * 1024
}

fn default_max_series_len() -> usize {
    20_000
}

fn default_max_pairwise_len() -> usize {
    5_000
}

fn default_min_valid_points() -> usize {
    DEFAULT_MIN_VALID_POINTS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServiceConfig {
    /// Load configuration: defaults, then an optional file, then `TSAD_*`
    /// environment variables (`TSAD_SERVER__MAX_SERIES_LEN=5000`).
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&ServiceConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("TSAD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.server.listen_addr.port(), 5555);
        assert!(config.server.enable_cors);
        assert_eq!(config.server.max_series_len, 20_000);
        assert_eq!(config.detection.min_valid_points, 3);
        assert!(config.detection.default_seed.is_none());
        assert_eq!(config.detection.max_pairwise_len, 5_000);
    }

    #[test]
    fn test_logging_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert!(!config.json);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = ServiceConfig::load(None).unwrap();
        assert_eq!(config.server.max_body_size, 10 * 1024 * 1024);
        assert_eq!(config.detection.min_valid_points, 3);
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: ServiceConfig =
            serde_json::from_str(r#"{ "server": { "max_series_len": 100 } }"#).unwrap();
        assert_eq!(config.server.max_series_len, 100);
        assert_eq!(config.server.listen_addr.port(), 5555);
        assert_eq!(config.logging.level, "info");
    }
}
