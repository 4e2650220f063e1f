//! Application state for API handlers

use std::sync::Arc;

use tsad_core::MethodId;

use crate::config::ServiceConfig;
use crate::error::{ApiError, ApiResult};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Loaded service configuration
    pub config: Arc<ServiceConfig>,

    /// Service version
    pub version: String,

    /// Service start time
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config: Arc::new(config),
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: chrono::Utc::now(),
        }
    }

    /// Get uptime as a human-readable string
    pub fn uptime(&self) -> String {
        let secs = (chrono::Utc::now() - self.started_at).num_seconds();

        if secs < 60 {
            format!("{}s", secs)
        } else if secs < 3600 {
            format!("{}m {}s", secs / 60, secs % 60)
        } else if secs < 86400 {
            format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
        } else {
            format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
        }
    }

    /// Reject series longer than the configured cap.
    pub fn check_series_len(&self, len: usize) -> ApiResult<()> {
        let max = self.config.server.max_series_len;
        if len > max {
            return Err(ApiError::PayloadTooLarge { len, max });
        }
        Ok(())
    }

    /// Reject series too long for a pairwise detector.
    pub fn check_method_len(&self, method: MethodId, len: usize) -> ApiResult<()> {
        let max = self.config.detection.max_pairwise_len;
        if method.is_pairwise() && len > max {
            return Err(ApiError::TooLongForMethod { method, len, max });
        }
        Ok(())
    }
}
