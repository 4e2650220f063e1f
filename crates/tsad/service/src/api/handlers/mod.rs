//! API request handlers

mod detection;
mod health;
mod preprocessing;

pub use detection::*;
pub use health::*;
pub use preprocessing::*;

use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

/// Successful response envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Reject missing or misaligned `timestamps` / `values`.
fn check_series_shape(timestamps: &[Value], values: &[Value]) -> ApiResult<()> {
    if timestamps.is_empty() || values.is_empty() {
        return Err(ApiError::BadRequest(
            "missing required fields: timestamps and values".to_string(),
        ));
    }
    if timestamps.len() != values.len() {
        return Err(ApiError::BadRequest(format!(
            "timestamps and values differ in length ({} vs {})",
            timestamps.len(),
            values.len()
        )));
    }
    Ok(())
}
