//! Detection handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use tsad_core::{
    catalog, quality, raw_from_json, validate, DetectionError, DetectionMethod, DetectionStats,
    MethodCatalog, MethodId,
};

use super::{check_series_shape, ApiResponse};
use crate::api::state::AppState;
use crate::error::{ApiError, ApiResult};

/// Method selection inside a detection request
#[derive(Debug, Clone, Deserialize)]
pub struct MethodSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub params: Value,
}

/// Detection request body
#[derive(Debug, Deserialize)]
pub struct DetectRequest {
    #[serde(default)]
    pub timestamps: Vec<Value>,
    #[serde(default)]
    pub values: Vec<Value>,
    #[serde(default)]
    pub method: Option<MethodSpec>,
}

/// Detection result echoed back with the input
#[derive(Debug, Serialize)]
pub struct DetectResponse {
    pub method: MethodId,
    pub timestamps: Vec<Value>,
    pub values: Vec<Value>,
    pub anomalies: Vec<bool>,
    pub anomaly_indices: Vec<usize>,
    pub stats: DetectionStats,
}

/// List every detection method with its parameter schema
pub async fn list_detection_methods() -> Json<ApiResponse<MethodCatalog>> {
    Json(ApiResponse::ok(catalog()))
}

/// Run a detector over the submitted series
pub async fn detect_anomalies(
    State(state): State<AppState>,
    Json(req): Json<DetectRequest>,
) -> ApiResult<Json<ApiResponse<DetectResponse>>> {
    check_series_shape(&req.timestamps, &req.values)?;
    state.check_series_len(req.values.len())?;

    let raw = raw_from_json(&req.values);
    validate(&raw, state.config.detection.min_valid_points).map_err(DetectionError::from)?;

    let report = quality(&raw);
    if report.invalid_points > 0 {
        warn!(
            invalid = report.invalid_points,
            nan = report.nan_count,
            inf = report.inf_count,
            "series contains invalid values, they will be skipped"
        );
    }

    let spec = req
        .method
        .ok_or_else(|| ApiError::BadRequest("missing detection method".to_string()))?;
    let mut method = DetectionMethod::from_parts(&spec.kind, spec.params)?;
    if let DetectionMethod::KMeans(kmeans) = &mut method {
        if kmeans.seed.is_none() {
            kmeans.seed = state.config.detection.default_seed;
        }
    }

    let method_id = method.method();
    state.check_method_len(method_id, req.values.len())?;
    let detection = tokio::task::spawn_blocking(move || method.detect(&raw))
        .await
        .map_err(|e| ApiError::Internal(format!("detection task failed: {e}")))?
        .with_quality(report);

    info!(
        method = %method_id,
        total = detection.stats.total_points,
        anomalies = detection.stats.anomaly_count,
        "detection finished"
    );

    let anomaly_indices = detection.anomaly_indices();
    Ok(Json(ApiResponse::ok(DetectResponse {
        method: method_id,
        timestamps: req.timestamps,
        values: req.values,
        anomalies: detection.anomalies,
        anomaly_indices,
        stats: detection.stats,
    })))
}
