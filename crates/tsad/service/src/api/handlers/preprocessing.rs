//! Preprocessing handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use tsad_core::raw_from_json;

use super::{check_series_shape, ApiResponse};
use crate::api::state::AppState;
use crate::error::{ApiError, ApiResult};
use crate::smoothing::{smooth, smoothing_info, SmoothingMethod};

fn default_method() -> String {
    SmoothingMethod::MovingAverage.as_str().to_string()
}

fn default_window_size() -> i64 {
    5
}

/// Smoothing parameters
#[derive(Debug, Clone, Deserialize)]
pub struct SmoothParams {
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_window_size")]
    pub window_size: i64,
}

impl Default for SmoothParams {
    fn default() -> Self {
        Self {
            method: default_method(),
            window_size: default_window_size(),
        }
    }
}

/// Smoothing request body
#[derive(Debug, Deserialize)]
pub struct SmoothRequest {
    #[serde(default)]
    pub timestamps: Vec<Value>,
    #[serde(default)]
    pub values: Vec<Value>,
    #[serde(flatten)]
    pub params: SmoothParams,
}

/// One step of a preprocessing pipeline as sent on the wire
#[derive(Debug, Deserialize)]
pub struct StepSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub params: Value,
}

/// A parsed preprocessing step
#[derive(Debug, Clone)]
pub enum PipelineStep {
    Smooth(SmoothParams),
}

impl TryFrom<StepSpec> for PipelineStep {
    type Error = ApiError;

    fn try_from(spec: StepSpec) -> ApiResult<Self> {
        match spec.kind.as_str() {
            "smooth" => {
                let params = match spec.params {
                    Value::Null => SmoothParams::default(),
                    params => serde_json::from_value(params)
                        .map_err(|e| ApiError::BadRequest(format!("invalid smooth step: {e}")))?,
                };
                Ok(PipelineStep::Smooth(params))
            }
            other => Err(ApiError::UnknownMethod(format!(
                "unsupported preprocessing step: {other}"
            ))),
        }
    }
}

/// Pipeline request body
#[derive(Debug, Deserialize)]
pub struct PipelineRequest {
    #[serde(default)]
    pub timestamps: Vec<Value>,
    #[serde(default)]
    pub values: Vec<Value>,
    #[serde(default)]
    pub methods: Vec<StepSpec>,
}

/// Processed series
#[derive(Debug, Serialize)]
pub struct SeriesResponse {
    pub timestamps: Vec<Value>,
    pub values: Vec<f64>,
}

/// Smooth a series with a single method
pub async fn apply_smoothing(
    State(state): State<AppState>,
    Json(req): Json<SmoothRequest>,
) -> ApiResult<Json<ApiResponse<SeriesResponse>>> {
    check_series_shape(&req.timestamps, &req.values)?;
    state.check_series_len(req.values.len())?;

    let values = smooth(&raw_from_json(&req.values), &req.params.method, req.params.window_size)?;
    ensure_finite(&values)?;

    info!(method = %req.params.method, window_size = req.params.window_size, "series smoothed");
    Ok(Json(ApiResponse::ok(SeriesResponse {
        timestamps: req.timestamps,
        values,
    })))
}

/// Apply preprocessing steps in order
pub async fn apply_pipeline(
    State(state): State<AppState>,
    Json(req): Json<PipelineRequest>,
) -> ApiResult<Json<ApiResponse<SeriesResponse>>> {
    check_series_shape(&req.timestamps, &req.values)?;
    state.check_series_len(req.values.len())?;

    let steps = req
        .methods
        .into_iter()
        .map(PipelineStep::try_from)
        .collect::<ApiResult<Vec<_>>>()?;

    let mut values = raw_from_json(&req.values);
    for step in &steps {
        match step {
            PipelineStep::Smooth(params) => {
                values = smooth(&values, &params.method, params.window_size)?;
            }
        }
    }
    ensure_finite(&values)?;

    info!(steps = steps.len(), "preprocessing pipeline applied");
    Ok(Json(ApiResponse::ok(SeriesResponse {
        timestamps: req.timestamps,
        values,
    })))
}

/// Schemas of the available preprocessing steps
pub async fn list_preprocessing_methods() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::ok(json!({ "smooth": smoothing_info() })))
}

fn ensure_finite(values: &[f64]) -> ApiResult<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ApiError::Internal(
            "preprocessing produced invalid values (NaN or Inf), check the input data and parameters"
                .to_string(),
        ))
    }
}
