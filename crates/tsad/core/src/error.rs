use thiserror::Error;

/// Reasons a raw series is rejected before any detector runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("series is empty")]
    EmptyInput,

    #[error("all data points are invalid (NaN or Inf)")]
    AllInvalid,

    #[error("insufficient valid data points (need at least {required}, got {actual})")]
    InsufficientValid { required: usize, actual: usize },

    #[error("too many invalid data points ({invalid}/{total} = {:.1}%)", percent(.invalid, .total))]
    ExcessInvalidRatio { invalid: usize, total: usize },
}

fn percent(part: &usize, whole: &usize) -> f64 {
    if *whole == 0 {
        0.0
    } else {
        *part as f64 / *whole as f64 * 100.0
    }
}

/// Errors from building or running a detection request.
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("data validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("unsupported detection method: {0}")]
    UnknownMethod(String),

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("malformed method parameters: {0}")]
    InvalidParams(String),
}

impl DetectionError {
    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        DetectionError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for DetectionError {
    fn from(e: serde_json::Error) -> Self {
        DetectionError::InvalidParams(e.to_string())
    }
}

/// Convenience type alias for detection results.
pub type DetectionResult<T> = Result<T, DetectionError>;
