//! # tsad-core
//!
//! Anomaly detection for univariate time series.
//!
//! A raw series may contain invalid entries (NaN, ±Infinity, or values that
//! failed conversion). Every detector works on the finite subsequence and
//! reports a mask aligned to the raw series, so invalid positions are never
//! flagged.
//!
//! ## Pipeline
//!
//! ```text
//!   raw: &[f64] ──► clean() ──► CleanedSeries { values, validity, indices }
//!                                     │
//!                                     ▼
//!                        Detector::detect_cleaned()
//!                                     │ flags in cleaned coordinates
//!                                     ▼
//!                   Detection { anomalies (full length), stats }
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use tsad_core::{validate, DetectionMethod, DEFAULT_MIN_VALID_POINTS};
//!
//! let raw = [1.0, 2.0, 3.0, f64::NAN, 4.0, 5.0, 100.0];
//! validate(&raw, DEFAULT_MIN_VALID_POINTS).unwrap();
//!
//! let method = DetectionMethod::from_parts("iqr", json!({ "iqr_multiplier": 1.5 })).unwrap();
//! let detection = method.detect(&raw);
//! assert_eq!(detection.anomaly_indices(), vec![6]);
//! assert!(!detection.anomalies[3]);
//! ```

#![deny(unsafe_code)]

pub mod catalog;
pub mod cleaner;
pub mod detector;
pub mod detectors;
pub mod error;
pub mod method;
pub mod numeric;
pub mod stats;

// ── Re-exports ──────────────────────────────────────────────────────────

pub use catalog::{catalog, method_info, Category, MethodCatalog, MethodInfo, ParamSchema, ParamType};
pub use cleaner::{
    clean, quality, raw_from_json, validate, CleanedSeries, DataQuality,
    DEFAULT_MIN_VALID_POINTS, MAX_INVALID_RATIO,
};
pub use detector::Detector;
pub use detectors::{Dbscan, Iqr, KMeans, Knn, Lof, MatrixProfile, NormA, ThreeSigma};
pub use error::{DetectionError, DetectionResult, ValidationError};
pub use method::{DetectionMethod, MethodId};
pub use stats::{Detection, DetectionStats, Diagnostics};

/// Validate a raw series and run `method` on it.
///
/// Unlike [`DetectionMethod::detect`], which always produces a result, this
/// rejects input that fails [`validate`] before any algorithm runs.
pub fn detect(raw: &[f64], method: &DetectionMethod, min_valid: usize) -> DetectionResult<Detection> {
    validate(raw, min_valid)?;
    Ok(method.detect(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_rejects_invalid_input_before_running() {
        let method = DetectionMethod::default_for(MethodId::ThreeSigma);
        let err = detect(&[f64::NAN, f64::NAN, 1.0], &method, 3).unwrap_err();
        assert!(matches!(
            err,
            DetectionError::Validation(ValidationError::InsufficientValid { .. })
        ));
        assert!(err.to_string().starts_with("data validation failed"));
    }

    #[test]
    fn detect_runs_every_method_on_valid_input() {
        let raw: Vec<f64> = (0..40)
            .map(|i| if i == 20 { 30.0 } else { (i % 4) as f64 })
            .collect();
        for id in MethodId::ALL {
            let method = DetectionMethod::default_for(id);
            let det = detect(&raw, &method, DEFAULT_MIN_VALID_POINTS).unwrap();
            assert_eq!(det.anomalies.len(), raw.len(), "{id}");
            assert_eq!(det.stats.valid_points, 40, "{id}");
        }
    }
}
