//! Method identifiers and per-request detection parameters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::detector::Detector;
use crate::detectors::{Dbscan, Iqr, KMeans, Knn, Lof, MatrixProfile, NormA, ThreeSigma};
use crate::error::{DetectionError, DetectionResult};
use crate::stats::Detection;

/// Identifier of a detection algorithm as used on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MethodId {
    #[serde(rename = "3sigma")]
    ThreeSigma,
    #[serde(rename = "iqr")]
    Iqr,
    #[serde(rename = "dbscan")]
    Dbscan,
    #[serde(rename = "kmeans")]
    KMeans,
    #[serde(rename = "knn")]
    Knn,
    #[serde(rename = "lof")]
    Lof,
    #[serde(rename = "matrix_profile")]
    MatrixProfile,
    #[serde(rename = "norma")]
    NormA,
}

impl MethodId {
    pub const ALL: [MethodId; 8] = [
        MethodId::ThreeSigma,
        MethodId::Iqr,
        MethodId::Dbscan,
        MethodId::KMeans,
        MethodId::Knn,
        MethodId::Lof,
        MethodId::MatrixProfile,
        MethodId::NormA,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MethodId::ThreeSigma => "3sigma",
            MethodId::Iqr => "iqr",
            MethodId::Dbscan => "dbscan",
            MethodId::KMeans => "kmeans",
            MethodId::Knn => "knn",
            MethodId::Lof => "lof",
            MethodId::MatrixProfile => "matrix_profile",
            MethodId::NormA => "norma",
        }
    }

    /// Whether the algorithm compares every point (or window) with every
    /// other, so its cost grows with the square of the series length.
    pub fn is_pairwise(&self) -> bool {
        matches!(self, MethodId::Knn | MethodId::Lof | MethodId::MatrixProfile)
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MethodId {
    type Err = DetectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MethodId::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| DetectionError::UnknownMethod(s.to_string()))
    }
}

/// A fully parameterised detection request.
#[derive(Clone, Debug, PartialEq)]
pub enum DetectionMethod {
    ThreeSigma(ThreeSigma),
    Iqr(Iqr),
    Dbscan(Dbscan),
    KMeans(KMeans),
    Knn(Knn),
    Lof(Lof),
    MatrixProfile(MatrixProfile),
    NormA(NormA),
}

impl DetectionMethod {
    /// Build a method from its wire identifier and a JSON parameter map.
    ///
    /// `null` params (or an absent map) select every default. The resulting
    /// parameters are validated before returning.
    pub fn from_parts(method: &str, params: Value) -> DetectionResult<Self> {
        let id: MethodId = method.parse()?;
        let params = match params {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };

        let method = match id {
            MethodId::ThreeSigma => DetectionMethod::ThreeSigma(serde_json::from_value(params)?),
            MethodId::Iqr => DetectionMethod::Iqr(serde_json::from_value(params)?),
            MethodId::Dbscan => DetectionMethod::Dbscan(serde_json::from_value(params)?),
            MethodId::KMeans => DetectionMethod::KMeans(serde_json::from_value(params)?),
            MethodId::Knn => DetectionMethod::Knn(serde_json::from_value(params)?),
            MethodId::Lof => DetectionMethod::Lof(serde_json::from_value(params)?),
            MethodId::MatrixProfile => {
                DetectionMethod::MatrixProfile(serde_json::from_value(params)?)
            }
            MethodId::NormA => DetectionMethod::NormA(serde_json::from_value(params)?),
        };
        method.validate()?;
        Ok(method)
    }

    /// Default parameters for a method.
    pub fn default_for(id: MethodId) -> Self {
        match id {
            MethodId::ThreeSigma => DetectionMethod::ThreeSigma(ThreeSigma::default()),
            MethodId::Iqr => DetectionMethod::Iqr(Iqr::default()),
            MethodId::Dbscan => DetectionMethod::Dbscan(Dbscan::default()),
            MethodId::KMeans => DetectionMethod::KMeans(KMeans::default()),
            MethodId::Knn => DetectionMethod::Knn(Knn::default()),
            MethodId::Lof => DetectionMethod::Lof(Lof::default()),
            MethodId::MatrixProfile => DetectionMethod::MatrixProfile(MatrixProfile::default()),
            MethodId::NormA => DetectionMethod::NormA(NormA::default()),
        }
    }

    /// Parameters as a JSON object keyed by parameter name.
    pub fn params_json(&self) -> Value {
        let value = match self {
            DetectionMethod::ThreeSigma(p) => serde_json::to_value(p),
            DetectionMethod::Iqr(p) => serde_json::to_value(p),
            DetectionMethod::Dbscan(p) => serde_json::to_value(p),
            DetectionMethod::KMeans(p) => serde_json::to_value(p),
            DetectionMethod::Knn(p) => serde_json::to_value(p),
            DetectionMethod::Lof(p) => serde_json::to_value(p),
            DetectionMethod::MatrixProfile(p) => serde_json::to_value(p),
            DetectionMethod::NormA(p) => serde_json::to_value(p),
        };
        value.unwrap_or(Value::Null)
    }

    pub fn detector(&self) -> &dyn Detector {
        match self {
            DetectionMethod::ThreeSigma(d) => d,
            DetectionMethod::Iqr(d) => d,
            DetectionMethod::Dbscan(d) => d,
            DetectionMethod::KMeans(d) => d,
            DetectionMethod::Knn(d) => d,
            DetectionMethod::Lof(d) => d,
            DetectionMethod::MatrixProfile(d) => d,
            DetectionMethod::NormA(d) => d,
        }
    }

    pub fn method(&self) -> MethodId {
        self.detector().method()
    }

    pub fn validate(&self) -> DetectionResult<()> {
        self.detector().validate()
    }

    pub fn detect(&self, raw: &[f64]) -> Detection {
        self.detector().detect(raw)
    }
}

// ── Shared parameter checks ─────────────────────────────────────────────

pub(crate) fn require_finite(name: &str, value: f64) -> DetectionResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(DetectionError::invalid_parameter(name, "must be a finite number"))
    }
}

pub(crate) fn require_non_negative(name: &str, value: f64) -> DetectionResult<()> {
    require_finite(name, value)?;
    if value < 0.0 {
        return Err(DetectionError::invalid_parameter(name, "must not be negative"));
    }
    Ok(())
}

pub(crate) fn require_positive_count(name: &str, value: usize) -> DetectionResult<()> {
    if value == 0 {
        return Err(DetectionError::invalid_parameter(name, "must be at least 1"));
    }
    Ok(())
}

pub(crate) fn require_contamination(value: f64) -> DetectionResult<()> {
    if !(0.0..1.0).contains(&value) {
        return Err(DetectionError::invalid_parameter(
            "contamination",
            "must be within [0, 1)",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn method_ids_round_trip_through_strings() {
        for id in MethodId::ALL {
            assert_eq!(id.as_str().parse::<MethodId>().unwrap(), id);
            assert_eq!(
                serde_json::to_value(id).unwrap(),
                Value::String(id.as_str().to_string())
            );
        }
    }

    #[test]
    fn unknown_method_is_rejected() {
        let err = DetectionMethod::from_parts("isolation_forest", Value::Null).unwrap_err();
        assert!(matches!(err, DetectionError::UnknownMethod(ref m) if m == "isolation_forest"));
    }

    #[test]
    fn missing_params_use_defaults() {
        let m = DetectionMethod::from_parts("lof", Value::Null).unwrap();
        assert_eq!(m, DetectionMethod::Lof(Lof::default()));
        assert_eq!(m.method(), MethodId::Lof);
    }

    #[test]
    fn partial_params_fill_in_defaults() {
        let m = DetectionMethod::from_parts("kmeans", json!({ "n_clusters": 4, "seed": 7 }))
            .unwrap();
        match m {
            DetectionMethod::KMeans(k) => {
                assert_eq!(k.n_clusters, 4);
                assert_eq!(k.seed, Some(7));
                assert_eq!(k.max_iter, 100);
                assert_eq!(k.contamination, 0.1);
            }
            other => panic!("unexpected method {other:?}"),
        }
    }

    #[test]
    fn malformed_params_are_rejected() {
        let err = DetectionMethod::from_parts("dbscan", json!({ "min_samples": "five" }))
            .unwrap_err();
        assert!(matches!(err, DetectionError::InvalidParams(_)));
    }

    #[test]
    fn out_of_range_params_are_rejected() {
        let err = DetectionMethod::from_parts("knn", json!({ "contamination": 1.5 }))
            .unwrap_err();
        assert!(matches!(
            err,
            DetectionError::InvalidParameter { ref name, .. } if name == "contamination"
        ));

        let err = DetectionMethod::from_parts("matrix_profile", json!({ "window_size": 0 }))
            .unwrap_err();
        assert!(matches!(err, DetectionError::InvalidParameter { .. }));
    }

    #[test]
    fn pairwise_methods_are_the_quadratic_ones() {
        let pairwise: Vec<MethodId> = MethodId::ALL
            .into_iter()
            .filter(MethodId::is_pairwise)
            .collect();
        assert_eq!(
            pairwise,
            vec![MethodId::Knn, MethodId::Lof, MethodId::MatrixProfile]
        );
    }

    #[test]
    fn defaults_validate() {
        for id in MethodId::ALL {
            let m = DetectionMethod::default_for(id);
            assert_eq!(m.method(), id);
            assert!(m.validate().is_ok(), "defaults for {id} should validate");
        }
    }
}
