//! Data cleaning and validation shared by every detector.
//!
//! A raw series is a slice of `f64` where NaN and ±Inf mark invalid entries.
//! Cleaning keeps the finite values in order and remembers where each one
//! came from, so detector output computed on the cleaned values can be
//! scattered back onto the original positions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;

/// Minimum number of finite points accepted by [`validate`] by default.
pub const DEFAULT_MIN_VALID_POINTS: usize = 3;

/// Largest tolerated fraction of invalid points.
pub const MAX_INVALID_RATIO: f64 = 0.5;

/// Finite subsequence of a raw series plus its mapping back to the original.
///
/// `values.len() == indices.len() == validity.iter().filter(|v| **v).count()`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CleanedSeries {
    /// Finite values in original order.
    pub values: Vec<f64>,
    /// `true` at position `p` iff the raw value at `p` is finite.
    pub validity: Vec<bool>,
    /// Strictly increasing original positions of `values`.
    pub indices: Vec<usize>,
}

impl CleanedSeries {
    /// Length of the raw series this was cleaned from.
    pub fn total_points(&self) -> usize {
        self.validity.len()
    }

    pub fn valid_points(&self) -> usize {
        self.values.len()
    }

    pub fn invalid_points(&self) -> usize {
        self.total_points() - self.valid_points()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Map per-value flags (cleaned coordinates) onto a full-length mask.
    ///
    /// Invalid positions are always `false`.
    pub fn scatter(&self, flags: &[bool]) -> Vec<bool> {
        debug_assert_eq!(flags.len(), self.indices.len());
        let mut mask = vec![false; self.total_points()];
        for (&flag, &idx) in flags.iter().zip(&self.indices) {
            mask[idx] = flag;
        }
        mask
    }
}

/// Split a raw series into its finite values, validity mask, and index map.
pub fn clean(raw: &[f64]) -> CleanedSeries {
    let validity: Vec<bool> = raw.iter().map(|v| v.is_finite()).collect();
    let mut values = Vec::with_capacity(raw.len());
    let mut indices = Vec::with_capacity(raw.len());
    for (idx, &v) in raw.iter().enumerate() {
        if v.is_finite() {
            values.push(v);
            indices.push(idx);
        }
    }
    CleanedSeries {
        values,
        validity,
        indices,
    }
}

/// Check that a raw series is usable for detection.
///
/// Checks run in order: empty input, no finite values, fewer than
/// `min_valid` finite values, more than half the points invalid.
pub fn validate(raw: &[f64], min_valid: usize) -> Result<(), ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::EmptyInput);
    }

    let valid = raw.iter().filter(|v| v.is_finite()).count();
    if valid == 0 {
        return Err(ValidationError::AllInvalid);
    }
    if valid < min_valid {
        return Err(ValidationError::InsufficientValid {
            required: min_valid,
            actual: valid,
        });
    }

    let invalid = raw.len() - valid;
    if invalid as f64 / raw.len() as f64 > MAX_INVALID_RATIO {
        return Err(ValidationError::ExcessInvalidRatio {
            invalid,
            total: raw.len(),
        });
    }

    Ok(())
}

/// Informational counts about a raw series. Never blocks execution.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DataQuality {
    pub total_points: usize,
    pub valid_points: usize,
    pub invalid_points: usize,
    pub nan_count: usize,
    pub inf_count: usize,
    pub valid_ratio: f64,
}

pub fn quality(raw: &[f64]) -> DataQuality {
    if raw.is_empty() {
        return DataQuality::default();
    }

    let valid_points = raw.iter().filter(|v| v.is_finite()).count();
    let nan_count = raw.iter().filter(|v| v.is_nan()).count();
    let inf_count = raw.iter().filter(|v| v.is_infinite()).count();

    DataQuality {
        total_points: raw.len(),
        valid_points,
        invalid_points: raw.len() - valid_points,
        nan_count,
        inf_count,
        valid_ratio: valid_points as f64 / raw.len() as f64,
    }
}

/// Convert JSON values into a raw series.
///
/// Numbers keep their value, numeric strings are parsed, booleans become
/// 1.0/0.0. `null` and anything unconvertible become NaN.
pub fn raw_from_json(values: &[Value]) -> Vec<f64> {
    values.iter().map(json_to_f64).collect()
}

fn json_to_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}
