//! Smoothing preprocessor applied to a series before detection.
//!
//! Invalid entries are filled by linear interpolation first, so the
//! smoothed series is always finite unless the input had no finite value
//! at all (then it is all zeros).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tsad_core::ParamSchema;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmoothingError {
    #[error("unsupported smoothing method: {0} (supported: moving_average, exponential, gaussian)")]
    UnsupportedMethod(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingMethod {
    MovingAverage,
    Exponential,
    Gaussian,
}

impl SmoothingMethod {
    pub const ALL: [SmoothingMethod; 3] = [
        SmoothingMethod::MovingAverage,
        SmoothingMethod::Exponential,
        SmoothingMethod::Gaussian,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SmoothingMethod::MovingAverage => "moving_average",
            SmoothingMethod::Exponential => "exponential",
            SmoothingMethod::Gaussian => "gaussian",
        }
    }
}

impl fmt::Display for SmoothingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SmoothingMethod {
    type Err = SmoothingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SmoothingMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| SmoothingError::UnsupportedMethod(s.to_string()))
    }
}

/// Smooth `values` with the named method.
///
/// A `window_size` below 1 returns the input unchanged, whatever the method.
pub fn smooth(values: &[f64], method: &str, window_size: i64) -> Result<Vec<f64>, SmoothingError> {
    if values.is_empty() {
        return Ok(Vec::new());
    }
    let window = match usize::try_from(window_size) {
        Ok(w) if w >= 1 => w,
        _ => return Ok(values.to_vec()),
    };
    let method: SmoothingMethod = method.parse()?;

    let Some(filled) = interpolate_invalid(values) else {
        tracing::warn!(len = values.len(), "no finite values to smooth, returning zeros");
        return Ok(vec![0.0; values.len()]);
    };

    let result = match method {
        SmoothingMethod::MovingAverage => moving_average(&filled, window),
        SmoothingMethod::Exponential => exponential(&filled, window),
        SmoothingMethod::Gaussian => gaussian(&filled, window),
    };

    if result.iter().all(|v| v.is_finite()) {
        Ok(result)
    } else {
        tracing::warn!(%method, "smoothing produced non-finite values, keeping input");
        Ok(values.to_vec())
    }
}

/// Replace non-finite entries by linear interpolation between the nearest
/// finite neighbours, extending the edge values outward. `None` when no
/// entry is finite.
fn interpolate_invalid(values: &[f64]) -> Option<Vec<f64>> {
    let valid: Vec<usize> = (0..values.len()).filter(|&i| values[i].is_finite()).collect();
    let (&first, &last) = (valid.first()?, valid.last()?);
    if valid.len() == values.len() {
        return Some(values.to_vec());
    }

    let mut out = values.to_vec();
    out[..first].fill(values[first]);
    out[last + 1..].fill(values[last]);
    for pair in valid.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        let span = (hi - lo) as f64;
        for (i, slot) in out.iter_mut().enumerate().take(hi).skip(lo + 1) {
            let t = (i - lo) as f64 / span;
            *slot = values[lo] + (values[hi] - values[lo]) * t;
        }
    }
    Some(out)
}

/// Centred window of half-width `window / 2`, truncated at the edges.
fn centred(len: usize, i: usize, window: usize) -> std::ops::Range<usize> {
    let half = window / 2;
    i.saturating_sub(half)..(i + half + 1).min(len)
}

fn moving_average(data: &[f64], window: usize) -> Vec<f64> {
    (0..data.len())
        .map(|i| {
            let span = &data[centred(data.len(), i, window)];
            span.iter().sum::<f64>() / span.len() as f64
        })
        .collect()
}

/// Exponentially weighted average with `alpha = 2 / (window + 1)`.
fn exponential(data: &[f64], window: usize) -> Vec<f64> {
    let alpha = 2.0 / (window as f64 + 1.0);
    let mut out = Vec::with_capacity(data.len());
    let mut prev = data[0];
    out.push(prev);
    for &x in &data[1..] {
        prev = alpha * x + (1.0 - alpha) * prev;
        out.push(prev);
    }
    out
}

/// Gaussian-weighted centred average with `sigma = window / 3`.
fn gaussian(data: &[f64], window: usize) -> Vec<f64> {
    let sigma = window as f64 / 3.0;
    let denom = 2.0 * sigma * sigma;
    (0..data.len())
        .map(|i| {
            let (weighted, total) = centred(data.len(), i, window).fold((0.0, 0.0), |(acc, w), j| {
                let d = j as f64 - i as f64;
                let weight = (-(d * d) / denom).exp();
                (acc + data[j] * weight, w + weight)
            });
            weighted / total
        })
        .collect()
}

/// Form schema for the `smooth` preprocessing step.
pub fn smoothing_info() -> serde_json::Value {
    let method = ParamSchema::select(
        SmoothingMethod::MovingAverage.as_str(),
        &SmoothingMethod::ALL.map(|m| m.as_str()),
        "Smoothing algorithm",
        "moving_average takes a centred mean, exponential an exponentially weighted \
         mean, gaussian a centred Gaussian-weighted mean.",
    );
    let window_size = ParamSchema::int(
        json!(5),
        "Window size",
        "Number of points in the smoothing window. Larger windows remove more noise \
         and blur short spikes.",
    )
    .range(1.0, 100.0);

    json!({
        "name": "Smoothing",
        "description": "Reduce noise in the series before detection.",
        "params": {
            "method": method,
            "window_size": window_size,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-9, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn moving_average_truncates_at_edges() {
        let out = smooth(&[1.0, 2.0, 3.0, 4.0, 5.0], "moving_average", 3).unwrap();
        assert_close(&out, &[1.5, 2.0, 3.0, 4.0, 4.5]);
    }

    #[test]
    fn exponential_is_seeded_with_first_value() {
        // window 3 -> alpha 0.5
        let out = smooth(&[2.0, 4.0, 4.0], "exponential", 3).unwrap();
        assert_close(&out, &[2.0, 3.0, 3.5]);
    }

    #[test]
    fn gaussian_preserves_constants() {
        let out = smooth(&[7.0; 6], "gaussian", 5).unwrap();
        assert_close(&out, &[7.0; 6]);
    }

    #[test]
    fn gaussian_weights_are_symmetric() {
        let out = smooth(&[0.0, 0.0, 3.0, 0.0, 0.0], "gaussian", 3).unwrap();
        assert!((out[1] - out[3]).abs() < 1e-12);
        assert!(out[2] < 3.0 && out[2] > out[1]);
    }

    #[test]
    fn invalid_entries_are_interpolated() {
        let out = smooth(&[f64::NAN, 1.0, f64::NAN, 3.0, f64::INFINITY], "moving_average", 1)
            .unwrap();
        assert_close(&out, &[1.0, 1.0, 2.0, 3.0, 3.0]);
    }

    #[test]
    fn all_invalid_smooths_to_zeros() {
        let out = smooth(&[f64::NAN, f64::NAN], "gaussian", 3).unwrap();
        assert_eq!(out, vec![0.0, 0.0]);
    }

    #[test]
    fn small_window_returns_input() {
        let raw = [1.0, f64::NAN, 3.0];
        let out = smooth(&raw, "no_such_method", 0).unwrap();
        assert_eq!(out[0], 1.0);
        assert!(out[1].is_nan());
        assert_eq!(out[2], 3.0);
    }

    #[test]
    fn unknown_method_is_rejected() {
        let err = smooth(&[1.0, 2.0], "median", 3).unwrap_err();
        assert_eq!(err, SmoothingError::UnsupportedMethod("median".into()));
    }

    #[test]
    fn info_lists_every_method() {
        let info = smoothing_info();
        let options = info["params"]["method"]["options"].as_array().unwrap();
        assert_eq!(options.len(), 3);
        assert_eq!(info["params"]["window_size"]["default"], 5);
    }
}
