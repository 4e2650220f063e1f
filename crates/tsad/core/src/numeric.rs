//! Numeric helpers shared by the detectors.
//!
//! Conventions: standard deviation is the population form, percentiles use
//! linear interpolation at position `p·(n−1)`, and rank thresholds pick the
//! sorted score at `floor((1−contamination)·n)`.

use std::cmp::Ordering;

/// Added to per-dimension standard deviations before dividing.
pub const FEATURE_STD_EPSILON: f64 = 1e-10;

pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Population standard deviation around a precomputed mean.
pub fn std_dev(xs: &[f64], mean: f64) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / xs.len() as f64;
    var.sqrt()
}

pub fn sort_floats(xs: &mut [f64]) {
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
}

pub fn sorted(xs: &[f64]) -> Vec<f64> {
    let mut out = xs.to_vec();
    sort_floats(&mut out);
    out
}

/// Linear-interpolated percentile of an ascending sample; `p` is in `[0, 100]`.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let pos = (p / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

pub fn median(xs: &[f64]) -> f64 {
    percentile_sorted(&sorted(xs), 50.0)
}

/// Score at rank `floor((1 − contamination)·n)` of the ascending scores,
/// or the maximum when that rank falls past the end.
pub fn rank_threshold(scores: &[f64], contamination: f64) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let ordered = sorted(scores);
    let idx = ((1.0 - contamination) * ordered.len() as f64).floor() as usize;
    match ordered.get(idx) {
        Some(v) => *v,
        None => ordered[ordered.len() - 1],
    }
}

/// Flag scores strictly greater than the threshold.
pub fn flag_above(scores: &[f64], threshold: f64) -> Vec<bool> {
    scores.iter().map(|s| *s > threshold).collect()
}

/// Mean, minimum and maximum of a score vector.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScoreSummary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

pub fn summarize(scores: &[f64]) -> ScoreSummary {
    if scores.is_empty() {
        return ScoreSummary::default();
    }
    ScoreSummary {
        mean: mean(scores),
        min: scores.iter().copied().fold(f64::INFINITY, f64::min),
        max: scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }
}

/// `(position, value)` pairs standardised per dimension.
pub fn position_value_features(values: &[f64]) -> Vec<[f64; 2]> {
    let positions: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
    let pos_mean = mean(&positions);
    let pos_std = std_dev(&positions, pos_mean) + FEATURE_STD_EPSILON;
    let val_mean = mean(values);
    let val_std = std_dev(values, val_mean) + FEATURE_STD_EPSILON;

    positions
        .iter()
        .zip(values)
        .map(|(p, v)| [(p - pos_mean) / pos_std, (v - val_mean) / val_std])
        .collect()
}

pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    squared_distance(a, b).sqrt()
}
