//! Local-context normality scoring.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cleaner::CleanedSeries;
use crate::detector::Detector;
use crate::error::DetectionResult;
use crate::method::{require_contamination, require_finite, require_positive_count, MethodId};
use crate::numeric::{flag_above, mean, median, rank_threshold, std_dev, summarize};
use crate::stats::{Detection, Diagnostics, NormADiagnostics};

/// Score assigned to a point that differs from a perfectly flat context.
const FLAT_CONTEXT_SCORE: f64 = 10.0;
const FLAT_CONTEXT_TOLERANCE: f64 = 1e-10;

/// Scores each point against the `window_size / 2` neighbours on either side
/// of it, averaging a local z-score with a local MAD score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormA {
    pub window_size: usize,
    pub contamination: f64,
    /// Multiplier applied to every score.
    pub sensitivity: f64,
}

impl Default for NormA {
    fn default() -> Self {
        Self {
            window_size: 10,
            contamination: 0.1,
            sensitivity: 1.0,
        }
    }
}

impl NormA {
    fn score(&self, x: f64, context: &[f64]) -> f64 {
        if context.is_empty() {
            return 0.0;
        }

        let local_mean = mean(context);
        let local_std = std_dev(context, local_mean);
        if local_std > 0.0 {
            let z_score = (x - local_mean).abs() / local_std;
            let local_median = median(context);
            let deviations: Vec<f64> = context.iter().map(|v| (v - local_median).abs()).collect();
            let mad = median(&deviations);
            let mad_score = if mad > 0.0 {
                (x - local_median).abs() / mad
            } else {
                0.0
            };
            (z_score + mad_score) / 2.0 * self.sensitivity
        } else if (x - local_mean).abs() > FLAT_CONTEXT_TOLERANCE {
            FLAT_CONTEXT_SCORE * self.sensitivity
        } else {
            0.0
        }
    }

    fn scores(&self, values: &[f64]) -> Vec<f64> {
        let n = values.len();
        let half = self.window_size / 2;
        let mut context = Vec::with_capacity(2 * half);
        (0..n)
            .map(|i| {
                let start = i.saturating_sub(half);
                let end = (i + half + 1).min(n);
                context.clear();
                context.extend_from_slice(&values[start..i]);
                context.extend_from_slice(&values[i + 1..end]);
                self.score(values[i], &context)
            })
            .collect()
    }
}

impl Detector for NormA {
    fn method(&self) -> MethodId {
        MethodId::NormA
    }

    fn validate(&self) -> DetectionResult<()> {
        require_positive_count("window_size", self.window_size)?;
        require_contamination(self.contamination)?;
        require_finite("sensitivity", self.sensitivity)
    }

    fn detect_cleaned(&self, series: &CleanedSeries) -> Detection {
        let n = series.valid_points();
        if n < self.window_size {
            warn!(valid_points = n, window_size = self.window_size, "series too short for NormA");
            return Detection::empty(
                series,
                Some(Diagnostics::NormA(NormADiagnostics {
                    window_size: self.window_size,
                    sensitivity: self.sensitivity,
                    ..NormADiagnostics::default()
                })),
            )
            .with_warning(format!(
                "NormA needs at least window_size={} valid points, got {}",
                self.window_size, n
            ));
        }

        let scores = self.scores(&series.values);
        let threshold = rank_threshold(&scores, self.contamination);
        let flags = flag_above(&scores, threshold);
        let summary = summarize(&scores);

        debug!(n, window_size = self.window_size, threshold, "NormA scores computed");

        Detection::from_flags(
            series,
            &flags,
            Diagnostics::NormA(NormADiagnostics {
                window_size: self.window_size,
                threshold,
                mean_score: summary.mean,
                max_score: summary.max,
                min_score: summary.min,
                sensitivity: self.sensitivity,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_spike_is_flagged() {
        let mut data: Vec<f64> = (0..50).map(|i| (i as f64 * 0.3).sin()).collect();
        data[25] = 6.0;
        let det = NormA {
            window_size: 10,
            contamination: 0.03,
            sensitivity: 1.0,
        }
        .detect(&data);
        assert_eq!(det.anomaly_indices(), vec![25]);
    }

    #[test]
    fn flat_context_uses_fixed_score() {
        let norma = NormA {
            sensitivity: 2.0,
            ..NormA::default()
        };
        assert_eq!(norma.score(5.0, &[1.0, 1.0, 1.0]), 20.0);
        assert_eq!(norma.score(1.0, &[1.0, 1.0, 1.0]), 0.0);
    }

    #[test]
    fn zero_mad_drops_mad_term() {
        // context std > 0 but more than half the context equals its median
        let score = NormA::default().score(4.0, &[1.0, 1.0, 1.0, 3.0]);
        let z = (4.0 - 1.5) / 0.75_f64.sqrt();
        assert!((score - z / 2.0).abs() < 1e-12);
    }

    #[test]
    fn context_excludes_the_point_itself() {
        let norma = NormA {
            window_size: 2,
            ..NormA::default()
        };
        // each interior point sees only its two direct neighbours
        let scores = norma.scores(&[0.0, 0.0, 9.0, 0.0, 0.0]);
        assert_eq!(scores[2], FLAT_CONTEXT_SCORE);
    }

    #[test]
    fn window_one_has_no_context() {
        let norma = NormA {
            window_size: 1,
            ..NormA::default()
        };
        assert!(norma.scores(&[1.0, 50.0, 1.0]).iter().all(|s| *s == 0.0));
    }

    #[test]
    fn short_series_is_graceful() {
        let det = NormA::default().detect(&[1.0, 2.0, f64::NAN]);
        assert_eq!(det.anomalies, vec![false; 3]);
        assert!(det.stats.warning.is_some());
    }
}
