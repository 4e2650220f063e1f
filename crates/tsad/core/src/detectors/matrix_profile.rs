//! Subsequence discord detection with a brute-force matrix profile.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cleaner::CleanedSeries;
use crate::detector::Detector;
use crate::error::DetectionResult;
use crate::method::{require_contamination, require_positive_count, MethodId};
use crate::numeric::{euclidean, mean, rank_threshold, std_dev};
use crate::stats::{Detection, Diagnostics, MatrixProfileDiagnostics};

/// Flags every position covered by a window whose nearest non-trivial
/// match is unusually far away.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixProfile {
    pub window_size: usize,
    pub contamination: f64,
}

impl Default for MatrixProfile {
    fn default() -> Self {
        Self {
            window_size: 10,
            contamination: 0.1,
        }
    }
}

impl Detector for MatrixProfile {
    fn method(&self) -> MethodId {
        MethodId::MatrixProfile
    }

    fn validate(&self) -> DetectionResult<()> {
        require_positive_count("window_size", self.window_size)?;
        require_contamination(self.contamination)
    }

    fn detect_cleaned(&self, series: &CleanedSeries) -> Detection {
        let n = series.valid_points();
        let m = self.window_size;
        if n < m.saturating_mul(2) {
            warn!(valid_points = n, window_size = m, "series too short for matrix profile");
            return Detection::empty(
                series,
                Some(Diagnostics::MatrixProfile(MatrixProfileDiagnostics {
                    window_size: m,
                    ..MatrixProfileDiagnostics::default()
                })),
            )
            .with_warning(format!(
                "matrix profile needs at least {} valid points (2 x window_size), got {}",
                m.saturating_mul(2),
                n
            ));
        }

        let profile = matrix_profile(&series.values, m);
        let mp_mean = mean(&profile);
        let mp_std = std_dev(&profile, mp_mean);
        let normalized: Vec<f64> = if mp_std > 0.0 {
            profile.iter().map(|d| (d - mp_mean) / mp_std).collect()
        } else {
            vec![0.0; profile.len()]
        };
        let threshold = rank_threshold(&normalized, self.contamination);

        let mut flags = vec![false; n];
        let mut anomalous_windows = 0;
        for (start, score) in normalized.iter().enumerate() {
            if *score > threshold {
                anomalous_windows += 1;
                for flag in &mut flags[start..(start + m).min(n)] {
                    *flag = true;
                }
            }
        }

        let max_mp_distance = profile.iter().copied().fold(0.0, f64::max);
        debug!(n, m, anomalous_windows, threshold, "matrix profile computed");

        Detection::from_flags(
            series,
            &flags,
            Diagnostics::MatrixProfile(MatrixProfileDiagnostics {
                window_size: m,
                threshold,
                mean_mp_distance: mp_mean,
                std_mp_distance: mp_std,
                max_mp_distance,
                anomalous_windows,
            }),
        )
    }
}

/// Distance from each length-`m` window to its nearest window starting at
/// least `m / 4` positions away.
fn matrix_profile(values: &[f64], m: usize) -> Vec<f64> {
    let windows: Vec<&[f64]> = values.windows(m).collect();
    let exclusion = m / 4;

    windows
        .iter()
        .enumerate()
        .map(|(i, query)| {
            windows
                .iter()
                .enumerate()
                .filter(|(j, _)| i.abs_diff(*j) >= exclusion)
                .map(|(_, candidate)| euclidean(query, candidate))
                .fold(f64::INFINITY, f64::min)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn periodic(n: usize) -> Vec<f64> {
        (0..n).map(|i| (i % 5) as f64).collect()
    }

    #[test]
    fn constant_series_has_no_discords() {
        let det = MatrixProfile::default().detect(&[4.2; 50]);
        assert_eq!(det.stats.anomaly_count, 0);
        assert!(det.anomalies.iter().all(|a| !a));
    }

    #[test]
    fn discord_marks_every_covering_window() {
        let mut data = periodic(60);
        data[30] = 20.0;
        let det = MatrixProfile {
            window_size: 5,
            contamination: 0.1,
        }
        .detect(&data);
        assert_eq!(det.anomaly_indices(), (26..=34).collect::<Vec<_>>());

        let Some(Diagnostics::MatrixProfile(d)) = &det.stats.diagnostics else {
            panic!("missing matrix profile diagnostics");
        };
        assert_eq!(d.anomalous_windows, 5);
        assert_eq!(d.window_size, 5);
        assert_eq!(det.stats.anomaly_count, 9);
    }

    #[test]
    fn short_series_is_graceful() {
        let det = MatrixProfile::default().detect(&periodic(19));
        assert_eq!(det.anomalies.len(), 19);
        assert_eq!(det.stats.anomaly_count, 0);
        assert!(det.stats.warning.is_some());
    }

    #[test]
    fn spans_never_cover_invalid_positions() {
        let mut data = periodic(60);
        data[30] = 20.0;
        data[32] = f64::NAN;
        let det = MatrixProfile {
            window_size: 5,
            contamination: 0.1,
        }
        .detect(&data);
        assert!(det.anomalies[30]);
        assert!(!det.anomalies[32]);
    }

    #[test]
    fn exclusion_zone_skips_trivial_matches() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        // m = 4 excludes the window itself; its nearest is the next window
        assert_eq!(matrix_profile(&values, 4), vec![2.0, 2.0, 2.0]);
        // m < 4 has an empty exclusion zone, so every window matches itself
        assert!(matrix_profile(&values, 3).iter().all(|d| *d == 0.0));
    }
}
