//! Mean ± k·σ bound detector.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cleaner::CleanedSeries;
use crate::detector::Detector;
use crate::error::DetectionResult;
use crate::method::{require_non_negative, MethodId};
use crate::numeric::{mean, std_dev};
use crate::stats::{Detection, Diagnostics, SigmaDiagnostics};

/// Flags values strictly outside `mean ± sigma_threshold · std`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreeSigma {
    pub sigma_threshold: f64,
}

impl Default for ThreeSigma {
    fn default() -> Self {
        Self {
            sigma_threshold: 3.0,
        }
    }
}

impl Detector for ThreeSigma {
    fn method(&self) -> MethodId {
        MethodId::ThreeSigma
    }

    fn validate(&self) -> DetectionResult<()> {
        require_non_negative("sigma_threshold", self.sigma_threshold)
    }

    fn detect_cleaned(&self, series: &CleanedSeries) -> Detection {
        if series.is_empty() {
            return Detection::empty(
                series,
                Some(Diagnostics::ThreeSigma(SigmaDiagnostics {
                    sigma_threshold: self.sigma_threshold,
                    ..SigmaDiagnostics::default()
                })),
            );
        }

        let values = &series.values;
        let mean = mean(values);
        let std = std_dev(values, mean);
        let upper_bound = mean + self.sigma_threshold * std;
        let lower_bound = mean - self.sigma_threshold * std;

        let flags: Vec<bool> = values
            .iter()
            .map(|v| *v > upper_bound || *v < lower_bound)
            .collect();

        debug!(mean, std, upper_bound, lower_bound, "3-sigma bounds computed");

        Detection::from_flags(
            series,
            &flags,
            Diagnostics::ThreeSigma(SigmaDiagnostics {
                mean,
                std,
                upper_bound,
                lower_bound,
                sigma_threshold: self.sigma_threshold,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DetectionError;

    fn diagnostics(det: &Detection) -> SigmaDiagnostics {
        match &det.stats.diagnostics {
            Some(Diagnostics::ThreeSigma(d)) => d.clone(),
            other => panic!("unexpected diagnostics {other:?}"),
        }
    }

    #[test]
    fn skewed_small_sample_has_no_outlier() {
        let det = ThreeSigma::default().detect(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]);
        let d = diagnostics(&det);

        assert!((d.mean - 115.0 / 6.0).abs() < 1e-9);
        assert!((d.std - 36.1728).abs() < 1e-3);
        assert!(d.upper_bound > 100.0);
        assert!(d.lower_bound < 1.0);
        assert!(det.anomalies.iter().all(|a| !*a));
        assert_eq!(det.stats.anomaly_count, 0);
    }

    #[test]
    fn tight_threshold_flags_spike() {
        let det = ThreeSigma {
            sigma_threshold: 1.0,
        }
        .detect(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]);
        assert_eq!(det.anomaly_indices(), vec![5]);
    }

    #[test]
    fn bounds_are_strict() {
        // mean 0, std 1: values at exactly ±1 are on the bound
        let det = ThreeSigma {
            sigma_threshold: 1.0,
        }
        .detect(&[-1.0, 1.0, -1.0, 1.0]);
        assert_eq!(det.stats.anomaly_count, 0);
    }

    #[test]
    fn invalid_positions_never_flagged() {
        let det = ThreeSigma {
            sigma_threshold: 1.0,
        }
        .detect(&[1.0, f64::NAN, 10.0, f64::INFINITY, 1.0, 1.0, 1.0, 1.0]);
        assert_eq!(
            det.anomalies,
            vec![false, false, true, false, false, false, false, false]
        );
        assert_eq!(det.stats.invalid_points, 2);
    }

    #[test]
    fn all_invalid_gives_zero_bounds() {
        let det = ThreeSigma::default().detect(&[f64::NAN, f64::NAN]);
        let d = diagnostics(&det);
        assert_eq!(d.mean, 0.0);
        assert_eq!(d.upper_bound, 0.0);
        assert_eq!(det.anomalies, vec![false, false]);
        assert_eq!(det.stats.valid_points, 0);
    }

    #[test]
    fn rejects_non_finite_threshold() {
        let d = ThreeSigma {
            sigma_threshold: f64::NAN,
        };
        assert!(d.validate().is_err());
    }

    #[test]
    fn rejects_negative_threshold() {
        let d = ThreeSigma {
            sigma_threshold: -1.0,
        };
        assert!(matches!(
            d.validate(),
            Err(DetectionError::InvalidParameter { ref name, .. }) if name == "sigma_threshold"
        ));
        let zero = ThreeSigma {
            sigma_threshold: 0.0,
        };
        assert!(zero.validate().is_ok());
    }
}
