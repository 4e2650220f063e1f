//! Interquartile-range bound detector.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cleaner::CleanedSeries;
use crate::detector::Detector;
use crate::error::DetectionResult;
use crate::method::{require_non_negative, MethodId};
use crate::numeric::{percentile_sorted, sorted};
use crate::stats::{Detection, Diagnostics, IqrDiagnostics};

/// Flags values strictly outside `[q1 − m·iqr, q3 + m·iqr]`.
///
/// Quartiles are linear-interpolated percentiles of the cleaned values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Iqr {
    pub iqr_multiplier: f64,
}

impl Default for Iqr {
    fn default() -> Self {
        Self {
            iqr_multiplier: 1.5,
        }
    }
}

impl Detector for Iqr {
    fn method(&self) -> MethodId {
        MethodId::Iqr
    }

    fn validate(&self) -> DetectionResult<()> {
        require_non_negative("iqr_multiplier", self.iqr_multiplier)
    }

    fn detect_cleaned(&self, series: &CleanedSeries) -> Detection {
        if series.is_empty() {
            return Detection::empty(
                series,
                Some(Diagnostics::Iqr(IqrDiagnostics {
                    iqr_multiplier: self.iqr_multiplier,
                    ..IqrDiagnostics::default()
                })),
            );
        }

        let ordered = sorted(&series.values);
        let q1 = percentile_sorted(&ordered, 25.0);
        let q2 = percentile_sorted(&ordered, 50.0);
        let q3 = percentile_sorted(&ordered, 75.0);
        let iqr = q3 - q1;
        let lower_bound = q1 - self.iqr_multiplier * iqr;
        let upper_bound = q3 + self.iqr_multiplier * iqr;

        let flags: Vec<bool> = series
            .values
            .iter()
            .map(|v| *v < lower_bound || *v > upper_bound)
            .collect();

        debug!(q1, q3, iqr, lower_bound, upper_bound, "IQR bounds computed");

        Detection::from_flags(
            series,
            &flags,
            Diagnostics::Iqr(IqrDiagnostics {
                q1,
                q2,
                q3,
                iqr,
                lower_bound,
                upper_bound,
                iqr_multiplier: self.iqr_multiplier,
            }),
        )
    }
}
