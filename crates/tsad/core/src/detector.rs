//! The shared detector contract.

use crate::cleaner::{clean, CleanedSeries};
use crate::error::DetectionResult;
use crate::method::MethodId;
use crate::stats::Detection;

/// A detection algorithm together with its immutable parameters.
///
/// Implementations are pure: the same cleaned series and parameters always
/// yield the same detection (K-Means only when seeded). Input below the
/// algorithm's structural minimum produces an all-`false` mask rather than
/// an error.
pub trait Detector {
    /// Wire identifier of this algorithm.
    fn method(&self) -> MethodId;

    /// Reject parameter values for which the algorithm is undefined.
    fn validate(&self) -> DetectionResult<()>;

    /// Run the algorithm on an already-cleaned series.
    fn detect_cleaned(&self, series: &CleanedSeries) -> Detection;

    /// Clean a raw series and run the algorithm on it.
    fn detect(&self, raw: &[f64]) -> Detection {
        let series = clean(raw);
        self.detect_cleaned(&series)
    }
}
