//! k-nearest-neighbour distance detector.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cleaner::CleanedSeries;
use crate::detector::Detector;
use crate::error::DetectionResult;
use crate::method::{require_contamination, require_positive_count, MethodId};
use crate::numeric::{
    euclidean, flag_above, mean, position_value_features, rank_threshold, sort_floats, summarize,
};
use crate::stats::{Detection, Diagnostics, KnnDiagnostics};

/// Scores each point by its mean distance to the `n_neighbors` closest other
/// points in standardised `(position, value)` space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Knn {
    pub n_neighbors: usize,
    pub contamination: f64,
}

impl Default for Knn {
    fn default() -> Self {
        Self {
            n_neighbors: 5,
            contamination: 0.1,
        }
    }
}

impl Detector for Knn {
    fn method(&self) -> MethodId {
        MethodId::Knn
    }

    fn validate(&self) -> DetectionResult<()> {
        require_positive_count("n_neighbors", self.n_neighbors)?;
        require_contamination(self.contamination)
    }

    fn detect_cleaned(&self, series: &CleanedSeries) -> Detection {
        let n = series.valid_points();
        let k = self.n_neighbors.min(n.saturating_sub(1));
        if k == 0 {
            warn!(valid_points = n, "too few points for KNN detection");
            return Detection::empty(
                series,
                Some(Diagnostics::Knn(KnnDiagnostics {
                    n_neighbors: self.n_neighbors,
                    contamination: self.contamination,
                    ..KnnDiagnostics::default()
                })),
            )
            .with_warning("too few valid points for KNN detection");
        }

        let scores = knn_scores(&position_value_features(&series.values), k);
        let threshold_distance = rank_threshold(&scores, self.contamination);
        let flags = flag_above(&scores, threshold_distance);
        let summary = summarize(&scores);

        debug!(n, k, threshold_distance, "KNN scores computed");

        Detection::from_flags(
            series,
            &flags,
            Diagnostics::Knn(KnnDiagnostics {
                n_neighbors: k,
                contamination: self.contamination,
                threshold_distance,
                mean_distance: summary.mean,
                max_distance: summary.max,
                min_distance: summary.min,
            }),
        )
    }
}

/// Mean distance from each point to its `k` nearest other points.
fn knn_scores(features: &[[f64; 2]], k: usize) -> Vec<f64> {
    let mut row = Vec::with_capacity(features.len());
    features
        .iter()
        .enumerate()
        .map(|(i, p)| {
            row.clear();
            row.extend(
                features
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, q)| euclidean(p, q)),
            );
            sort_floats(&mut row);
            mean(&row[..k])
        })
        .collect()
}
