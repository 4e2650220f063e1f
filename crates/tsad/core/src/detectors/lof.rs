//! Local Outlier Factor over standardised `(position, value)` features.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cleaner::CleanedSeries;
use crate::detector::Detector;
use crate::error::DetectionResult;
use crate::method::{require_contamination, require_positive_count, MethodId};
use crate::numeric::{euclidean, flag_above, position_value_features, rank_threshold, summarize};
use crate::stats::{Detection, Diagnostics, LofDiagnostics};

/// Added to densities before dividing.
const DENSITY_EPSILON: f64 = 1e-10;

/// Flags points whose local reachability density is low relative to that of
/// their neighbours. A factor near 1 means comparable density.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lof {
    pub n_neighbors: usize,
    pub contamination: f64,
}

impl Default for Lof {
    fn default() -> Self {
        Self {
            n_neighbors: 20,
            contamination: 0.1,
        }
    }
}

impl Detector for Lof {
    fn method(&self) -> MethodId {
        MethodId::Lof
    }

    fn validate(&self) -> DetectionResult<()> {
        require_positive_count("n_neighbors", self.n_neighbors)?;
        require_contamination(self.contamination)
    }

    fn detect_cleaned(&self, series: &CleanedSeries) -> Detection {
        let n = series.valid_points();
        let k = self.n_neighbors.min(n.saturating_sub(1));
        if k == 0 {
            warn!(valid_points = n, "too few points for LOF detection");
            return Detection::empty(
                series,
                Some(Diagnostics::Lof(LofDiagnostics {
                    n_neighbors: self.n_neighbors,
                    contamination: self.contamination,
                    ..LofDiagnostics::default()
                })),
            )
            .with_warning("too few valid points for LOF detection");
        }

        let scores = Neighborhoods::build(&position_value_features(&series.values), k).lof();
        let threshold_lof = rank_threshold(&scores, self.contamination);
        let flags = flag_above(&scores, threshold_lof);
        let summary = summarize(&scores);

        debug!(n, k, threshold_lof, max_lof = summary.max, "LOF scores computed");

        Detection::from_flags(
            series,
            &flags,
            Diagnostics::Lof(LofDiagnostics {
                n_neighbors: k,
                contamination: self.contamination,
                threshold_lof,
                mean_lof: summary.mean,
                max_lof: summary.max,
                min_lof: summary.min,
            }),
        )
    }
}

/// Pairwise distances plus each point's k nearest neighbours, k-distance
/// and local reachability density, each computed once.
///
/// A point is its own nearest neighbour at distance 0, so the neighbourhood
/// holds the point and its `k - 1` closest others. Equal distances rank by
/// index.
struct Neighborhoods {
    n: usize,
    distances: Vec<f64>,
    neighbors: Vec<Vec<usize>>,
    k_distance: Vec<f64>,
    lrd: Vec<f64>,
}

impl Neighborhoods {
    fn build(features: &[[f64; 2]], k: usize) -> Self {
        let n = features.len();
        let mut distances = vec![0.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = euclidean(&features[i], &features[j]);
                distances[i * n + j] = d;
                distances[j * n + i] = d;
            }
        }

        let neighbors: Vec<Vec<usize>> = (0..n)
            .map(|i| {
                let row = &distances[i * n..(i + 1) * n];
                let mut ranked: Vec<usize> = (0..n).collect();
                ranked.sort_by(|&a, &b| {
                    row[a]
                        .total_cmp(&row[b])
                        .then((a != i).cmp(&(b != i)))
                        .then(a.cmp(&b))
                });
                ranked.truncate(k);
                ranked
            })
            .collect();

        let k_distance: Vec<f64> = neighbors
            .iter()
            .enumerate()
            .map(|(i, nb)| nb.last().map_or(0.0, |&j| distances[i * n + j]))
            .collect();

        let mut this = Self {
            n,
            distances,
            neighbors,
            k_distance,
            lrd: Vec::new(),
        };
        this.lrd = (0..n).map(|i| this.local_reachability_density(i)).collect();
        this
    }

    fn distance(&self, i: usize, j: usize) -> f64 {
        self.distances[i * self.n + j]
    }

    fn reachability(&self, i: usize, j: usize) -> f64 {
        self.distance(i, j).max(self.k_distance[j])
    }

    fn local_reachability_density(&self, i: usize) -> f64 {
        let nb = &self.neighbors[i];
        let total: f64 = nb.iter().map(|&j| self.reachability(i, j)).sum();
        1.0 / (total / nb.len() as f64 + DENSITY_EPSILON)
    }

    fn lof(&self) -> Vec<f64> {
        (0..self.n)
            .map(|i| {
                let nb = &self.neighbors[i];
                let neighbor_lrd = nb.iter().map(|&j| self.lrd[j]).sum::<f64>() / nb.len() as f64;
                neighbor_lrd / (self.lrd[i] + DENSITY_EPSILON)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isolated_spike_has_largest_factor() {
        let mut data: Vec<f64> = (0..41).map(|i| (i % 4) as f64 * 0.1).collect();
        data[20] = 10.0;
        let det = Lof {
            n_neighbors: 5,
            contamination: 0.03,
        }
        .detect(&data);
        assert_eq!(det.anomaly_indices(), vec![20]);

        let Some(Diagnostics::Lof(d)) = &det.stats.diagnostics else {
            panic!("missing LOF diagnostics");
        };
        assert!(d.max_lof > 10.0);
    }

    #[test]
    fn evenly_spaced_points_score_near_one() {
        let features = position_value_features(&[0.0; 30]);
        let scores = Neighborhoods::build(&features, 4).lof();
        assert!(scores.iter().all(|s| (0.8..1.3).contains(s)), "{scores:?}");
    }

    #[test]
    fn neighbourhood_starts_with_self_and_breaks_ties_by_index() {
        let features = [[0.0, 0.0], [1.0, 0.0], [-1.0, 0.0], [5.0, 0.0]];
        let hood = Neighborhoods::build(&features, 3);
        assert_eq!(hood.neighbors[0], vec![0, 1, 2]);
        assert_eq!(hood.neighbors[2], vec![2, 0, 1]);
        assert_eq!(hood.neighbors[3], vec![3, 1, 0]);
        assert_eq!(hood.k_distance, vec![1.0, 2.0, 2.0, 5.0]);
    }

    #[test]
    fn self_ranks_ahead_of_coincident_points() {
        let features = [[0.0, 0.0], [0.0, 0.0], [3.0, 0.0]];
        let hood = Neighborhoods::build(&features, 2);
        assert_eq!(hood.neighbors[0], vec![0, 1]);
        assert_eq!(hood.neighbors[1], vec![1, 0]);
        assert_eq!(hood.k_distance[1], 0.0);
    }

    #[test]
    fn flagged_count_tracks_contamination() {
        let data: Vec<f64> = (0..200).map(|i| ((i * i * 37 + i * 11) % 101) as f64).collect();
        let det = Lof {
            n_neighbors: 10,
            contamination: 0.1,
        }
        .detect(&data);
        // round(0.1 * 200) = 20
        assert!(det.stats.anomaly_count.abs_diff(20) <= 1, "{}", det.stats.anomaly_count);
    }

    #[test]
    fn too_few_points_is_graceful() {
        let det = Lof::default().detect(&[3.0]);
        assert_eq!(det.anomalies, vec![false]);
        assert!(det.stats.warning.is_some());
    }

    #[test]
    fn duplicate_points_stay_finite() {
        let det = Lof {
            n_neighbors: 3,
            contamination: 0.2,
        }
        .detect(&[1.0; 12]);
        let Some(Diagnostics::Lof(d)) = &det.stats.diagnostics else {
            panic!("missing LOF diagnostics");
        };
        assert!(d.max_lof.is_finite());
        assert!(d.min_lof.is_finite());
    }
}
