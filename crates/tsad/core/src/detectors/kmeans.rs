//! K-Means over standardised `(position, value)` features.
//!
//! Centres are seeded with k-means++ and refined with Lloyd iterations. The
//! anomaly score of a point is its distance to the nearest final centre; the
//! top `contamination` share of scores is flagged.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cleaner::CleanedSeries;
use crate::detector::Detector;
use crate::error::DetectionResult;
use crate::method::{require_contamination, require_positive_count, MethodId};
use crate::numeric::{
    flag_above, position_value_features, rank_threshold, squared_distance, summarize,
};
use crate::stats::{Detection, Diagnostics, KMeansDiagnostics};

const RELATIVE_TOLERANCE: f64 = 1e-6;
const ABSOLUTE_TOLERANCE: f64 = 1e-8;

type Point = [f64; 2];

/// K-Means distance detector.
///
/// Without a `seed` the initial centres come from OS entropy, so membership
/// of points close to the threshold may differ between runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeans {
    pub n_clusters: usize,
    pub contamination: f64,
    pub max_iter: usize,
    pub seed: Option<u64>,
}

impl Default for KMeans {
    fn default() -> Self {
        Self {
            n_clusters: 3,
            contamination: 0.1,
            max_iter: 100,
            seed: None,
        }
    }
}

impl KMeans {
    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

impl Detector for KMeans {
    fn method(&self) -> MethodId {
        MethodId::KMeans
    }

    fn validate(&self) -> DetectionResult<()> {
        require_positive_count("n_clusters", self.n_clusters)?;
        require_positive_count("max_iter", self.max_iter)?;
        require_contamination(self.contamination)
    }

    fn detect_cleaned(&self, series: &CleanedSeries) -> Detection {
        let n = series.valid_points();
        let k = self.n_clusters.min(n);
        if k == 0 {
            return Detection::empty(
                series,
                Some(Diagnostics::KMeans(KMeansDiagnostics {
                    contamination: self.contamination,
                    ..KMeansDiagnostics::default()
                })),
            )
            .with_warning("too few valid points to cluster");
        }

        let features = position_value_features(&series.values);
        let mut rng = self.rng();
        let mut centers = seed_centers(&features, k, &mut rng);
        let mut labels = vec![0usize; n];
        let mut iterations = 0;

        for _ in 0..self.max_iter {
            iterations += 1;
            for (label, point) in labels.iter_mut().zip(&features) {
                *label = nearest(point, &centers).0;
            }
            let updated = recompute_centers(&features, &labels, &centers);
            if converged(&centers, &updated) {
                break;
            }
            centers = updated;
        }

        let distances: Vec<f64> = features
            .iter()
            .map(|p| nearest(p, &centers).1.sqrt())
            .collect();
        let threshold_distance = rank_threshold(&distances, self.contamination);
        let flags = flag_above(&distances, threshold_distance);

        let mut cluster_sizes = vec![0usize; k];
        for label in &labels {
            cluster_sizes[*label] += 1;
        }

        let summary = summarize(&distances);
        debug!(n, k, iterations, threshold_distance, "k-means converged");

        Detection::from_flags(
            series,
            &flags,
            Diagnostics::KMeans(KMeansDiagnostics {
                n_clusters: k,
                contamination: self.contamination,
                iterations,
                threshold_distance,
                mean_distance: summary.mean,
                max_distance: summary.max,
                min_distance: summary.min,
                cluster_sizes,
            }),
        )
    }
}

/// k-means++ seeding.
fn seed_centers(features: &[Point], k: usize, rng: &mut StdRng) -> Vec<Point> {
    let n = features.len();
    let mut centers = Vec::with_capacity(k);
    centers.push(features[rng.gen_range(0..n)]);

    while centers.len() < k {
        let weights: Vec<f64> = features.iter().map(|p| nearest(p, &centers).1).collect();
        let total: f64 = weights.iter().sum();

        let next = if total > 0.0 {
            let draw = rng.gen::<f64>() * total;
            let mut cumulative = 0.0;
            weights
                .iter()
                .position(|w| {
                    cumulative += w;
                    draw < cumulative
                })
                .unwrap_or(n - 1)
        } else {
            // every point coincides with a centre
            rng.gen_range(0..n)
        };
        centers.push(features[next]);
    }

    centers
}

/// Index of the closest centre and the squared distance to it.
fn nearest(point: &Point, centers: &[Point]) -> (usize, f64) {
    centers
        .iter()
        .enumerate()
        .map(|(i, c)| (i, squared_distance(point, c)))
        .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
}

/// Mean of each cluster; an empty cluster keeps its previous centre.
fn recompute_centers(features: &[Point], labels: &[usize], previous: &[Point]) -> Vec<Point> {
    let mut sums = vec![[0.0; 2]; previous.len()];
    let mut counts = vec![0usize; previous.len()];
    for (point, &label) in features.iter().zip(labels) {
        sums[label][0] += point[0];
        sums[label][1] += point[1];
        counts[label] += 1;
    }

    sums.iter()
        .zip(&counts)
        .zip(previous)
        .map(|((sum, &count), prev)| {
            if count == 0 {
                *prev
            } else {
                [sum[0] / count as f64, sum[1] / count as f64]
            }
        })
        .collect()
}

fn converged(old: &[Point], new: &[Point]) -> bool {
    old.iter().zip(new).all(|(a, b)| {
        a.iter()
            .zip(b)
            .all(|(x, y)| (x - y).abs() <= ABSOLUTE_TOLERANCE + RELATIVE_TOLERANCE * y.abs())
    })
}
