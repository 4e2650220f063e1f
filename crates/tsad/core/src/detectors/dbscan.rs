//! One-dimensional DBSCAN. Noise points are the anomalies.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cleaner::CleanedSeries;
use crate::detector::Detector;
use crate::error::DetectionResult;
use crate::method::{require_non_negative, require_positive_count, MethodId};
use crate::numeric::{mean, std_dev};
use crate::stats::{DbscanDiagnostics, Detection, Diagnostics};

/// Density clustering over z-scored values.
///
/// Two points are neighbours iff their standardised distance is `<= eps`;
/// a point with at least `min_samples` neighbours (itself included) seeds or
/// extends a cluster. Points never absorbed into a cluster are anomalous.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dbscan {
    pub eps: f64,
    pub min_samples: usize,
}

impl Default for Dbscan {
    fn default() -> Self {
        Self {
            eps: 0.5,
            min_samples: 5,
        }
    }
}

impl Dbscan {
    fn diagnostics(&self, n_clusters: usize, noise_points: usize) -> Diagnostics {
        Diagnostics::Dbscan(DbscanDiagnostics {
            n_clusters,
            noise_points,
            eps: self.eps,
            min_samples: self.min_samples,
        })
    }
}

impl Detector for Dbscan {
    fn method(&self) -> MethodId {
        MethodId::Dbscan
    }

    fn validate(&self) -> DetectionResult<()> {
        require_non_negative("eps", self.eps)?;
        require_positive_count("min_samples", self.min_samples)
    }

    fn detect_cleaned(&self, series: &CleanedSeries) -> Detection {
        let n = series.valid_points();
        if n < self.min_samples {
            return Detection::empty(series, Some(self.diagnostics(0, 0)))
                .with_warning(format!(
                    "DBSCAN needs at least min_samples={} valid points, got {}",
                    self.min_samples, n
                ));
        }

        let points = standardize(&series.values);
        let labels = cluster(&points, self.eps, self.min_samples);

        let flags: Vec<bool> = labels.iter().map(Option::is_none).collect();
        let noise_points = flags.iter().filter(|f| **f).count();
        let n_clusters = labels
            .iter()
            .flatten()
            .max()
            .map_or(0, |max_label| max_label + 1);

        debug!(n, n_clusters, noise_points, eps = self.eps, "DBSCAN clustering finished");

        Detection::from_flags(series, &flags, self.diagnostics(n_clusters, noise_points))
    }
}

/// z-scores, or the raw values when the standard deviation is zero.
fn standardize(values: &[f64]) -> Vec<f64> {
    let m = mean(values);
    let s = std_dev(values, m);
    if s > 0.0 {
        values.iter().map(|v| (v - m) / s).collect()
    } else {
        values.to_vec()
    }
}

/// Neighbourhood queries over a value-sorted view of the points.
///
/// In one dimension the `eps`-neighbourhood of a point is a contiguous run
/// of the sorted order, found by two binary searches.
struct SortedIndex<'a> {
    points: &'a [f64],
    order: Vec<usize>,
    sorted: Vec<f64>,
}

impl<'a> SortedIndex<'a> {
    fn new(points: &'a [f64]) -> Self {
        let mut order: Vec<usize> = (0..points.len()).collect();
        order.sort_by(|&a, &b| points[a].total_cmp(&points[b]));
        let sorted = order.iter().map(|&i| points[i]).collect();
        Self {
            points,
            order,
            sorted,
        }
    }

    fn neighbors(&self, idx: usize, eps: f64) -> &[usize] {
        let center = self.points[idx];
        let lo = self.sorted.partition_point(|v| center - v > eps);
        let hi = self.sorted.partition_point(|v| v - center <= eps);
        &self.order[lo..hi.max(lo)]
    }
}

/// Cluster label per point; `None` is noise.
fn cluster(points: &[f64], eps: f64, min_samples: usize) -> Vec<Option<usize>> {
    let n = points.len();
    let index = SortedIndex::new(points);
    let mut labels: Vec<Option<usize>> = vec![None; n];
    let mut visited = vec![false; n];
    let mut queued = vec![false; n];
    let mut next_cluster = 0;
    let mut worklist: Vec<usize> = Vec::new();

    for seed in 0..n {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;

        let seed_neighbors = index.neighbors(seed, eps);
        if seed_neighbors.len() < min_samples {
            continue;
        }

        let cluster_id = next_cluster;
        next_cluster += 1;
        labels[seed] = Some(cluster_id);

        worklist.clear();
        enqueue(&mut worklist, &mut queued, seed_neighbors);

        let mut cursor = 0;
        while cursor < worklist.len() {
            let point = worklist[cursor];
            cursor += 1;

            if !visited[point] {
                visited[point] = true;
                let reach = index.neighbors(point, eps);
                if reach.len() >= min_samples {
                    enqueue(&mut worklist, &mut queued, reach);
                }
            }

            if labels[point].is_none() {
                labels[point] = Some(cluster_id);
            }
        }
    }

    labels
}

fn enqueue(worklist: &mut Vec<usize>, queued: &mut [bool], points: &[usize]) {
    for &p in points {
        if !queued[p] {
            queued[p] = true;
            worklist.push(p);
        }
    }
}
