//! Detection output: the full-length anomaly mask plus its statistics bundle.

use serde::Serialize;

use crate::cleaner::{CleanedSeries, DataQuality};

/// Statistics returned with every detection.
///
/// The universal counters are always present; algorithm diagnostics are
/// flattened into the same JSON object.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DetectionStats {
    pub total_points: usize,
    pub valid_points: usize,
    pub invalid_points: usize,
    pub anomaly_count: usize,
    /// `anomaly_count / valid_points`, 0 when nothing is valid.
    pub anomaly_ratio: f64,
    #[serde(flatten)]
    pub diagnostics: Option<Diagnostics>,
    /// Set when the detector could not run its algorithm on this input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_quality: Option<DataQuality>,
}

/// Algorithm-specific diagnostics.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Diagnostics {
    ThreeSigma(SigmaDiagnostics),
    Iqr(IqrDiagnostics),
    Dbscan(DbscanDiagnostics),
    KMeans(KMeansDiagnostics),
    Knn(KnnDiagnostics),
    Lof(LofDiagnostics),
    MatrixProfile(MatrixProfileDiagnostics),
    NormA(NormADiagnostics),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SigmaDiagnostics {
    pub mean: f64,
    pub std: f64,
    pub upper_bound: f64,
    pub lower_bound: f64,
    pub sigma_threshold: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct IqrDiagnostics {
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub iqr_multiplier: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DbscanDiagnostics {
    pub n_clusters: usize,
    pub noise_points: usize,
    pub eps: f64,
    pub min_samples: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct KMeansDiagnostics {
    /// Effective number of clusters after clamping to the point count.
    pub n_clusters: usize,
    pub contamination: f64,
    pub iterations: usize,
    pub threshold_distance: f64,
    pub mean_distance: f64,
    pub max_distance: f64,
    pub min_distance: f64,
    pub cluster_sizes: Vec<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct KnnDiagnostics {
    /// Effective k after clamping to `valid_points - 1`.
    pub n_neighbors: usize,
    pub contamination: f64,
    pub threshold_distance: f64,
    pub mean_distance: f64,
    pub max_distance: f64,
    pub min_distance: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LofDiagnostics {
    pub n_neighbors: usize,
    pub contamination: f64,
    pub threshold_lof: f64,
    pub mean_lof: f64,
    pub max_lof: f64,
    pub min_lof: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MatrixProfileDiagnostics {
    pub window_size: usize,
    pub threshold: f64,
    pub mean_mp_distance: f64,
    pub std_mp_distance: f64,
    pub max_mp_distance: f64,
    pub anomalous_windows: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct NormADiagnostics {
    pub window_size: usize,
    pub threshold: f64,
    pub mean_score: f64,
    pub max_score: f64,
    pub min_score: f64,
    pub sensitivity: f64,
}

/// Anomaly mask aligned to the raw series, plus statistics.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Detection {
    pub anomalies: Vec<bool>,
    pub stats: DetectionStats,
}

impl Detection {
    /// Build a detection from flags computed in cleaned coordinates.
    pub fn from_flags(series: &CleanedSeries, flags: &[bool], diagnostics: Diagnostics) -> Self {
        let anomalies = series.scatter(flags);
        let anomaly_count = flags.iter().filter(|f| **f).count();
        Self {
            anomalies,
            stats: DetectionStats {
                anomaly_count,
                anomaly_ratio: ratio(anomaly_count, series.valid_points()),
                diagnostics: Some(diagnostics),
                ..base_stats(series)
            },
        }
    }

    /// All-`false` result for input below an algorithm's structural minimum.
    pub fn empty(series: &CleanedSeries, diagnostics: Option<Diagnostics>) -> Self {
        Self {
            anomalies: vec![false; series.total_points()],
            stats: DetectionStats {
                diagnostics,
                ..base_stats(series)
            },
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.stats.warning = Some(warning.into());
        self
    }

    pub fn with_quality(mut self, quality: DataQuality) -> Self {
        self.stats.data_quality = Some(quality);
        self
    }

    /// Original positions flagged as anomalous, ascending.
    pub fn anomaly_indices(&self) -> Vec<usize> {
        self.anomalies
            .iter()
            .enumerate()
            .filter_map(|(i, a)| a.then_some(i))
            .collect()
    }
}

fn base_stats(series: &CleanedSeries) -> DetectionStats {
    DetectionStats {
        total_points: series.total_points(),
        valid_points: series.valid_points(),
        invalid_points: series.invalid_points(),
        ..DetectionStats::default()
    }
}

fn ratio(count: usize, of: usize) -> f64 {
    if of == 0 {
        0.0
    } else {
        count as f64 / of as f64
    }
}
