//! Property tests: every detector honours the shared contract.
//!
//! Masks are aligned to the raw series, invalid positions are never flagged,
//! and the bound-based detectors are monotone in their strictness knob.

use proptest::prelude::*;
use tsad_core::{
    clean, Dbscan, DetectionMethod, Detector, Iqr, KMeans, Knn, Lof, MatrixProfile, NormA,
    ThreeSigma,
};

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

/// A raw entry: mostly finite, sometimes NaN or an infinity.
fn arb_entry() -> impl Strategy<Value = f64> {
    prop_oneof![
        12 => -100.0..100.0f64,
        1 => Just(f64::NAN),
        1 => Just(f64::INFINITY),
        1 => Just(f64::NEG_INFINITY),
    ]
}

fn arb_series(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(arb_entry(), 0..max_len)
}

fn arb_contamination() -> impl Strategy<Value = f64> {
    0.0..0.5f64
}

/// Any detector with plausible parameters. K-Means is always seeded.
fn arb_method() -> impl Strategy<Value = DetectionMethod> {
    prop_oneof![
        (0.5..5.0f64).prop_map(|sigma_threshold| {
            DetectionMethod::ThreeSigma(ThreeSigma { sigma_threshold })
        }),
        (0.5..5.0f64).prop_map(|iqr_multiplier| DetectionMethod::Iqr(Iqr { iqr_multiplier })),
        (0.05..3.0f64, 1usize..8).prop_map(|(eps, min_samples)| {
            DetectionMethod::Dbscan(Dbscan { eps, min_samples })
        }),
        (1usize..6, arb_contamination(), any::<u64>()).prop_map(
            |(n_clusters, contamination, seed)| {
                DetectionMethod::KMeans(KMeans {
                    n_clusters,
                    contamination,
                    max_iter: 50,
                    seed: Some(seed),
                })
            }
        ),
        (1usize..10, arb_contamination()).prop_map(|(n_neighbors, contamination)| {
            DetectionMethod::Knn(Knn {
                n_neighbors,
                contamination,
            })
        }),
        (1usize..10, arb_contamination()).prop_map(|(n_neighbors, contamination)| {
            DetectionMethod::Lof(Lof {
                n_neighbors,
                contamination,
            })
        }),
        (1usize..12, arb_contamination()).prop_map(|(window_size, contamination)| {
            DetectionMethod::MatrixProfile(MatrixProfile {
                window_size,
                contamination,
            })
        }),
        (1usize..12, arb_contamination(), 0.1..3.0f64).prop_map(
            |(window_size, contamination, sensitivity)| {
                DetectionMethod::NormA(NormA {
                    window_size,
                    contamination,
                    sensitivity,
                })
            }
        ),
    ]
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// The mask always has one entry per raw value.
    #[test]
    fn mask_matches_input_length(raw in arb_series(60), method in arb_method()) {
        prop_assert!(method.validate().is_ok());
        let det = method.detect(&raw);
        prop_assert_eq!(det.anomalies.len(), raw.len());
        prop_assert_eq!(det.stats.total_points, raw.len());
    }

    /// Invalid positions are never flagged, whatever the algorithm.
    #[test]
    fn invalid_positions_never_flagged(raw in arb_series(60), method in arb_method()) {
        let det = method.detect(&raw);
        for (value, flagged) in raw.iter().zip(&det.anomalies) {
            if !value.is_finite() {
                prop_assert!(!*flagged, "{} flagged by {}", value, method.method());
            }
        }
    }

    /// The counters agree with the mask.
    #[test]
    fn stats_agree_with_mask(raw in arb_series(60), method in arb_method()) {
        let det = method.detect(&raw);
        let flagged = det.anomalies.iter().filter(|a| **a).count();
        let valid = raw.iter().filter(|v| v.is_finite()).count();

        prop_assert_eq!(det.stats.anomaly_count, flagged);
        prop_assert_eq!(det.stats.valid_points, valid);
        prop_assert_eq!(det.stats.invalid_points, raw.len() - valid);
        prop_assert!(det.stats.anomaly_ratio.is_finite());
        prop_assert!(det.stats.anomaly_ratio <= 1.0);
    }

    /// Raising sigma_threshold never flags more points.
    #[test]
    fn sigma_threshold_is_monotone(
        raw in arb_series(80),
        low in 0.5..5.0f64,
        delta in 0.0..3.0f64,
    ) {
        let loose = ThreeSigma {
            sigma_threshold: low,
        }
        .detect(&raw);
        let strict = ThreeSigma {
            sigma_threshold: low + delta,
        }
        .detect(&raw);
        prop_assert!(strict.stats.anomaly_count <= loose.stats.anomaly_count);
    }

    /// Raising iqr_multiplier never flags more points.
    #[test]
    fn iqr_multiplier_is_monotone(
        raw in arb_series(80),
        low in 0.5..5.0f64,
        delta in 0.0..3.0f64,
    ) {
        let loose = Iqr {
            iqr_multiplier: low,
        }
        .detect(&raw);
        let strict = Iqr {
            iqr_multiplier: low + delta,
        }
        .detect(&raw);
        prop_assert!(strict.stats.anomaly_count <= loose.stats.anomaly_count);
    }

    /// An eps wider than any standardised gap puts every point in one cluster.
    #[test]
    fn huge_eps_flags_nothing(raw in arb_series(60), min_samples in 1usize..6) {
        let det = Dbscan {
            eps: 1e9,
            min_samples,
        }
        .detect(&raw);
        prop_assert_eq!(det.stats.anomaly_count, 0);
    }

    /// Point-wise rank-cutoff detectors flag at most a contamination share.
    #[test]
    fn rank_cutoff_respects_contamination(
        raw in arb_series(60),
        contamination in arb_contamination(),
        seed in any::<u64>(),
    ) {
        let valid = raw.iter().filter(|v| v.is_finite()).count() as f64;
        let detectors: Vec<Box<dyn Detector>> = vec![
            Box::new(KMeans {
                contamination,
                seed: Some(seed),
                ..KMeans::default()
            }),
            Box::new(Knn {
                contamination,
                ..Knn::default()
            }),
            Box::new(Lof {
                contamination,
                n_neighbors: 5,
            }),
            Box::new(NormA {
                contamination,
                window_size: 4,
                ..NormA::default()
            }),
        ];
        for detector in detectors {
            let det = detector.detect(&raw);
            prop_assert!(
                det.stats.anomaly_count as f64 <= contamination * valid + 1.0,
                "{} flagged {} of {}", detector.method(), det.stats.anomaly_count, valid
            );
        }
    }

    /// Cleaning already-clean data is the identity.
    #[test]
    fn clean_is_idempotent(raw in arb_series(60)) {
        let once = clean(&raw);
        let twice = clean(&once.values);
        prop_assert_eq!(&twice.values, &once.values);
        prop_assert!(twice.validity.iter().all(|v| *v));
        prop_assert_eq!(twice.indices, (0..once.values.len()).collect::<Vec<_>>());
    }
}

#[test]
fn seeded_kmeans_is_reproducible_across_instances() {
    let raw: Vec<f64> = (0..80).map(|i| ((i * 31) % 17) as f64 + (i as f64) * 0.05).collect();
    let seeded = KMeans {
        seed: Some(99),
        ..KMeans::default()
    };
    let a = seeded.detect(&raw);
    let b = seeded.clone().detect(&raw);
    assert_eq!(a.anomalies, b.anomalies);
    assert_eq!(a.stats, b.stats);
}
