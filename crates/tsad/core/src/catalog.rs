//! Static metadata describing each detection method and its parameters.
//!
//! Consumed by UIs to render parameter forms. Parameter names and defaults
//! here must match the serde field names of the detector structs; the tests
//! below hold the two together.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};

use crate::method::MethodId;

/// Broad family a detector belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Statistical,
    Density,
    Clustering,
    Distance,
    Subsequence,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Int,
    Float,
    Select,
}

/// Form schema for one parameter.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ParamSchema {
    #[serde(rename = "type")]
    pub kind: ParamType,
    pub default: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<&'static str>,
    pub description: &'static str,
    pub detail: &'static str,
}

impl ParamSchema {
    pub fn int(default: Value, description: &'static str, detail: &'static str) -> Self {
        Self::new(ParamType::Int, default, description, detail).step(1.0)
    }

    pub fn float(default: Value, description: &'static str, detail: &'static str) -> Self {
        Self::new(ParamType::Float, default, description, detail)
    }

    pub fn select(
        default: &'static str,
        options: &[&'static str],
        description: &'static str,
        detail: &'static str,
    ) -> Self {
        Self {
            options: options.to_vec(),
            ..Self::new(ParamType::Select, json!(default), description, detail)
        }
    }

    fn new(kind: ParamType, default: Value, description: &'static str, detail: &'static str) -> Self {
        Self {
            kind,
            default,
            min: None,
            max: None,
            step: None,
            options: Vec::new(),
            description,
            detail,
        }
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }
}

/// Display metadata for one detection method.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MethodInfo {
    pub name: &'static str,
    pub category: Category,
    pub description: &'static str,
    pub principle: &'static str,
    pub params: BTreeMap<&'static str, ParamSchema>,
}

/// Every method keyed by its wire identifier.
pub type MethodCatalog = BTreeMap<MethodId, MethodInfo>;

pub fn catalog() -> MethodCatalog {
    MethodId::ALL.into_iter().map(|id| (id, method_info(id))).collect()
}

fn contamination() -> ParamSchema {
    ParamSchema::float(
        json!(0.1),
        "Expected anomaly share",
        "Fraction of valid points expected to be anomalous. The highest-scoring \
         points above the matching rank cutoff are flagged.",
    )
    .range(0.01, 0.5)
    .step(0.01)
}

pub fn method_info(id: MethodId) -> MethodInfo {
    let (name, category, description, principle, params): (_, _, _, _, Vec<(&str, ParamSchema)>) =
        match id {
            MethodId::ThreeSigma => (
                "3-Sigma",
                Category::Statistical,
                "Classic statistical rule assuming roughly normal data. Points further \
                 than N standard deviations from the mean are anomalous.",
                "Under a normal distribution 99.7% of values fall within mean ± 3σ; \
                 values strictly outside the band are flagged.",
                vec![(
                    "sigma_threshold",
                    ParamSchema::float(
                        json!(3.0),
                        "Sigma multiplier",
                        "Width of the band in standard deviations. 3σ covers 99.7%, \
                         2σ covers 95.4%. Larger values flag fewer points.",
                    )
                    .range(1.0, 5.0)
                    .step(0.1),
                )],
            ),
            MethodId::Iqr => (
                "IQR",
                Category::Statistical,
                "Robust quartile rule that makes no distribution assumption and \
                 tolerates skewed data.",
                "Computes q1 and q3 and flags values strictly outside \
                 [q1 − m·IQR, q3 + m·IQR], where IQR = q3 − q1.",
                vec![(
                    "iqr_multiplier",
                    ParamSchema::float(
                        json!(1.5),
                        "IQR multiplier",
                        "1.5 is the conventional outlier fence, 3.0 marks only extreme \
                         outliers.",
                    )
                    .range(0.5, 5.0)
                    .step(0.1),
                )],
            ),
            MethodId::Dbscan => (
                "DBSCAN",
                Category::Density,
                "Density clustering on standardised values. Points that belong to no \
                 dense cluster are anomalous.",
                "Points with at least min_samples neighbours within eps seed clusters \
                 that grow through density-reachable points; everything left over is \
                 noise.",
                vec![
                    (
                        "eps",
                        ParamSchema::float(
                            json!(0.5),
                            "Neighbourhood radius",
                            "Maximum standardised distance between two neighbours. \
                             Smaller values make clusters tighter and flag more points.",
                        )
                        .range(0.1, 5.0)
                        .step(0.1),
                    ),
                    (
                        "min_samples",
                        ParamSchema::int(
                            json!(5),
                            "Minimum neighbours",
                            "Neighbours (the point included) needed for a point to be \
                             a cluster core.",
                        )
                        .range(2.0, 20.0),
                    ),
                ],
            ),
            MethodId::KMeans => (
                "K-Means",
                Category::Clustering,
                "Clusters (position, value) pairs and flags points far from their \
                 nearest cluster centre.",
                "Seeds K centres with k-means++, refines them with Lloyd iterations, \
                 then scores each point by its distance to the closest centre.",
                vec![
                    (
                        "n_clusters",
                        ParamSchema::int(
                            json!(3),
                            "Number of clusters",
                            "Start with 2 to 5. Too many clusters overfits and hides \
                             anomalies.",
                        )
                        .range(2.0, 10.0),
                    ),
                    ("contamination", contamination()),
                    (
                        "max_iter",
                        ParamSchema::int(
                            json!(100),
                            "Maximum iterations",
                            "Upper bound on refinement rounds; clustering usually \
                             converges earlier.",
                        )
                        .range(10.0, 500.0)
                        .step(10.0),
                    ),
                    (
                        "seed",
                        ParamSchema::int(
                            Value::Null,
                            "Random seed",
                            "Fixes centre initialisation so runs are reproducible. \
                             Leave empty for a fresh random start.",
                        )
                        .min(0.0),
                    ),
                ],
            ),
            MethodId::Knn => (
                "KNN",
                Category::Distance,
                "Distance-based detector: points far from their nearest neighbours \
                 are anomalous.",
                "Scores each point by its mean distance to its k nearest neighbours \
                 in standardised (position, value) space.",
                vec![
                    (
                        "n_neighbors",
                        ParamSchema::int(
                            json!(5),
                            "Neighbour count",
                            "Small k reacts to local outliers, large k to global ones.",
                        )
                        .range(1.0, 50.0),
                    ),
                    ("contamination", contamination()),
                ],
            ),
            MethodId::Lof => (
                "LOF",
                Category::Density,
                "Local outlier factor: compares each point's density with the density \
                 of its neighbours.",
                "A factor near 1 means the point is as dense as its neighbourhood; \
                 clearly larger factors mark sparser, anomalous points.",
                vec![
                    (
                        "n_neighbors",
                        ParamSchema::int(
                            json!(20),
                            "Neighbour count",
                            "Size of the neighbourhood used to estimate local density.",
                        )
                        .range(5.0, 50.0),
                    ),
                    ("contamination", contamination()),
                ],
            ),
            MethodId::MatrixProfile => (
                "Matrix Profile",
                Category::Subsequence,
                "Finds subsequences (discords) whose shape matches nothing else in the \
                 series.",
                "For every window, the distance to its nearest non-trivial match is \
                 computed; windows with the largest normalised distances are flagged \
                 over their full span.",
                vec![
                    (
                        "window_size",
                        ParamSchema::int(
                            json!(10),
                            "Window length",
                            "Length of the compared subsequences. Should roughly match \
                             the length of the patterns of interest.",
                        )
                        .range(3.0, 100.0),
                    ),
                    ("contamination", contamination()),
                ],
            ),
            MethodId::NormA => (
                "NormA",
                Category::Subsequence,
                "Scores each point against its local context using robust local \
                 statistics.",
                "Averages the local z-score and the local MAD score over the \
                 surrounding window, scaled by sensitivity.",
                vec![
                    (
                        "window_size",
                        ParamSchema::int(
                            json!(10),
                            "Context window",
                            "Number of surrounding points (half on each side) that form \
                             the local context.",
                        )
                        .range(3.0, 100.0),
                    ),
                    ("contamination", contamination()),
                    (
                        "sensitivity",
                        ParamSchema::float(
                            json!(1.0),
                            "Sensitivity",
                            "Multiplier applied to every score.",
                        )
                        .range(0.1, 5.0)
                        .step(0.1),
                    ),
                ],
            ),
        };

    MethodInfo {
        name,
        category,
        description,
        principle,
        params: params.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::DetectionMethod;

    #[test]
    fn catalog_covers_every_method() {
        let cat = catalog();
        assert_eq!(cat.len(), MethodId::ALL.len());
        assert_eq!(cat[&MethodId::ThreeSigma].category, Category::Statistical);
        assert_eq!(cat[&MethodId::MatrixProfile].category, Category::Subsequence);
    }

    #[test]
    fn params_match_detector_defaults() {
        for (id, info) in catalog() {
            let defaults = DetectionMethod::default_for(id).params_json();
            let defaults = defaults.as_object().expect("params serialise to an object");

            let mut schema_keys: Vec<&str> = info.params.keys().copied().collect();
            let mut default_keys: Vec<&str> = defaults.keys().map(String::as_str).collect();
            schema_keys.sort_unstable();
            default_keys.sort_unstable();
            assert_eq!(schema_keys, default_keys, "parameter names for {id}");

            for (name, schema) in &info.params {
                assert_eq!(&schema.default, &defaults[*name], "default of {id}.{name}");
            }
        }
    }

    #[test]
    fn serialises_keyed_by_wire_id() {
        let json = serde_json::to_value(catalog()).unwrap();
        assert_eq!(json["3sigma"]["params"]["sigma_threshold"]["type"], "float");
        assert_eq!(json["kmeans"]["params"]["seed"]["default"], Value::Null);
        assert_eq!(json["dbscan"]["category"], "density");
        assert!(json["knn"]["params"]["n_neighbors"].get("options").is_none());
    }
}
