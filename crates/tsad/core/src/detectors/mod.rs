//! The detector family.
//!
//! | id               | family       | score / rule                              |
//! |------------------|--------------|-------------------------------------------|
//! | `3sigma`         | statistical  | outside `mean ± k·std`                    |
//! | `iqr`            | statistical  | outside `[q1 − m·iqr, q3 + m·iqr]`        |
//! | `dbscan`         | density      | not absorbed into any cluster             |
//! | `kmeans`         | clustering   | distance to nearest centre, rank cutoff   |
//! | `knn`            | distance     | mean distance to k neighbours, rank cutoff|
//! | `lof`            | density      | local outlier factor, rank cutoff         |
//! | `matrix_profile` | subsequence  | nearest-match distance per window         |
//! | `norma`          | subsequence  | local z-score and MAD score, rank cutoff  |

pub mod dbscan;
pub mod iqr;
pub mod kmeans;
pub mod knn;
pub mod lof;
pub mod matrix_profile;
pub mod norma;
pub mod three_sigma;

pub use dbscan::Dbscan;
pub use iqr::Iqr;
pub use kmeans::KMeans;
pub use knn::Knn;
pub use lof::Lof;
pub use matrix_profile::MatrixProfile;
pub use norma::NormA;
pub use three_sigma::ThreeSigma;
