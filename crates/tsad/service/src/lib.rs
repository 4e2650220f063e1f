//! tsad service library
//!
//! The HTTP layer around `tsad-core`:
//! - detection and method catalog endpoints
//! - the smoothing preprocessor and preprocessing pipeline
//! - configuration loading and server lifecycle

pub mod api;
pub mod config;
pub mod error;
pub mod server;
pub mod smoothing;

pub use api::{create_router, AppState};
pub use config::ServiceConfig;
pub use error::{ApiError, ApiResult, ServiceError, ServiceResult};
pub use server::Server;
pub use smoothing::{smooth, SmoothingError, SmoothingMethod};
