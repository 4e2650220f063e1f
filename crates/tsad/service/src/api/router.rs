//! API Router configuration

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    let detection_routes = Router::new()
        .route("/methods", get(handlers::list_detection_methods))
        .route("/detect", post(handlers::detect_anomalies));

    let preprocessing_routes = Router::new()
        .route("/methods", get(handlers::list_preprocessing_methods))
        .route("/smooth", post(handlers::apply_smoothing))
        .route("/apply-pipeline", post(handlers::apply_pipeline));

    let api_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/detection", detection_routes)
        .nest("/preprocessing", preprocessing_routes);

    let mut router = Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(state.config.server.max_body_size))
        .layer(TraceLayer::new_for_http());

    if state.config.server.enable_cors {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router.with_state(state)
}
