//! REST API router.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::api::handlers::{
    classify_handler, health_handler, metrics_handler, ontology_handler, ApiState,
};
use crate::config::ServerConfig;

/// Create the REST API router.
///
/// Endpoints:
/// - POST /classify  - Classify an uploaded file
/// - GET  /ontology  - Full taxonomy trees
/// - GET  /health    - Service health
/// - GET  /metrics   - Prometheus metrics
pub fn create_router(state: Arc<ApiState>, config: &ServerConfig) -> Router {
    let router = Router::new()
        .route("/classify", post(classify_handler))
        .route("/ontology", get(ontology_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .with_state(state);

    // Add CORS if enabled
    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE]);
        let cors = if config.cors_origins.iter().any(|o| o == "*") {
            cors.allow_origin(Any)
        } else {
            let origins: Vec<HeaderValue> = config
                .cors_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            cors.allow_origin(origins)
        };

        router.layer(cors)
    } else {
        router
    }
}
