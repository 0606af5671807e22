//! Router configuration for the web server.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        // Scan job lifecycle
        .route("/api/scan/start", post(handlers::start_scan))
        .route("/api/scan/process/:job_id", post(handlers::process_scan))
        .route("/api/scan/status/:job_id", get(handlers::scan_status))
        .route("/api/scan/cancel/:job_id", post(handlers::cancel_scan))
        // Documents
        .route("/api/documents/job/:job_id", get(handlers::job_documents))
        .route(
            "/api/documents/problematic/:job_id",
            get(handlers::problematic_documents),
        )
        .route(
            "/api/documents/:document_id/fields",
            get(handlers::document_fields),
        )
        .route(
            "/api/documents/unify/:job_id",
            post(handlers::unify_documents),
        )
        // Export
        .route("/api/export/:job_id", post(handlers::export_job))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
