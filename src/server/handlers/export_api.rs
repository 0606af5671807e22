//! CSV export endpoint.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::server::AppState;
use crate::services::export_job_csv;

/// POST /api/export/:job_id - write job results as CSV.
pub async fn export_job(
    State(state): State<AppState>,
    Path(job_id): Path<i32>,
) -> impl IntoResponse {
    match state.job_repo.get(job_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "success": false, "message": "scan job not found" })),
            )
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "message": e.to_string() })),
            )
        }
    }

    match export_job_csv(&state.job_repo, &state.doc_repo, job_id, &state.export_dir).await {
        Ok(csv_path) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "csv_path": csv_path.display().to_string(),
            })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "message": e.to_string() })),
        ),
    }
}
