//! Scan job lifecycle endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::models::ScanJob;
use crate::server::AppState;

/// Job payload shared by the scan endpoints.
pub(super) fn job_json(job: &ScanJob) -> Value {
    json!({
        "id": job.id,
        "folder_path": job.folder_path,
        "status": job.status.as_str(),
        "total_files": job.total_files,
        "processed_files": job.processed_files,
        "progress_percentage": job.progress_percentage(),
        "csv_path": job.csv_path,
        "created_at": job.created_at.to_rfc3339(),
        "completed_at": job.completed_at.map(|dt| dt.to_rfc3339()),
    })
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

#[derive(Deserialize)]
pub struct StartScanRequest {
    pub folder_path: Option<String>,
}

/// POST /api/scan/start - register a job for a folder.
pub async fn start_scan(
    State(state): State<AppState>,
    Json(payload): Json<StartScanRequest>,
) -> impl IntoResponse {
    let Some(folder_path) = payload.folder_path else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "message": "folder_path is required" })),
        );
    };

    match state
        .service
        .start(std::path::Path::new(&folder_path))
        .await
    {
        Ok(job) => (
            StatusCode::OK,
            Json(json!({ "success": true, "job_id": job.id, "data": job_json(&job) })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "message": e.to_string() })),
        ),
    }
}

/// POST /api/scan/process/:job_id - run a job to completion.
pub async fn process_scan(
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

    match state.service.process(job_id, None).await {
        Ok(job) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": job_json(&job) })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "message": e.to_string() })),
        ),
    }
}

/// GET /api/scan/status/:job_id
pub async fn scan_status(
    State(state): State<AppState>,
    Path(job_id): Path<i32>,
) -> impl IntoResponse {
    match state.job_repo.get(job_id).await {
        Ok(Some(job)) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": job_json(&job) })),
        ),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "message": "scan job not found" })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "message": e.to_string() })),
        ),
    }
}

/// POST /api/scan/cancel/:job_id
pub async fn cancel_scan(
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

    match state.service.cancel(job_id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({ "success": true, "message": "cancellation requested" })),
        ),
        Ok(false) => (
            StatusCode::OK,
            Json(json!({ "success": false, "message": "job already finished" })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "message": e.to_string() })),
        ),
    }
}
