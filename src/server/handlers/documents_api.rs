//! Document listing endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

use crate::models::{DocumentField, ScannedDocument};
use crate::server::AppState;
use crate::services::unify_job_pdfs;

fn document_json(doc: &ScannedDocument) -> Value {
    json!({
        "id": doc.id,
        "scan_job_id": doc.scan_job_id,
        "file_path": doc.file_path,
        "file_type": doc.file_type,
        "has_errors": doc.has_errors,
        "empty_fields_count": doc.empty_fields_count,
        "confidence_score": doc.confidence_score,
        "error": doc.error,
        "scanned_at": doc.scanned_at.to_rfc3339(),
    })
}

fn field_json(field: &DocumentField) -> Value {
    json!({
        "id": field.id,
        "document_id": field.document_id,
        "field_name": field.field_name,
        "field_value": field.field_value,
        "is_empty": field.is_empty,
        "is_critical": field.is_critical,
        "confidence": field.confidence,
        "extracted_at": field.extracted_at.to_rfc3339(),
    })
}

/// GET /api/documents/job/:job_id - all documents of a job.
pub async fn job_documents(
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

    match state.doc_repo.list_by_job(job_id).await {
        Ok(docs) => {
            let data: Vec<Value> = docs.iter().map(document_json).collect();
            (
                StatusCode::OK,
                Json(json!({ "success": true, "data": data })),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "message": e.to_string() })),
        ),
    }
}

/// GET /api/documents/problematic/:job_id - documents with errors.
pub async fn problematic_documents(
    State(state): State<AppState>,
    Path(job_id): Path<i32>,
) -> impl IntoResponse {
    match state.doc_repo.list_problematic(job_id).await {
        Ok(docs) => {
            let data: Vec<Value> = docs.iter().map(document_json).collect();
            (
                StatusCode::OK,
                Json(json!({ "success": true, "data": data })),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "message": e.to_string() })),
        ),
    }
}

/// POST /api/documents/unify/:job_id - concatenate a job's output PDFs.
pub async fn unify_documents(
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

    match unify_job_pdfs(&state.job_repo, &state.doc_repo, job_id, &state.output_dir).await {
        Ok(unified_path) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "documents unified",
                "unified_pdf_path": unified_path.display().to_string(),
            })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "message": e.to_string() })),
        ),
    }
}

/// GET /api/documents/:document_id/fields
pub async fn document_fields(
    State(state): State<AppState>,
    Path(document_id): Path<i32>,
) -> impl IntoResponse {
    match state.doc_repo.get(document_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "success": false, "message": "document not found" })),
            )
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "message": e.to_string() })),
            )
        }
    }

    match state.doc_repo.fields(document_id).await {
        Ok(fields) => {
            let data: Vec<Value> = fields.iter().map(field_json).collect();
            (
                StatusCode::OK,
                Json(json!({ "success": true, "data": data })),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "message": e.to_string() })),
        ),
    }
}
