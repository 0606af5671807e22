//! JSON HTTP API for the scanning service.
//!
//! Exposes the scan job lifecycle (start, process, status, cancel),
//! document listings, and CSV export.

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Settings;
use crate::repository::{DocumentRepository, ScanJobRepository};
use crate::services::ScanService;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ScanService>,
    pub job_repo: ScanJobRepository,
    pub doc_repo: DocumentRepository,
    pub export_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl AppState {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let ctx = settings.create_db_context();
        Ok(Self {
            service: Arc::new(settings.build_service(&ctx)?),
            job_repo: ctx.jobs(),
            doc_repo: ctx.documents(),
            export_dir: settings.export_dir.clone(),
            output_dir: settings.output_dir.clone(),
        })
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings)?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use tempfile::tempdir;
    use tower::ServiceExt;

    async fn setup_test_app() -> (axum::Router, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let settings = Settings {
            database_path: dir.path().join("test.db"),
            export_dir: dir.path().join("exports"),
            output_dir: dir.path().join("outputs"),
            ..Settings::default()
        };

        let ctx = settings.create_db_context();
        ctx.init_schema().await.unwrap();

        let state = AppState::new(&settings).unwrap();
        (create_router(state), dir)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _dir) = setup_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_start_requires_folder_path() {
        let (app, _dir) = setup_test_app().await;

        let response = app
            .oneshot(post_json("/api/scan/start", "{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_start_with_missing_folder_reports_failed_job() {
        let (app, dir) = setup_test_app().await;
        let missing = dir.path().join("nope");

        let body = serde_json::json!({ "folder_path": missing }).to_string();
        let response = app.oneshot(post_json("/api/scan/start", &body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["status"], "failed");
    }

    #[tokio::test]
    async fn test_start_and_status() {
        let (app, dir) = setup_test_app().await;
        let input = dir.path().join("input");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::write(input.join("a.png"), b"fake").unwrap();

        let body = serde_json::json!({ "folder_path": input }).to_string();
        let response = app
            .clone()
            .oneshot(post_json("/api/scan/start", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let started = body_json(response).await;
        let job_id = started["job_id"].as_i64().unwrap();
        assert_eq!(started["data"]["status"], "running");
        assert_eq!(started["data"]["total_files"], 1);

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/scan/status/{}", job_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["id"], job_id);
        assert_eq!(json["data"]["progress_percentage"], 0.0);
    }

    #[tokio::test]
    async fn test_status_unknown_job_is_404() {
        let (app, _dir) = setup_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/scan/status/999")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cancel_then_cancel_again() {
        let (app, dir) = setup_test_app().await;
        let input = dir.path().join("input");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::write(input.join("a.png"), b"fake").unwrap();

        let body = serde_json::json!({ "folder_path": input }).to_string();
        let response = app
            .clone()
            .oneshot(post_json("/api/scan/start", &body))
            .await
            .unwrap();
        let job_id = body_json(response).await["job_id"].as_i64().unwrap();

        let response = app
            .clone()
            .oneshot(post_json(&format!("/api/scan/cancel/{}", job_id), ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["success"], true);

        // Already terminal.
        let response = app
            .oneshot(post_json(&format!("/api/scan/cancel/{}", job_id), ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["success"], false);
    }

    #[tokio::test]
    async fn test_job_documents_and_problematic() {
        let (app, dir) = setup_test_app().await;
        let input = dir.path().join("input");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::write(input.join("a.png"), b"fake").unwrap();

        let body = serde_json::json!({ "folder_path": input }).to_string();
        let response = app
            .clone()
            .oneshot(post_json("/api/scan/start", &body))
            .await
            .unwrap();
        let job_id = body_json(response).await["job_id"].as_i64().unwrap();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/documents/job/{}", job_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"].as_array().unwrap().len(), 1);

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/documents/problematic/{}", job_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unify_unknown_job_is_404() {
        let (app, _dir) = setup_test_app().await;

        let response = app
            .oneshot(post_json("/api/documents/unify/999", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_export_unknown_job_is_404() {
        let (app, _dir) = setup_test_app().await;

        let response = app
            .oneshot(post_json("/api/export/999", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
