//! Scan job orchestration.
//!
//! Drives a job from folder walk to finalization with a bounded worker
//! pool. All shared progress state lives in the database: workers bump the
//! processed counter with a conditional update and finalization is a
//! guarded status transition, so concurrent workers cannot double-count or
//! complete a job twice.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use super::evaluate::{evaluate, DocumentEvaluation, EvaluatorConfig};
use super::report;
use crate::extract::{ExtractError, FieldCandidate, FieldExtractor};
use crate::models::{FileKind, JobStatus, ScanJob, ScannedDocument};
use crate::repository::{DbContext, DocumentRepository, ScanJobRepository};

/// Progress events emitted while a job is processed.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    JobStarted {
        job_id: i32,
        total_files: usize,
    },
    FileStarted {
        document_id: i32,
        file_path: String,
    },
    FileRetried {
        document_id: i32,
        attempt: u32,
    },
    FileCompleted {
        document_id: i32,
        has_errors: bool,
        confidence: f64,
    },
    FileFailed {
        document_id: i32,
        error: String,
    },
    JobCompleted {
        job_id: i32,
    },
    JobCancelled {
        job_id: i32,
    },
}

/// Tunables for job processing.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Maximum files processed concurrently.
    pub workers: usize,
    /// Wall-clock budget per extraction attempt.
    pub file_timeout: Duration,
    /// Extra attempts after a timed-out extraction.
    pub max_retries: u32,
    /// Directory summary PDFs are written into.
    pub output_dir: PathBuf,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            workers: 4,
            file_timeout: Duration::from_secs(120),
            max_retries: 1,
            output_dir: PathBuf::from("outputs"),
        }
    }
}

/// Orchestrates the scan job lifecycle.
#[derive(Clone)]
pub struct ScanService {
    jobs: ScanJobRepository,
    documents: DocumentRepository,
    extractor: Arc<FieldExtractor>,
    evaluator: Arc<EvaluatorConfig>,
    options: ScanOptions,
}

impl ScanService {
    pub fn new(
        ctx: &DbContext,
        extractor: FieldExtractor,
        evaluator: EvaluatorConfig,
        options: ScanOptions,
    ) -> Self {
        Self {
            jobs: ctx.jobs(),
            documents: ctx.documents(),
            extractor: Arc::new(extractor),
            evaluator: Arc::new(evaluator),
            options,
        }
    }

    /// Register a job for a folder: walk it, persist the job, and insert
    /// one placeholder document per supported file.
    ///
    /// An unreadable folder or one with no supported files produces a job
    /// that is already `failed`; the caller inspects the returned status.
    pub async fn start(&self, folder: &Path) -> anyhow::Result<ScanJob> {
        let folder_str = folder.display().to_string();

        let files = match enumerate_files(folder) {
            Ok(files) => files,
            Err(e) => {
                warn!("cannot walk {}: {}", folder_str, e);
                let job = self.jobs.create(&folder_str, JobStatus::Failed, 0).await?;
                return Ok(job);
            }
        };

        if files.is_empty() {
            warn!("no supported files under {}", folder_str);
            let job = self.jobs.create(&folder_str, JobStatus::Failed, 0).await?;
            return Ok(job);
        }

        let job = self
            .jobs
            .create(&folder_str, JobStatus::Running, files.len() as i32)
            .await?;

        for (path, kind) in &files {
            self.documents
                .insert_placeholder(job.id, &path.display().to_string(), kind.as_str())
                .await?;
        }

        info!("scan job {} created with {} files", job.id, files.len());
        Ok(job)
    }

    /// Process every document of a job with a bounded worker pool, then
    /// return the job's final state.
    pub async fn process(
        &self,
        job_id: i32,
        events: Option<mpsc::Sender<ScanEvent>>,
    ) -> anyhow::Result<ScanJob> {
        let job = self
            .jobs
            .get(job_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("scan job {} not found", job_id))?;

        if job.status.is_terminal() {
            return Ok(job);
        }
        if job.status == JobStatus::Pending {
            self.jobs.mark_running(job_id).await?;
        }

        let documents = self.documents.list_by_job(job_id).await?;
        send(&events, ScanEvent::JobStarted {
            job_id,
            total_files: documents.len(),
        })
        .await;

        let mut handles: Vec<JoinHandle<()>> = Vec::new();
        let mut cancelled = false;

        for document in documents {
            // Cancellation is honored between files, never mid-file.
            if let Some(current) = self.jobs.get(job_id).await? {
                if current.status == JobStatus::Cancelled {
                    cancelled = true;
                    break;
                }
            }

            if handles.len() >= self.options.workers {
                let oldest = handles.remove(0);
                let _ = oldest.await;
            }

            let worker = self.clone();
            let worker_events = events.clone();
            handles.push(tokio::spawn(async move {
                worker.process_document(document, worker_events).await;
            }));
        }

        for handle in handles {
            let _ = handle.await;
        }

        if cancelled {
            info!("scan job {} cancelled, remaining files skipped", job_id);
            send(&events, ScanEvent::JobCancelled { job_id }).await;
        }

        self.jobs
            .get(job_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("scan job {} disappeared", job_id))
    }

    pub async fn status(&self, job_id: i32) -> anyhow::Result<Option<ScanJob>> {
        Ok(self.jobs.get(job_id).await?)
    }

    /// Request cancellation. Returns false if the job was already terminal.
    pub async fn cancel(&self, job_id: i32) -> anyhow::Result<bool> {
        Ok(self.jobs.cancel(job_id).await?)
    }

    /// Delete a job and everything under it.
    pub async fn delete(&self, job_id: i32) -> anyhow::Result<bool> {
        Ok(self.jobs.delete(job_id).await?)
    }

    /// One worker: extract, evaluate, persist, then advance the job.
    async fn process_document(
        &self,
        document: ScannedDocument,
        events: Option<mpsc::Sender<ScanEvent>>,
    ) {
        send(&events, ScanEvent::FileStarted {
            document_id: document.id,
            file_path: document.file_path.clone(),
        })
        .await;

        let persisted = match self.extract_with_retries(&document, &events).await {
            Ok(fields) => {
                let evaluation = evaluate(&fields, &self.evaluator);
                send(&events, ScanEvent::FileCompleted {
                    document_id: document.id,
                    has_errors: evaluation.has_errors,
                    confidence: evaluation.confidence_score,
                })
                .await;
                let stored = self
                    .documents
                    .record_result(
                        document.id,
                        evaluation.has_errors,
                        evaluation.empty_fields_count,
                        evaluation.confidence_score,
                        &evaluation.fields,
                    )
                    .await;
                if stored.is_ok() {
                    self.attach_summary_pdf(&document, &evaluation).await;
                }
                stored
            }
            Err(e) => {
                warn!("extraction failed for {}: {}", document.file_path, e);
                send(&events, ScanEvent::FileFailed {
                    document_id: document.id,
                    error: e.to_string(),
                })
                .await;
                self.documents.record_failure(document.id, &e.to_string()).await
            }
        };

        if let Err(e) = persisted {
            error!("failed to persist document {}: {}", document.id, e);
        }

        // The job advances even when the file failed; failures are data,
        // not job-level errors.
        match self.jobs.increment_processed(document.scan_job_id).await {
            Ok(_) => match self.jobs.try_complete(document.scan_job_id).await {
                Ok(true) => {
                    info!("scan job {} completed", document.scan_job_id);
                    send(&events, ScanEvent::JobCompleted {
                        job_id: document.scan_job_id,
                    })
                    .await;
                }
                Ok(false) => {}
                Err(e) => error!(
                    "failed to finalize scan job {}: {}",
                    document.scan_job_id, e
                ),
            },
            Err(e) => error!(
                "failed to advance scan job {}: {}",
                document.scan_job_id, e
            ),
        }
    }

    /// Write the document's summary PDF and record its path.
    ///
    /// A write failure leaves `output_pdf_path` NULL; it never fails the
    /// document or the job.
    async fn attach_summary_pdf(&self, document: &ScannedDocument, evaluation: &DocumentEvaluation) {
        let written = report::write_summary_pdf(
            document.id,
            &document.file_path,
            evaluation.confidence_score,
            &evaluation.fields,
            &self.options.output_dir,
        );
        match written {
            Ok(pdf_path) => {
                if let Err(e) = self
                    .documents
                    .set_output_pdf_path(document.id, &pdf_path.display().to_string())
                    .await
                {
                    error!(
                        "failed to record summary pdf for document {}: {}",
                        document.id, e
                    );
                }
            }
            Err(e) => warn!("could not write summary pdf for {}: {}", document.file_path, e),
        }
    }

    /// Run one extraction attempt under a timeout, retrying timeouts.
    ///
    /// A timed-out attempt's blocking task keeps running until its
    /// subprocess exits; we stop waiting for it regardless.
    async fn extract_with_retries(
        &self,
        document: &ScannedDocument,
        events: &Option<mpsc::Sender<ScanEvent>>,
    ) -> Result<BTreeMap<String, FieldCandidate>, ExtractError> {
        let path = PathBuf::from(&document.file_path);
        let kind = FileKind::from_path(&path)
            .ok_or_else(|| ExtractError::UnsupportedFile(document.file_type.clone()))?;

        let mut attempt = 0u32;
        loop {
            let extractor = Arc::clone(&self.extractor);
            let task_path = path.clone();
            let task = tokio::task::spawn_blocking(move || extractor.extract(&task_path, kind));

            let result = match tokio::time::timeout(self.options.file_timeout, task).await {
                Ok(Ok(result)) => result,
                Ok(Err(join_err)) => Err(ExtractError::ExtractionFailed(format!(
                    "extraction task panicked: {join_err}"
                ))),
                Err(_) => Err(ExtractError::Timeout(self.options.file_timeout)),
            };

            match result {
                Err(e) if e.is_transient() && attempt < self.options.max_retries => {
                    attempt += 1;
                    warn!(
                        "retrying {} (attempt {}): {}",
                        document.file_path, attempt, e
                    );
                    send(events, ScanEvent::FileRetried {
                        document_id: document.id,
                        attempt,
                    })
                    .await;
                }
                other => return other,
            }
        }
    }
}

async fn send(events: &Option<mpsc::Sender<ScanEvent>>, event: ScanEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event).await;
    }
}

/// Recursively collect supported files in a deterministic order.
fn enumerate_files(folder: &Path) -> io::Result<Vec<(PathBuf, FileKind)>> {
    if !folder.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a readable folder", folder.display()),
        ));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(folder).sort_by_file_name() {
        let entry = entry.map_err(io::Error::other)?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(kind) = FileKind::from_path(entry.path()) {
            files.push((entry.into_path(), kind));
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn service(ctx: &DbContext) -> ScanService {
        ScanService::new(
            ctx,
            FieldExtractor::with_default_engines(crate::extract::EngineMode::Combine, "eng"),
            EvaluatorConfig::default(),
            ScanOptions::default(),
        )
    }

    async fn setup() -> (DbContext, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::from_sqlite_path(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        (ctx, dir)
    }

    #[tokio::test]
    async fn test_start_with_missing_folder_fails_job() {
        let (ctx, dir) = setup().await;
        let svc = service(&ctx);

        let job = svc.start(&dir.path().join("does-not-exist")).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.total_files, 0);
        assert!(ctx.documents().list_by_job(job.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_start_with_empty_folder_fails_job() {
        let (ctx, dir) = setup().await;
        let input = dir.path().join("input");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::write(input.join("notes.txt"), "unsupported").unwrap();

        let job = service(&ctx).start(&input).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.total_files, 0);
    }

    #[tokio::test]
    async fn test_start_registers_placeholders() {
        let (ctx, dir) = setup().await;
        let input = dir.path().join("input");
        std::fs::create_dir_all(input.join("nested")).unwrap();
        std::fs::write(input.join("a.png"), b"fake").unwrap();
        std::fs::write(input.join("nested/b.pdf"), b"fake").unwrap();
        std::fs::write(input.join("skip.txt"), b"fake").unwrap();

        let job = service(&ctx).start(&input).await.unwrap();
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.total_files, 2);

        let docs = ctx.documents().list_by_job(job.id).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().all(|d| !d.has_errors));
    }

    #[tokio::test]
    async fn test_process_unknown_job_errors() {
        let (ctx, _dir) = setup().await;
        assert!(service(&ctx).process(4242, None).await.is_err());
    }
}
