//! Scan job repository.
//!
//! Job progress state is owned by the database: the processed-files counter
//! and job finalization are conditional updates so concurrent workers can
//! never overshoot the total or complete a job twice.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::{LastInsertRowId, NewScanJob, ScanJobRecord};
use super::pool::{AsyncSqlitePool, DieselError};
use super::{parse_datetime, parse_datetime_opt};
use crate::models::{JobStatus, ScanJob};
use crate::schema::{document_fields, scan_jobs, scanned_documents};

/// Convert a database record to a domain model.
impl From<ScanJobRecord> for ScanJob {
    fn from(record: ScanJobRecord) -> Self {
        ScanJob {
            id: record.id,
            folder_path: record.folder_path,
            status: JobStatus::from_str(&record.status),
            total_files: record.total_files,
            processed_files: record.processed_files,
            csv_path: record.csv_path,
            created_at: parse_datetime(&record.created_at),
            completed_at: parse_datetime_opt(record.completed_at),
        }
    }
}

/// Diesel-based scan job repository with compile-time query checking.
#[derive(Clone)]
pub struct ScanJobRepository {
    pool: AsyncSqlitePool,
}

impl ScanJobRepository {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Create a job and return it with its assigned id.
    pub async fn create(
        &self,
        folder_path: &str,
        status: JobStatus,
        total_files: i32,
    ) -> Result<ScanJob, DieselError> {
        let mut conn = self.pool.get().await?;
        let now = Utc::now();
        let completed_at = status.is_terminal().then(|| now.to_rfc3339());

        let record = NewScanJob {
            folder_path: folder_path.to_string(),
            status: status.as_str().to_string(),
            total_files,
            processed_files: 0,
            created_at: now.to_rfc3339(),
            completed_at: completed_at.clone(),
        };

        diesel::insert_into(scan_jobs::table)
            .values(&record)
            .execute(&mut conn)
            .await?;

        let row: LastInsertRowId = diesel::sql_query("SELECT last_insert_rowid()")
            .get_result(&mut conn)
            .await?;

        Ok(ScanJob {
            id: row.id as i32,
            folder_path: folder_path.to_string(),
            status,
            total_files,
            processed_files: 0,
            csv_path: None,
            created_at: now,
            completed_at: completed_at.map(|_| now),
        })
    }

    pub async fn get(&self, job_id: i32) -> Result<Option<ScanJob>, DieselError> {
        let mut conn = self.pool.get().await?;
        let record: Option<ScanJobRecord> = scan_jobs::table
            .filter(scan_jobs::id.eq(job_id))
            .first(&mut conn)
            .await
            .optional()?;
        Ok(record.map(ScanJob::from))
    }

    /// List recent jobs, newest first.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<ScanJob>, DieselError> {
        let mut conn = self.pool.get().await?;
        let records: Vec<ScanJobRecord> = scan_jobs::table
            .order(scan_jobs::created_at.desc())
            .limit(limit)
            .load(&mut conn)
            .await?;
        Ok(records.into_iter().map(ScanJob::from).collect())
    }

    /// Move a pending job to running. Returns false if the job was not pending.
    pub async fn mark_running(&self, job_id: i32) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;
        let updated = diesel::update(
            scan_jobs::table.filter(
                scan_jobs::id
                    .eq(job_id)
                    .and(scan_jobs::status.eq(JobStatus::Pending.as_str())),
            ),
        )
        .set(scan_jobs::status.eq(JobStatus::Running.as_str()))
        .execute(&mut conn)
        .await?;
        Ok(updated > 0)
    }

    /// Atomically bump the processed-files counter.
    ///
    /// The guard `processed_files < total_files` means the counter can never
    /// exceed the total no matter how many workers race on the update.
    pub async fn increment_processed(&self, job_id: i32) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;
        let updated = diesel::update(
            scan_jobs::table.filter(
                scan_jobs::id
                    .eq(job_id)
                    .and(scan_jobs::processed_files.lt(scan_jobs::total_files)),
            ),
        )
        .set(scan_jobs::processed_files.eq(scan_jobs::processed_files + 1))
        .execute(&mut conn)
        .await?;
        Ok(updated > 0)
    }

    /// Finalize the job once all files are processed.
    ///
    /// The status guard makes finalization exactly-once: only the caller
    /// whose update actually transitions running -> completed sees true.
    pub async fn try_complete(&self, job_id: i32) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;
        let now = Utc::now().to_rfc3339();
        let updated = diesel::update(
            scan_jobs::table.filter(
                scan_jobs::id
                    .eq(job_id)
                    .and(scan_jobs::status.eq(JobStatus::Running.as_str()))
                    .and(scan_jobs::processed_files.ge(scan_jobs::total_files)),
            ),
        )
        .set((
            scan_jobs::status.eq(JobStatus::Completed.as_str()),
            scan_jobs::completed_at.eq(Some(now)),
        ))
        .execute(&mut conn)
        .await?;
        Ok(updated > 0)
    }

    /// Mark a non-terminal job as failed.
    pub async fn mark_failed(&self, job_id: i32) -> Result<bool, DieselError> {
        self.finish_with_status(job_id, JobStatus::Failed).await
    }

    /// Request cancellation. Returns false if the job was already terminal.
    pub async fn cancel(&self, job_id: i32) -> Result<bool, DieselError> {
        self.finish_with_status(job_id, JobStatus::Cancelled).await
    }

    async fn finish_with_status(
        &self,
        job_id: i32,
        status: JobStatus,
    ) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;
        let now = Utc::now().to_rfc3339();
        let updated = diesel::update(
            scan_jobs::table.filter(
                scan_jobs::id.eq(job_id).and(scan_jobs::status.eq_any(vec![
                    JobStatus::Pending.as_str(),
                    JobStatus::Running.as_str(),
                ])),
            ),
        )
        .set((
            scan_jobs::status.eq(status.as_str()),
            scan_jobs::completed_at.eq(Some(now)),
        ))
        .execute(&mut conn)
        .await?;
        Ok(updated > 0)
    }

    pub async fn set_csv_path(&self, job_id: i32, csv_path: &str) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;
        diesel::update(scan_jobs::table.filter(scan_jobs::id.eq(job_id)))
            .set(scan_jobs::csv_path.eq(Some(csv_path.to_string())))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Delete a job together with its documents and their fields.
    pub async fn delete(&self, job_id: i32) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;

        let doc_ids = scanned_documents::table
            .filter(scanned_documents::scan_job_id.eq(job_id))
            .select(scanned_documents::id);
        diesel::delete(document_fields::table.filter(document_fields::document_id.eq_any(doc_ids)))
            .execute(&mut conn)
            .await?;

        diesel::delete(
            scanned_documents::table.filter(scanned_documents::scan_job_id.eq(job_id)),
        )
        .execute(&mut conn)
        .await?;

        let deleted = diesel::delete(scan_jobs::table.filter(scan_jobs::id.eq(job_id)))
            .execute(&mut conn)
            .await?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::DbContext;
    use tempfile::tempdir;

    async fn setup() -> (DbContext, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::from_sqlite_path(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        (ctx, dir)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (ctx, _dir) = setup().await;
        let jobs = ctx.jobs();

        let job = jobs.create("/tmp/in", JobStatus::Running, 3).await.unwrap();
        assert!(job.id > 0);

        let loaded = jobs.get(job.id).await.unwrap().unwrap();
        assert_eq!(loaded.folder_path, "/tmp/in");
        assert_eq!(loaded.status, JobStatus::Running);
        assert_eq!(loaded.total_files, 3);
        assert_eq!(loaded.processed_files, 0);
        assert!(loaded.completed_at.is_none());

        assert!(jobs.get(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_increment_never_exceeds_total() {
        let (ctx, _dir) = setup().await;
        let jobs = ctx.jobs();
        let job = jobs.create("/tmp/in", JobStatus::Running, 2).await.unwrap();

        assert!(jobs.increment_processed(job.id).await.unwrap());
        assert!(jobs.increment_processed(job.id).await.unwrap());
        // Counter is saturated; further increments are no-ops.
        assert!(!jobs.increment_processed(job.id).await.unwrap());

        let loaded = jobs.get(job.id).await.unwrap().unwrap();
        assert_eq!(loaded.processed_files, 2);
    }

    #[tokio::test]
    async fn test_complete_exactly_once() {
        let (ctx, _dir) = setup().await;
        let jobs = ctx.jobs();
        let job = jobs.create("/tmp/in", JobStatus::Running, 1).await.unwrap();

        // Not all files processed yet.
        assert!(!jobs.try_complete(job.id).await.unwrap());

        jobs.increment_processed(job.id).await.unwrap();
        assert!(jobs.try_complete(job.id).await.unwrap());
        // Second attempt loses the status guard.
        assert!(!jobs.try_complete(job.id).await.unwrap());

        let loaded = jobs.get(job.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, JobStatus::Completed);
        assert!(loaded.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_terminal_jobs_are_immutable() {
        let (ctx, _dir) = setup().await;
        let jobs = ctx.jobs();
        let job = jobs.create("/tmp/in", JobStatus::Running, 1).await.unwrap();

        jobs.increment_processed(job.id).await.unwrap();
        jobs.try_complete(job.id).await.unwrap();

        assert!(!jobs.cancel(job.id).await.unwrap());
        assert!(!jobs.mark_failed(job.id).await.unwrap());

        let loaded = jobs.get(job.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_cancel_running_job() {
        let (ctx, _dir) = setup().await;
        let jobs = ctx.jobs();
        let job = jobs.create("/tmp/in", JobStatus::Running, 5).await.unwrap();

        assert!(jobs.cancel(job.id).await.unwrap());
        let loaded = jobs.get(job.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, JobStatus::Cancelled);
        assert!(loaded.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_list_recent() {
        let (ctx, _dir) = setup().await;
        let jobs = ctx.jobs();
        jobs.create("/tmp/a", JobStatus::Running, 1).await.unwrap();
        jobs.create("/tmp/b", JobStatus::Running, 1).await.unwrap();

        let listed = jobs.list_recent(10).await.unwrap();
        assert_eq!(listed.len(), 2);
    }
}
