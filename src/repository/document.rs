//! Scanned document and field repository.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::{
    DocumentFieldRecord, FieldRow, LastInsertRowId, NewDocumentField, NewScannedDocument,
    ScannedDocumentRecord,
};
use super::pool::{AsyncSqlitePool, DieselError};
use super::parse_datetime;
use crate::models::{DocumentField, ScannedDocument};
use crate::schema::{document_fields, scanned_documents};

impl From<ScannedDocumentRecord> for ScannedDocument {
    fn from(record: ScannedDocumentRecord) -> Self {
        ScannedDocument {
            id: record.id,
            scan_job_id: record.scan_job_id,
            file_path: record.file_path,
            file_type: record.file_type,
            has_errors: record.has_errors != 0,
            empty_fields_count: record.empty_fields_count,
            confidence_score: record.confidence_score,
            error: record.error,
            output_pdf_path: record.output_pdf_path,
            scanned_at: parse_datetime(&record.scanned_at),
        }
    }
}

impl From<DocumentFieldRecord> for DocumentField {
    fn from(record: DocumentFieldRecord) -> Self {
        DocumentField {
            id: record.id,
            document_id: record.document_id,
            field_name: record.field_name,
            field_value: record.field_value,
            is_empty: record.is_empty != 0,
            is_critical: record.is_critical != 0,
            confidence: record.confidence,
            extracted_at: parse_datetime(&record.extracted_at),
        }
    }
}

/// Diesel-based document repository with compile-time query checking.
#[derive(Clone)]
pub struct DocumentRepository {
    pool: AsyncSqlitePool,
}

impl DocumentRepository {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a placeholder row for a file discovered during folder walking.
    ///
    /// Results are filled in later by `record_result` or `record_failure`.
    pub async fn insert_placeholder(
        &self,
        scan_job_id: i32,
        file_path: &str,
        file_type: &str,
    ) -> Result<ScannedDocument, DieselError> {
        let mut conn = self.pool.get().await?;
        let now = Utc::now();

        let record = NewScannedDocument {
            scan_job_id,
            file_path: file_path.to_string(),
            file_type: file_type.to_string(),
            has_errors: 0,
            empty_fields_count: 0,
            confidence_score: 0.0,
            scanned_at: now.to_rfc3339(),
        };

        diesel::insert_into(scanned_documents::table)
            .values(&record)
            .execute(&mut conn)
            .await?;

        let row: LastInsertRowId = diesel::sql_query("SELECT last_insert_rowid()")
            .get_result(&mut conn)
            .await?;

        Ok(ScannedDocument {
            id: row.id as i32,
            scan_job_id,
            file_path: file_path.to_string(),
            file_type: file_type.to_string(),
            has_errors: false,
            empty_fields_count: 0,
            confidence_score: 0.0,
            error: None,
            output_pdf_path: None,
            scanned_at: now,
        })
    }

    pub async fn get(&self, document_id: i32) -> Result<Option<ScannedDocument>, DieselError> {
        let mut conn = self.pool.get().await?;
        let record: Option<ScannedDocumentRecord> = scanned_documents::table
            .filter(scanned_documents::id.eq(document_id))
            .first(&mut conn)
            .await
            .optional()?;
        Ok(record.map(ScannedDocument::from))
    }

    pub async fn list_by_job(&self, scan_job_id: i32) -> Result<Vec<ScannedDocument>, DieselError> {
        let mut conn = self.pool.get().await?;
        let records: Vec<ScannedDocumentRecord> = scanned_documents::table
            .filter(scanned_documents::scan_job_id.eq(scan_job_id))
            .order(scanned_documents::id.asc())
            .load(&mut conn)
            .await?;
        Ok(records.into_iter().map(ScannedDocument::from).collect())
    }

    /// Documents of a job with `has_errors` set.
    pub async fn list_problematic(
        &self,
        scan_job_id: i32,
    ) -> Result<Vec<ScannedDocument>, DieselError> {
        let mut conn = self.pool.get().await?;
        let records: Vec<ScannedDocumentRecord> = scanned_documents::table
            .filter(
                scanned_documents::scan_job_id
                    .eq(scan_job_id)
                    .and(scanned_documents::has_errors.ne(0)),
            )
            .order(scanned_documents::id.asc())
            .load(&mut conn)
            .await?;
        Ok(records.into_iter().map(ScannedDocument::from).collect())
    }

    /// Store the evaluation outcome for a document and replace its fields.
    pub async fn record_result(
        &self,
        document_id: i32,
        has_errors: bool,
        empty_fields_count: i32,
        confidence_score: f64,
        fields: &[FieldRow],
    ) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;
        let now = Utc::now().to_rfc3339();

        diesel::update(scanned_documents::table.filter(scanned_documents::id.eq(document_id)))
            .set((
                scanned_documents::has_errors.eq(has_errors as i32),
                scanned_documents::empty_fields_count.eq(empty_fields_count),
                scanned_documents::confidence_score.eq(confidence_score),
                scanned_documents::error.eq(None::<String>),
                scanned_documents::scanned_at.eq(&now),
            ))
            .execute(&mut conn)
            .await?;

        // Reprocessing replaces any previous extraction.
        diesel::delete(
            document_fields::table.filter(document_fields::document_id.eq(document_id)),
        )
        .execute(&mut conn)
        .await?;

        let rows: Vec<NewDocumentField> = fields
            .iter()
            .map(|f| NewDocumentField {
                document_id,
                field_name: f.field_name.clone(),
                field_value: f.field_value.clone(),
                is_empty: f.is_empty as i32,
                is_critical: f.is_critical as i32,
                confidence: f.confidence,
                extracted_at: now.clone(),
            })
            .collect();

        // SQLite via SyncConnectionWrapper cannot execute multi-row batch
        // inserts through the generic async path, so insert row by row.
        for row in &rows {
            diesel::insert_into(document_fields::table)
                .values(row)
                .execute(&mut conn)
                .await?;
        }

        Ok(())
    }

    /// Mark a document as failed with a diagnostic reason.
    pub async fn record_failure(
        &self,
        document_id: i32,
        reason: &str,
    ) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;
        let now = Utc::now().to_rfc3339();
        diesel::update(scanned_documents::table.filter(scanned_documents::id.eq(document_id)))
            .set((
                scanned_documents::has_errors.eq(1),
                scanned_documents::confidence_score.eq(0.0),
                scanned_documents::error.eq(Some(reason.to_string())),
                scanned_documents::scanned_at.eq(&now),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Record where the document's summary PDF was written.
    pub async fn set_output_pdf_path(
        &self,
        document_id: i32,
        pdf_path: &str,
    ) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;
        diesel::update(scanned_documents::table.filter(scanned_documents::id.eq(document_id)))
            .set(scanned_documents::output_pdf_path.eq(Some(pdf_path.to_string())))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    pub async fn fields(&self, document_id: i32) -> Result<Vec<DocumentField>, DieselError> {
        let mut conn = self.pool.get().await?;
        let records: Vec<DocumentFieldRecord> = document_fields::table
            .filter(document_fields::document_id.eq(document_id))
            .order(document_fields::field_name.asc())
            .load(&mut conn)
            .await?;
        Ok(records.into_iter().map(DocumentField::from).collect())
    }
}
