//! Diesel row records and insert types.
//!
//! Records mirror the database schema exactly (text timestamps, integer
//! booleans); conversion to domain models happens in the repositories.

use diesel::prelude::*;

use crate::schema::{document_fields, scan_jobs, scanned_documents};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = scan_jobs)]
pub struct ScanJobRecord {
    pub id: i32,
    pub folder_path: String,
    pub status: String,
    pub total_files: i32,
    pub processed_files: i32,
    pub csv_path: Option<String>,
    pub created_at: String,
    pub completed_at: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = scan_jobs)]
pub struct NewScanJob {
    pub folder_path: String,
    pub status: String,
    pub total_files: i32,
    pub processed_files: i32,
    pub created_at: String,
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = scanned_documents)]
pub struct ScannedDocumentRecord {
    pub id: i32,
    pub scan_job_id: i32,
    pub file_path: String,
    pub file_type: String,
    pub has_errors: i32,
    pub empty_fields_count: i32,
    pub confidence_score: f64,
    pub error: Option<String>,
    pub output_pdf_path: Option<String>,
    pub scanned_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = scanned_documents)]
pub struct NewScannedDocument {
    pub scan_job_id: i32,
    pub file_path: String,
    pub file_type: String,
    pub has_errors: i32,
    pub empty_fields_count: i32,
    pub confidence_score: f64,
    pub scanned_at: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = document_fields)]
pub struct DocumentFieldRecord {
    pub id: i32,
    pub document_id: i32,
    pub field_name: String,
    pub field_value: Option<String>,
    pub is_empty: i32,
    pub is_critical: i32,
    pub confidence: f64,
    pub extracted_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = document_fields)]
pub struct NewDocumentField {
    pub document_id: i32,
    pub field_name: String,
    pub field_value: Option<String>,
    pub is_empty: i32,
    pub is_critical: i32,
    pub confidence: f64,
    pub extracted_at: String,
}

/// An evaluated field value ready for persistence.
#[derive(Debug, Clone)]
pub struct FieldRow {
    pub field_name: String,
    pub field_value: Option<String>,
    pub is_empty: bool,
    pub is_critical: bool,
    pub confidence: f64,
}

/// Helper for retrieving the rowid of the last insert.
///
/// Must run on the same connection that performed the insert.
#[derive(QueryableByName)]
pub struct LastInsertRowId {
    #[diesel(sql_type = diesel::sql_types::BigInt, column_name = "last_insert_rowid()")]
    pub id: i64,
}
