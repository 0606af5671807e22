//! HTTP request handlers.

mod documents_api;
mod export_api;
mod scan_api;

pub use documents_api::{document_fields, job_documents, problematic_documents, unify_documents};
pub use export_api::export_job;
pub use scan_api::{cancel_scan, health, process_scan, scan_status, start_scan};
