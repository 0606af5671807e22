//! Core domain models for scan jobs and scanned documents.

pub mod document;
pub mod job;

pub use document::{DocumentField, FileKind, ScannedDocument};
pub use job::{JobStatus, ScanJob};
