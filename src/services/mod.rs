//! Business logic services on top of the repository layer.

pub mod evaluate;
pub mod export;
pub mod report;
pub mod scan;

pub use evaluate::{evaluate, DocumentEvaluation, EvaluatorConfig};
pub use export::export_job_csv;
pub use report::{unify_job_pdfs, write_summary_pdf};
pub use scan::{ScanEvent, ScanOptions, ScanService};
