//! Field extraction: engines, field patterns, and multi-engine orchestration.
//!
//! Engines wrap external capabilities (poppler, tesseract, optional
//! PaddleOCR) behind the `ExtractionEngine` trait; the `FieldExtractor`
//! adapter runs one or all of them and merges field candidates.

pub mod adapter;
pub mod engine;
pub mod fields;
#[cfg(feature = "ocr-paddle")]
pub mod paddle;
pub mod pdftext;
pub mod tesseract;
pub mod tools;

pub use adapter::{EngineMode, FieldCandidate, FieldExtractor};
pub use engine::{EngineKind, ExtractError, ExtractionEngine, TextRegion};
