//! Extraction engine abstraction.

use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::models::FileKind;

/// Errors from extraction engines.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Engine not available: {0}")]
    EngineNotAvailable(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),

    #[error("Extraction timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// Timeouts are worth retrying; everything else fails the file outright.
    pub fn is_transient(&self) -> bool {
        matches!(self, ExtractError::Timeout(_))
    }
}

/// A block of recognized text with the engine's confidence in it.
#[derive(Debug, Clone)]
pub struct TextRegion {
    pub text: String,
    /// Confidence in [0, 1].
    pub confidence: f64,
}

/// Available extraction engine types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    /// Native PDF text layer via pdftotext.
    PdfText,
    /// Tesseract OCR via command-line.
    Tesseract,
    /// PaddleOCR via ONNX Runtime.
    PaddleOcr,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::PdfText => "pdftext",
            EngineKind::Tesseract => "tesseract",
            EngineKind::PaddleOcr => "paddleocr",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pdftext" | "pdf" => Some(EngineKind::PdfText),
            "tesseract" => Some(EngineKind::Tesseract),
            "paddleocr" | "paddle" => Some(EngineKind::PaddleOcr),
            _ => None,
        }
    }

    /// Tie-break rank when two engines report identical confidence for a
    /// field. Lower rank wins: native text beats OCR, tesseract beats paddle.
    pub fn priority(&self) -> u8 {
        match self {
            EngineKind::PdfText => 0,
            EngineKind::Tesseract => 1,
            EngineKind::PaddleOcr => 2,
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for extraction engines.
pub trait ExtractionEngine: Send + Sync {
    /// Get the engine type.
    fn kind(&self) -> EngineKind;

    /// Check if this engine is available (binaries installed, models present).
    fn is_available(&self) -> bool;

    /// Get a description of what's needed to make this engine available.
    fn availability_hint(&self) -> String;

    /// Whether the engine can handle this file format at all.
    fn supports(&self, file: FileKind) -> bool;

    /// Extract text regions from a file.
    fn extract(&self, path: &Path, file: FileKind) -> Result<Vec<TextRegion>, ExtractError>;
}
