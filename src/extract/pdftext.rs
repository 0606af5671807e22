//! Native PDF text extraction via pdftotext.

use std::io;
use std::path::Path;
use std::process::Command;

use super::engine::{EngineKind, ExtractError, ExtractionEngine, TextRegion};
use super::tools::check_binary;
use crate::models::FileKind;

/// Reads the embedded text layer of a PDF. No OCR involved, so the
/// confidence of anything it returns is 1.0. Scanned PDFs without a text
/// layer yield no regions.
pub struct PdfTextEngine;

impl ExtractionEngine for PdfTextEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::PdfText
    }

    fn is_available(&self) -> bool {
        check_binary("pdftotext")
    }

    fn availability_hint(&self) -> String {
        "Install poppler-utils (provides pdftotext)".to_string()
    }

    fn supports(&self, file: FileKind) -> bool {
        matches!(file, FileKind::Pdf)
    }

    fn extract(&self, path: &Path, _file: FileKind) -> Result<Vec<TextRegion>, ExtractError> {
        let output = Command::new("pdftotext")
            .arg("-layout")
            .arg(path)
            .arg("-")
            .output();

        match output {
            Ok(output) if output.status.success() => {
                let text = String::from_utf8_lossy(&output.stdout);
                if text.trim().is_empty() {
                    return Ok(Vec::new());
                }
                Ok(vec![TextRegion {
                    text: text.into_owned(),
                    confidence: 1.0,
                }])
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ExtractError::ExtractionFailed(format!(
                    "pdftotext failed: {}",
                    stderr.trim()
                )))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(
                ExtractError::EngineNotAvailable(self.availability_hint()),
            ),
            Err(e) => Err(ExtractError::Io(e)),
        }
    }
}
