//! Scanned document and extracted field models.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Input file formats the scanner accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Png,
    Jpeg,
    Tiff,
    Bmp,
}

impl FileKind {
    /// Classify a path by extension. Returns `None` for unsupported files.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(FileKind::Pdf),
            "png" => Some(FileKind::Png),
            "jpg" | "jpeg" => Some(FileKind::Jpeg),
            "tif" | "tiff" => Some(FileKind::Tiff),
            "bmp" => Some(FileKind::Bmp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Png => "png",
            FileKind::Jpeg => "jpeg",
            FileKind::Tiff => "tiff",
            FileKind::Bmp => "bmp",
        }
    }

    pub fn is_image(&self) -> bool {
        !matches!(self, FileKind::Pdf)
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One file processed (or queued for processing) within a scan job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannedDocument {
    pub id: i32,
    pub scan_job_id: i32,
    pub file_path: String,
    pub file_type: String,
    pub has_errors: bool,
    pub empty_fields_count: i32,
    /// Mean confidence over extracted fields, in [0, 1].
    pub confidence_score: f64,
    /// Diagnostic reason when extraction failed outright.
    pub error: Option<String>,
    pub output_pdf_path: Option<String>,
    pub scanned_at: DateTime<Utc>,
}

/// A single field extracted from a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentField {
    pub id: i32,
    pub document_id: i32,
    pub field_name: String,
    pub field_value: Option<String>,
    pub is_empty: bool,
    pub is_critical: bool,
    /// Confidence in [0, 1] from the engine that produced the value.
    pub confidence: f64,
    pub extracted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_file_kind_from_path() {
        assert_eq!(
            FileKind::from_path(&PathBuf::from("a/b/scan.PDF")),
            Some(FileKind::Pdf)
        );
        assert_eq!(
            FileKind::from_path(&PathBuf::from("img.jpeg")),
            Some(FileKind::Jpeg)
        );
        assert_eq!(
            FileKind::from_path(&PathBuf::from("img.jpg")),
            Some(FileKind::Jpeg)
        );
        assert_eq!(
            FileKind::from_path(&PathBuf::from("page.tif")),
            Some(FileKind::Tiff)
        );
        assert_eq!(FileKind::from_path(&PathBuf::from("notes.txt")), None);
        assert_eq!(FileKind::from_path(&PathBuf::from("no_extension")), None);
    }

    #[test]
    fn test_file_kind_is_image() {
        assert!(!FileKind::Pdf.is_image());
        assert!(FileKind::Png.is_image());
        assert!(FileKind::Bmp.is_image());
    }
}
