//! Configuration loading.
//!
//! Settings come from an optional TOML file with environment overrides
//! for the paths that differ between deployments.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::extract::{EngineMode, FieldExtractor};
use crate::repository::DbContext;
use crate::services::{EvaluatorConfig, ScanOptions, ScanService};

pub const DEFAULT_CONFIG_FILE: &str = "fieldscan.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Directory CSV exports are written into.
    pub export_dir: PathBuf,
    /// Directory summary and unified PDFs are written into.
    pub output_dir: PathBuf,
    /// Worker pool size for job processing.
    pub workers: usize,
    /// Per-file extraction timeout in seconds.
    pub file_timeout_secs: u64,
    /// Extra attempts after a timed-out extraction.
    pub max_retries: u32,
    /// "combine" or a single engine name (pdftext, tesseract, paddleocr).
    pub engine: String,
    /// Tesseract language code.
    pub ocr_language: String,
    /// Field names that must be non-empty for a document to be valid.
    pub critical_fields: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("fieldscan.db"),
            export_dir: PathBuf::from("exports"),
            output_dir: PathBuf::from("outputs"),
            workers: 4,
            file_timeout_secs: 120,
            max_retries: 1,
            engine: "combine".to_string(),
            ocr_language: "eng".to_string(),
            critical_fields: vec![
                "first_name".to_string(),
                "last_name".to_string(),
                "id_number".to_string(),
            ],
        }
    }
}

impl Settings {
    /// Load settings.
    ///
    /// An explicitly given config path must exist; otherwise the default
    /// file is used when present. `FIELDSCAN_DATABASE`,
    /// `FIELDSCAN_EXPORT_DIR`, and `FIELDSCAN_OUTPUT_DIR` override the file.
    pub fn load(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let mut settings = match config_path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                toml::from_str(&raw)?
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    toml::from_str(&std::fs::read_to_string(default_path)?)?
                } else {
                    Self::default()
                }
            }
        };

        if let Ok(db) = std::env::var("FIELDSCAN_DATABASE") {
            settings.database_path = PathBuf::from(db);
        }
        if let Ok(dir) = std::env::var("FIELDSCAN_EXPORT_DIR") {
            settings.export_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("FIELDSCAN_OUTPUT_DIR") {
            settings.output_dir = PathBuf::from(dir);
        }

        Ok(settings)
    }

    pub fn create_db_context(&self) -> DbContext {
        DbContext::from_sqlite_path(&self.database_path)
    }

    pub fn engine_mode(&self) -> anyhow::Result<EngineMode> {
        EngineMode::from_str(&self.engine)
            .ok_or_else(|| anyhow::anyhow!("unknown engine mode: {}", self.engine))
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            workers: self.workers.max(1),
            file_timeout: Duration::from_secs(self.file_timeout_secs),
            max_retries: self.max_retries,
            output_dir: self.output_dir.clone(),
        }
    }

    /// Wire up a scan service from these settings.
    pub fn build_service(&self, ctx: &DbContext) -> anyhow::Result<ScanService> {
        let extractor =
            FieldExtractor::with_default_engines(self.engine_mode()?, &self.ocr_language);
        let evaluator = EvaluatorConfig::new(self.critical_fields.iter().cloned());
        Ok(ScanService::new(ctx, extractor, evaluator, self.scan_options()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.workers, 4);
        assert_eq!(settings.engine, "combine");
        assert_eq!(settings.critical_fields.len(), 3);
        assert!(settings.engine_mode().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings =
            toml::from_str("workers = 8\nengine = \"tesseract\"").unwrap();
        assert_eq!(settings.workers, 8);
        assert_eq!(settings.engine, "tesseract");
        assert_eq!(settings.ocr_language, "eng");
        assert_eq!(settings.database_path, PathBuf::from("fieldscan.db"));
    }

    #[test]
    fn test_bad_engine_mode_rejected() {
        let settings: Settings = toml::from_str("engine = \"nope\"").unwrap();
        assert!(settings.engine_mode().is_err());
    }
}
