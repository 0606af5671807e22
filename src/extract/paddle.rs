//! PaddleOCR engine via ONNX Runtime (paddle-ocr-rs).
//!
//! Model initialization is expensive, so a single engine instance is
//! created lazily and shared process-wide behind a mutex.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Mutex, OnceLock};

use paddle_ocr_rs::ocr_lite::OcrLite;

use super::engine::{EngineKind, ExtractError, ExtractionEngine, TextRegion};
use crate::models::FileKind;

const DET_MODEL_NAME: &str = "ch_PP-OCRv4_det_infer.onnx";
const CLS_MODEL_NAME: &str = "ch_ppocr_mobile_v2.0_cls_infer.onnx";
const REC_MODEL_NAME: &str = "ch_PP-OCRv4_rec_infer.onnx";

/// Global cached engine; initializing ONNX models takes seconds.
static OCR_ENGINE: OnceLock<Mutex<OcrLite>> = OnceLock::new();

pub struct PaddleEngine {
    model_dir: PathBuf,
}

impl PaddleEngine {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
        }
    }

    fn find_models(&self) -> Result<(String, String, String), ExtractError> {
        let det = self.model_dir.join(DET_MODEL_NAME);
        let cls = self.model_dir.join(CLS_MODEL_NAME);
        let rec = self.model_dir.join(REC_MODEL_NAME);

        if det.exists() && rec.exists() {
            return Ok((
                det.to_string_lossy().to_string(),
                cls.to_string_lossy().to_string(),
                rec.to_string_lossy().to_string(),
            ));
        }

        Err(ExtractError::EngineNotAvailable(format!(
            "PaddleOCR models not found in {}",
            self.model_dir.display()
        )))
    }

    /// Get or initialize the cached OCR engine.
    fn get_or_init_engine(&self) -> Result<&'static Mutex<OcrLite>, ExtractError> {
        if let Some(engine) = OCR_ENGINE.get() {
            return Ok(engine);
        }

        let (det_model, cls_model, rec_model) = self.find_models()?;

        let mut ocr = OcrLite::new();
        let num_threads = 4;
        ocr.init_models(&det_model, &cls_model, &rec_model, num_threads)
            .map_err(|e| {
                ExtractError::ExtractionFailed(format!("Failed to init PaddleOCR: {}", e))
            })?;

        // If another thread beat us to it, use the instance that won.
        let _ = OCR_ENGINE.set(Mutex::new(ocr));
        OCR_ENGINE.get().ok_or_else(|| {
            ExtractError::ExtractionFailed("Failed to cache OCR engine".to_string())
        })
    }

    fn ocr_image(&self, image_path: &Path) -> Result<Vec<TextRegion>, ExtractError> {
        let engine_mutex = self.get_or_init_engine()?;
        let mut ocr = engine_mutex.lock().map_err(|e| {
            ExtractError::ExtractionFailed(format!("Failed to lock OCR engine: {}", e))
        })?;

        let result = ocr
            .detect_from_path(
                image_path.to_str().unwrap_or(""),
                50,    // padding
                1024,  // max side length
                0.5,   // box score threshold
                0.3,   // unclip ratio
                1.6,   // box threshold
                false, // do angle
                false, // most angle
            )
            .map_err(|e| {
                ExtractError::ExtractionFailed(format!("PaddleOCR detection failed: {}", e))
            })?;

        Ok(result
            .text_blocks
            .iter()
            .filter(|block| !block.text.trim().is_empty())
            .map(|block| TextRegion {
                text: block.text.clone(),
                confidence: (block.box_score as f64).clamp(0.0, 1.0),
            })
            .collect())
    }

    fn rasterize_pdf(&self, pdf_path: &Path, output_dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
        let prefix = output_dir.join("page");
        let status = Command::new("pdftoppm")
            .args(["-png", "-r", "300"])
            .arg(pdf_path)
            .arg(&prefix)
            .status();

        match status {
            Ok(status) if status.success() => {
                let mut pages: Vec<PathBuf> = std::fs::read_dir(output_dir)?
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.path())
                    .filter(|p| p.extension().map(|e| e == "png").unwrap_or(false))
                    .collect();
                pages.sort();
                Ok(pages)
            }
            Ok(_) => Err(ExtractError::ExtractionFailed(format!(
                "pdftoppm failed for {}",
                pdf_path.display()
            ))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ExtractError::EngineNotAvailable(
                "Install poppler-utils (provides pdftoppm)".to_string(),
            )),
            Err(e) => Err(ExtractError::Io(e)),
        }
    }
}

impl ExtractionEngine for PaddleEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::PaddleOcr
    }

    fn is_available(&self) -> bool {
        self.find_models().is_ok()
    }

    fn availability_hint(&self) -> String {
        format!(
            "Place PaddleOCR ONNX models ({}, {}, {}) in {}",
            DET_MODEL_NAME,
            CLS_MODEL_NAME,
            REC_MODEL_NAME,
            self.model_dir.display()
        )
    }

    fn supports(&self, _file: FileKind) -> bool {
        true
    }

    fn extract(&self, path: &Path, file: FileKind) -> Result<Vec<TextRegion>, ExtractError> {
        match file {
            FileKind::Pdf => {
                let scratch = tempfile::tempdir()?;
                let pages = self.rasterize_pdf(path, scratch.path())?;
                let mut regions = Vec::new();
                for page in pages {
                    regions.extend(self.ocr_image(&page)?);
                }
                Ok(regions)
            }
            _ => self.ocr_image(path),
        }
    }
}
