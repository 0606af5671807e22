//! Multi-engine field extraction.
//!
//! Runs a single engine or every available engine over a file, parses the
//! recognized text through the field patterns, and merges candidates per
//! field name.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, warn};

use super::engine::{EngineKind, ExtractError, ExtractionEngine};
use super::fields::{parse_fields, RawField};
use super::pdftext::PdfTextEngine;
use super::tesseract::TesseractEngine;
use crate::models::FileKind;

/// Which engines to run for each file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    /// One specific engine; errors if it cannot handle the file.
    Single(EngineKind),
    /// All available engines; per field the best candidate wins.
    Combine,
}

impl EngineMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "combine" | "all" => Some(EngineMode::Combine),
            other => EngineKind::from_str(other).map(EngineMode::Single),
        }
    }
}

/// The winning value for one field after merging.
#[derive(Debug, Clone)]
pub struct FieldCandidate {
    pub value: String,
    pub confidence: f64,
    pub engine: EngineKind,
}

/// Field extraction adapter over a set of engines.
pub struct FieldExtractor {
    engines: Vec<Box<dyn ExtractionEngine>>,
    mode: EngineMode,
}

impl FieldExtractor {
    pub fn new(engines: Vec<Box<dyn ExtractionEngine>>, mode: EngineMode) -> Self {
        Self { engines, mode }
    }

    /// Build with the standard engine set.
    pub fn with_default_engines(mode: EngineMode, ocr_language: &str) -> Self {
        #[allow(unused_mut)]
        let mut engines: Vec<Box<dyn ExtractionEngine>> = vec![
            Box::new(PdfTextEngine),
            Box::new(TesseractEngine::new(ocr_language)),
        ];
        #[cfg(feature = "ocr-paddle")]
        engines.push(Box::new(super::paddle::PaddleEngine::new(
            std::env::var("FIELDSCAN_PADDLE_MODELS").unwrap_or_else(|_| "models".to_string()),
        )));
        Self::new(engines, mode)
    }

    pub fn mode(&self) -> EngineMode {
        self.mode
    }

    /// Extract and merge fields from one file.
    pub fn extract(
        &self,
        path: &Path,
        file: FileKind,
    ) -> Result<BTreeMap<String, FieldCandidate>, ExtractError> {
        match self.mode {
            EngineMode::Single(kind) => self.extract_single(path, file, kind),
            EngineMode::Combine => self.extract_combined(path, file),
        }
    }

    fn extract_single(
        &self,
        path: &Path,
        file: FileKind,
        kind: EngineKind,
    ) -> Result<BTreeMap<String, FieldCandidate>, ExtractError> {
        let engine = self
            .engines
            .iter()
            .find(|e| e.kind() == kind)
            .ok_or_else(|| {
                ExtractError::EngineNotAvailable(format!("engine {} is not configured", kind))
            })?;

        if !engine.is_available() {
            return Err(ExtractError::EngineNotAvailable(engine.availability_hint()));
        }
        if !engine.supports(file) {
            return Err(ExtractError::UnsupportedFile(format!(
                "{} cannot read {} files",
                kind, file
            )));
        }

        let regions = engine.extract(path, file)?;
        let mut merged = BTreeMap::new();
        merge_fields(&mut merged, parse_fields(&regions), kind);
        Ok(merged)
    }

    fn extract_combined(
        &self,
        path: &Path,
        file: FileKind,
    ) -> Result<BTreeMap<String, FieldCandidate>, ExtractError> {
        let mut merged = BTreeMap::new();
        let mut any_succeeded = false;
        let mut last_error: Option<ExtractError> = None;

        for engine in &self.engines {
            if !engine.supports(file) || !engine.is_available() {
                continue;
            }
            match engine.extract(path, file) {
                Ok(regions) => {
                    debug!(
                        engine = %engine.kind(),
                        regions = regions.len(),
                        file = %path.display(),
                        "engine finished"
                    );
                    any_succeeded = true;
                    merge_fields(&mut merged, parse_fields(&regions), engine.kind());
                }
                Err(e) => {
                    warn!(engine = %engine.kind(), file = %path.display(), "engine failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        if !any_succeeded {
            return Err(last_error.unwrap_or_else(|| {
                ExtractError::EngineNotAvailable(format!(
                    "no available engine can read {} files",
                    file
                ))
            }));
        }
        Ok(merged)
    }
}

/// Merge field candidates: highest confidence wins; an exact confidence
/// tie goes to the engine with the better fixed priority. Values are never
/// averaged across engines.
fn merge_fields(
    merged: &mut BTreeMap<String, FieldCandidate>,
    fields: Vec<RawField>,
    engine: EngineKind,
) {
    for field in fields {
        let candidate = FieldCandidate {
            value: field.value,
            confidence: field.confidence,
            engine,
        };
        match merged.get_mut(field.name) {
            Some(existing) => {
                if beats(&candidate, existing) {
                    *existing = candidate;
                }
            }
            None => {
                merged.insert(field.name.to_string(), candidate);
            }
        }
    }
}

fn beats(candidate: &FieldCandidate, existing: &FieldCandidate) -> bool {
    candidate.confidence > existing.confidence
        || (candidate.confidence == existing.confidence
            && candidate.engine.priority() < existing.engine.priority())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::engine::TextRegion;

    struct StubEngine {
        kind: EngineKind,
        regions: Vec<TextRegion>,
        available: bool,
        fail: bool,
    }

    impl StubEngine {
        fn new(kind: EngineKind, text: &str, confidence: f64) -> Self {
            Self {
                kind,
                regions: vec![TextRegion {
                    text: text.to_string(),
                    confidence,
                }],
                available: true,
                fail: false,
            }
        }

        fn failing(kind: EngineKind) -> Self {
            Self {
                kind,
                regions: Vec::new(),
                available: true,
                fail: true,
            }
        }
    }

    impl ExtractionEngine for StubEngine {
        fn kind(&self) -> EngineKind {
            self.kind
        }
        fn is_available(&self) -> bool {
            self.available
        }
        fn availability_hint(&self) -> String {
            "stub".to_string()
        }
        fn supports(&self, _file: FileKind) -> bool {
            true
        }
        fn extract(
            &self,
            _path: &Path,
            _file: FileKind,
        ) -> Result<Vec<TextRegion>, ExtractError> {
            if self.fail {
                return Err(ExtractError::ExtractionFailed("stub failure".to_string()));
            }
            Ok(self.regions.clone())
        }
    }

    fn extract(extractor: &FieldExtractor) -> BTreeMap<String, FieldCandidate> {
        extractor
            .extract(Path::new("ignored.png"), FileKind::Png)
            .unwrap()
    }

    #[test]
    fn test_combine_highest_confidence_wins() {
        let extractor = FieldExtractor::new(
            vec![
                Box::new(StubEngine::new(
                    EngineKind::PdfText,
                    "Invoice Number: A-100",
                    0.81,
                )),
                Box::new(StubEngine::new(
                    EngineKind::Tesseract,
                    "Invoice Number: B-200",
                    0.93,
                )),
            ],
            EngineMode::Combine,
        );

        let fields = extract(&extractor);
        let winner = &fields["invoice_number"];
        assert_eq!(winner.value, "B-200");
        assert_eq!(winner.confidence, 0.93);
        assert_eq!(winner.engine, EngineKind::Tesseract);
    }

    #[test]
    fn test_combine_tie_broken_by_priority() {
        // Insertion order is worst-priority first; the tie must still go
        // to the pdf text engine.
        let extractor = FieldExtractor::new(
            vec![
                Box::new(StubEngine::new(
                    EngineKind::Tesseract,
                    "First Name: Tessa",
                    0.9,
                )),
                Box::new(StubEngine::new(
                    EngineKind::PdfText,
                    "First Name: Portia",
                    0.9,
                )),
            ],
            EngineMode::Combine,
        );

        let fields = extract(&extractor);
        assert_eq!(fields["first_name"].value, "Portia");
        assert_eq!(fields["first_name"].engine, EngineKind::PdfText);
    }

    #[test]
    fn test_combine_tolerates_one_failing_engine() {
        let extractor = FieldExtractor::new(
            vec![
                Box::new(StubEngine::failing(EngineKind::PdfText)),
                Box::new(StubEngine::new(EngineKind::Tesseract, "Phone: 555", 0.6)),
            ],
            EngineMode::Combine,
        );

        let fields = extract(&extractor);
        assert_eq!(fields["phone"].value, "555");
    }

    #[test]
    fn test_combine_all_engines_failing_is_an_error() {
        let extractor = FieldExtractor::new(
            vec![
                Box::new(StubEngine::failing(EngineKind::PdfText)),
                Box::new(StubEngine::failing(EngineKind::Tesseract)),
            ],
            EngineMode::Combine,
        );

        let result = extractor.extract(Path::new("ignored.png"), FileKind::Png);
        assert!(matches!(result, Err(ExtractError::ExtractionFailed(_))));
    }

    #[test]
    fn test_single_mode_unavailable_engine() {
        let mut stub = StubEngine::new(EngineKind::Tesseract, "Phone: 555", 0.6);
        stub.available = false;
        let extractor =
            FieldExtractor::new(vec![Box::new(stub)], EngineMode::Single(EngineKind::Tesseract));

        let result = extractor.extract(Path::new("ignored.png"), FileKind::Png);
        assert!(matches!(result, Err(ExtractError::EngineNotAvailable(_))));
    }

    #[test]
    fn test_engine_mode_parsing() {
        assert_eq!(EngineMode::from_str("combine"), Some(EngineMode::Combine));
        assert_eq!(
            EngineMode::from_str("tesseract"),
            Some(EngineMode::Single(EngineKind::Tesseract))
        );
        assert_eq!(
            EngineMode::from_str("PDFTEXT"),
            Some(EngineMode::Single(EngineKind::PdfText))
        );
        assert_eq!(EngineMode::from_str("nope"), None);
    }
}
