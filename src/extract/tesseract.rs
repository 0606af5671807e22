//! Tesseract OCR engine via command-line.
//!
//! Runs tesseract in TSV mode to get per-word confidences, and rasterizes
//! PDFs through pdftoppm at 300 DPI before recognition.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::engine::{EngineKind, ExtractError, ExtractionEngine, TextRegion};
use super::tools::check_binary;
use crate::models::FileKind;

pub struct TesseractEngine {
    language: String,
}

impl TesseractEngine {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    /// OCR one image, producing a region per recognized line.
    fn ocr_image(&self, image_path: &Path) -> Result<Vec<TextRegion>, ExtractError> {
        let output = Command::new("tesseract")
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.language])
            .arg("tsv")
            .output();

        match output {
            Ok(output) if output.status.success() => {
                Ok(parse_tsv(&String::from_utf8_lossy(&output.stdout)))
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ExtractError::ExtractionFailed(format!(
                    "tesseract failed: {}",
                    stderr.trim()
                )))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(
                ExtractError::EngineNotAvailable(self.availability_hint()),
            ),
            Err(e) => Err(ExtractError::Io(e)),
        }
    }

    /// Rasterize every page of a PDF into a scratch directory.
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
                if pages.is_empty() {
                    return Err(ExtractError::ExtractionFailed(format!(
                        "pdftoppm produced no pages for {}",
                        pdf_path.display()
                    )));
                }
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

impl ExtractionEngine for TesseractEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Tesseract
    }

    fn is_available(&self) -> bool {
        check_binary("tesseract")
    }

    fn availability_hint(&self) -> String {
        "Install tesseract-ocr (and poppler-utils for PDF input)".to_string()
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

/// Parse tesseract TSV output into one region per text line.
///
/// TSV columns: level page block par line word left top width height conf text.
/// Word confidences are 0-100; structural rows carry conf -1 and no text.
fn parse_tsv(tsv: &str) -> Vec<TextRegion> {
    let mut regions: Vec<TextRegion> = Vec::new();
    let mut current_key: Option<(u32, u32, u32, u32)> = None;
    let mut words: Vec<String> = Vec::new();
    let mut confidences: Vec<f64> = Vec::new();

    let mut flush = |words: &mut Vec<String>, confidences: &mut Vec<f64>, out: &mut Vec<TextRegion>| {
        if words.is_empty() {
            return;
        }
        let confidence =
            confidences.iter().sum::<f64>() / confidences.len().max(1) as f64 / 100.0;
        out.push(TextRegion {
            text: words.join(" "),
            confidence: confidence.clamp(0.0, 1.0),
        });
        words.clear();
        confidences.clear();
    };

    for line in tsv.lines().skip(1) {
        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() < 12 {
            continue;
        }
        let conf: f64 = cols[10].parse().unwrap_or(-1.0);
        let text = cols[11].trim();
        if conf < 0.0 || text.is_empty() {
            continue;
        }

        let key = (
            cols[1].parse().unwrap_or(0),
            cols[2].parse().unwrap_or(0),
            cols[3].parse().unwrap_or(0),
            cols[4].parse().unwrap_or(0),
        );
        if current_key != Some(key) {
            flush(&mut words, &mut confidences, &mut regions);
            current_key = Some(key);
        }
        words.push(text.to_string());
        confidences.push(conf);
    }
    flush(&mut words, &mut confidences, &mut regions);

    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    fn word_row(page: u32, block: u32, par: u32, line: u32, word: u32, conf: f64, text: &str) -> String {
        format!("5\t{page}\t{block}\t{par}\t{line}\t{word}\t0\t0\t10\t10\t{conf}\t{text}")
    }

    #[test]
    fn test_parse_tsv_groups_lines() {
        let tsv = [
            HEADER.to_string(),
            // Structural row, no text
            "4\t1\t1\t1\t1\t0\t0\t0\t100\t20\t-1\t".to_string(),
            word_row(1, 1, 1, 1, 1, 90.0, "First"),
            word_row(1, 1, 1, 1, 2, 80.0, "Name:"),
            word_row(1, 1, 1, 1, 3, 70.0, "Ada"),
            word_row(1, 1, 1, 2, 1, 50.0, "Phone:"),
            word_row(1, 1, 1, 2, 2, 60.0, "555-0100"),
        ]
        .join("\n");

        let regions = parse_tsv(&tsv);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].text, "First Name: Ada");
        assert!((regions[0].confidence - 0.8).abs() < 1e-9);
        assert_eq!(regions[1].text, "Phone: 555-0100");
        assert!((regions[1].confidence - 0.55).abs() < 1e-9);
    }

    #[test]
    fn test_parse_tsv_empty() {
        assert!(parse_tsv(HEADER).is_empty());
        assert!(parse_tsv("").is_empty());
    }
}
