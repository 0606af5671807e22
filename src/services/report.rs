//! Output PDF generation.
//!
//! Every successfully processed document gets a one-page summary PDF
//! listing its extracted fields; a whole job can be unified into a single
//! PDF by concatenating those summaries with pdfunite.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use lopdf::{dictionary, Document, Object, Stream};

use crate::repository::{DocumentRepository, FieldRow, ScanJobRepository};

/// Write a one-page summary PDF for a processed document and return its
/// path (`<output_dir>/doc_{id}_output.pdf`).
pub fn write_summary_pdf(
    document_id: i32,
    file_path: &str,
    confidence_score: f64,
    fields: &[FieldRow],
    output_dir: &Path,
) -> anyhow::Result<PathBuf> {
    let file_name = Path::new(file_path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_path.to_string());

    let mut lines = vec![
        format!("Document {}", document_id),
        format!("File: {}", file_name),
        format!("Confidence: {:.2}", confidence_score),
        String::new(),
    ];
    for field in fields {
        lines.push(format!(
            "{}: {}",
            field.field_name,
            field.field_value.as_deref().unwrap_or("<empty>")
        ));
    }

    let bytes = render_text_pdf(&lines)?;

    std::fs::create_dir_all(output_dir)?;
    let pdf_path = output_dir.join(format!("doc_{}_output.pdf", document_id));
    std::fs::write(&pdf_path, bytes)?;
    Ok(pdf_path)
}

/// Concatenate a job's output PDFs into `<output_dir>/unified_job_{id}.pdf`.
///
/// Documents without an output PDF (failed files, or files deleted since)
/// are skipped. A single remaining PDF is returned as-is.
pub async fn unify_job_pdfs(
    jobs: &ScanJobRepository,
    documents: &DocumentRepository,
    job_id: i32,
    output_dir: &Path,
) -> anyhow::Result<PathBuf> {
    let job = jobs
        .get(job_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("scan job {} not found", job_id))?;

    let inputs: Vec<PathBuf> = documents
        .list_by_job(job.id)
        .await?
        .into_iter()
        .filter_map(|doc| doc.output_pdf_path.map(PathBuf::from))
        .filter(|path| path.exists())
        .collect();

    if inputs.is_empty() {
        anyhow::bail!("scan job {} has no output PDFs to unify", job.id);
    }
    if inputs.len() == 1 {
        return Ok(inputs.into_iter().next().unwrap_or_default());
    }

    std::fs::create_dir_all(output_dir)?;
    let unified_path = output_dir.join(format!("unified_job_{}.pdf", job.id));

    let output = Command::new("pdfunite")
        .args(&inputs)
        .arg(&unified_path)
        .output()
        .map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                anyhow::anyhow!("pdfunite not found, install poppler-utils")
            } else {
                anyhow::Error::from(e)
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("pdfunite failed: {}", stderr.trim());
    }
    Ok(unified_path)
}

/// Build a single-page PDF with one text line per entry.
fn render_text_pdf(lines: &[String]) -> anyhow::Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.new_object_id();
    let resources_id = doc.new_object_id();
    let content_id = doc.new_object_id();
    let page_id = doc.new_object_id();

    doc.objects.insert(
        font_id,
        Object::Dictionary(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        }),
    );

    doc.objects.insert(
        resources_id,
        Object::Dictionary(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        }),
    );

    let content_stream = Stream::new(dictionary! {}, render_content(lines).into_bytes());
    doc.objects
        .insert(content_id, Object::Stream(content_stream));

    doc.objects.insert(
        page_id,
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => resources_id,
            "Contents" => content_id,
        }),
    );

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

fn render_content(lines: &[String]) -> String {
    let mut content = String::new();
    content.push_str("BT\n");
    content.push_str("/F1 10 Tf\n");
    content.push_str("50 742 Td\n");
    content.push_str("14 TL\n");

    // One page is plenty for a field summary.
    for line in lines.iter().take(50) {
        content.push_str(&format!("({}) Tj T*\n", escape_pdf_string(line)));
    }

    content.push_str("ET\n");
    content
}

fn escape_pdf_string(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '(' => "\\(".to_string(),
            ')' => "\\)".to_string(),
            '\\' => "\\\\".to_string(),
            c if c.is_ascii() && !c.is_control() => c.to_string(),
            _ => " ".to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobStatus;
    use crate::repository::DbContext;
    use tempfile::tempdir;

    fn sample_fields() -> Vec<FieldRow> {
        vec![
            FieldRow {
                field_name: "first_name".to_string(),
                field_value: Some("Ada (verified)".to_string()),
                is_empty: false,
                is_critical: true,
                confidence: 0.9,
            },
            FieldRow {
                field_name: "phone".to_string(),
                field_value: None,
                is_empty: true,
                is_critical: false,
                confidence: 0.4,
            },
        ]
    }

    #[test]
    fn test_escape_pdf_string() {
        assert_eq!(escape_pdf_string("plain"), "plain");
        assert_eq!(escape_pdf_string("a (b)"), "a \\(b\\)");
        assert_eq!(escape_pdf_string("back\\slash"), "back\\\\slash");
        assert_eq!(escape_pdf_string("caf\u{e9}"), "caf ");
    }

    #[test]
    fn test_write_summary_pdf() {
        let dir = tempdir().unwrap();

        let path =
            write_summary_pdf(7, "/tmp/in/scan.png", 0.65, &sample_fields(), dir.path()).unwrap();
        assert_eq!(path, dir.path().join("doc_7_output.pdf"));

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));

        let reloaded = Document::load(&path).unwrap();
        assert_eq!(reloaded.get_pages().len(), 1);
    }

    async fn setup() -> (DbContext, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::from_sqlite_path(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        (ctx, dir)
    }

    #[tokio::test]
    async fn test_unify_without_output_pdfs_is_an_error() {
        let (ctx, dir) = setup().await;
        let jobs = ctx.jobs();
        let docs = ctx.documents();

        let job = jobs.create("/tmp/in", JobStatus::Running, 1).await.unwrap();
        docs.insert_placeholder(job.id, "/tmp/in/a.png", "png")
            .await
            .unwrap();

        let result = unify_job_pdfs(&jobs, &docs, job.id, dir.path()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_unify_single_document_returns_its_pdf() {
        let (ctx, dir) = setup().await;
        let jobs = ctx.jobs();
        let docs = ctx.documents();

        let job = jobs.create("/tmp/in", JobStatus::Running, 1).await.unwrap();
        let doc = docs
            .insert_placeholder(job.id, "/tmp/in/a.png", "png")
            .await
            .unwrap();

        let pdf_path = write_summary_pdf(doc.id, "/tmp/in/a.png", 0.9, &[], dir.path()).unwrap();
        docs.set_output_pdf_path(doc.id, &pdf_path.display().to_string())
            .await
            .unwrap();

        let unified = unify_job_pdfs(&jobs, &docs, job.id, dir.path()).await.unwrap();
        assert_eq!(unified, pdf_path);
    }
}
