//! CSV export of scan job results.
//!
//! One row per (document, field) pair; documents without fields still get
//! a row so failed files show up in the export.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::repository::{DocumentRepository, ScanJobRepository};

const CSV_HEADER: &str = "document_id,file_path,file_type,has_errors,empty_fields_count,confidence_score,field_name,field_value,is_empty,is_critical,field_confidence";

/// Write the results of a job as CSV under `output_dir` and record the
/// path on the job. Returns the path written.
pub async fn export_job_csv(
    jobs: &ScanJobRepository,
    documents: &DocumentRepository,
    job_id: i32,
    output_dir: &Path,
) -> anyhow::Result<PathBuf> {
    let job = jobs
        .get(job_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("scan job {} not found", job_id))?;

    let mut output = String::new();
    output.push_str(CSV_HEADER);
    output.push('\n');

    for doc in documents.list_by_job(job.id).await? {
        let doc_prefix = format!(
            "{},{},{},{},{},{}",
            doc.id,
            escape_csv(&doc.file_path),
            doc.file_type,
            doc.has_errors,
            doc.empty_fields_count,
            doc.confidence_score,
        );

        let fields = documents.fields(doc.id).await?;
        if fields.is_empty() {
            writeln!(output, "{},,,,,", doc_prefix).ok();
            continue;
        }
        for field in fields {
            writeln!(
                output,
                "{},{},{},{},{},{}",
                doc_prefix,
                field.field_name,
                escape_csv(field.field_value.as_deref().unwrap_or("")),
                field.is_empty,
                field.is_critical,
                field.confidence,
            )
            .ok();
        }
    }

    std::fs::create_dir_all(output_dir)?;
    let csv_path = output_dir.join(format!("scan_job_{}_results.csv", job.id));
    std::fs::write(&csv_path, output)?;

    jobs.set_csv_path(job.id, &csv_path.display().to_string())
        .await?;

    Ok(csv_path)
}

/// Escape a CSV field value.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobStatus;
    use crate::repository::{DbContext, FieldRow};
    use tempfile::tempdir;

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("plain"), "plain");
        assert_eq!(escape_csv("a,b"), "\"a,b\"");
        assert_eq!(escape_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_csv("two\nlines"), "\"two\nlines\"");
    }

    #[tokio::test]
    async fn test_export_writes_rows_and_records_path() {
        let dir = tempdir().unwrap();
        let ctx = DbContext::from_sqlite_path(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        let jobs = ctx.jobs();
        let docs = ctx.documents();

        let job = jobs.create("/tmp/in", JobStatus::Running, 2).await.unwrap();
        let with_fields = docs
            .insert_placeholder(job.id, "/tmp/in/a.pdf", "pdf")
            .await
            .unwrap();
        docs.record_result(
            with_fields.id,
            false,
            0,
            0.9,
            &[FieldRow {
                field_name: "first_name".to_string(),
                field_value: Some("Ada, really".to_string()),
                is_empty: false,
                is_critical: true,
                confidence: 0.9,
            }],
        )
        .await
        .unwrap();
        let failed = docs
            .insert_placeholder(job.id, "/tmp/in/b.png", "png")
            .await
            .unwrap();
        docs.record_failure(failed.id, "corrupt file").await.unwrap();

        let out_dir = dir.path().join("exports");
        let csv_path = export_job_csv(&jobs, &docs, job.id, &out_dir).await.unwrap();

        let content = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        // Header, one field row, one fieldless row for the failed doc.
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("document_id,"));
        assert!(lines[1].contains("\"Ada, really\""));
        assert!(lines[2].contains("/tmp/in/b.png"));

        let reloaded = jobs.get(job.id).await.unwrap().unwrap();
        assert_eq!(
            reloaded.csv_path.as_deref(),
            Some(csv_path.display().to_string().as_str())
        );
    }
}
