//! PDF unification command.

use console::style;

use crate::config::Settings;
use crate::services::unify_job_pdfs;

/// Combine a job's output PDFs into one file.
pub async fn cmd_unify(settings: &Settings, job_id: i32) -> anyhow::Result<()> {
    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    let unified_path = unify_job_pdfs(
        &ctx.jobs(),
        &ctx.documents(),
        job_id,
        &settings.output_dir,
    )
    .await?;

    println!(
        "{} Unified job {} into {}",
        style("✓").green(),
        job_id,
        unified_path.display()
    );
    Ok(())
}
