//! CSV export command.

use console::style;

use crate::config::Settings;
use crate::services::export_job_csv;

/// Export the results of a job as CSV.
pub async fn cmd_export(settings: &Settings, job_id: i32) -> anyhow::Result<()> {
    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    let csv_path = export_job_csv(
        &ctx.jobs(),
        &ctx.documents(),
        job_id,
        &settings.export_dir,
    )
    .await?;

    println!(
        "{} Exported job {} to {}",
        style("✓").green(),
        job_id,
        csv_path.display()
    );
    Ok(())
}
