//! Job deletion command.

use console::style;

use crate::config::Settings;

/// Delete a job together with its documents and fields.
pub async fn cmd_delete(settings: &Settings, job_id: i32) -> anyhow::Result<()> {
    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    if ctx.jobs().delete(job_id).await? {
        println!("{} Deleted scan job {}", style("✓").green(), job_id);
    } else {
        println!("{} Scan job {} not found", style("✗").red(), job_id);
    }
    Ok(())
}
