//! Job cancellation command.

use console::style;

use crate::config::Settings;

/// Request cancellation of a running job.
pub async fn cmd_cancel(settings: &Settings, job_id: i32) -> anyhow::Result<()> {
    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    if ctx.jobs().cancel(job_id).await? {
        println!(
            "{} Cancellation requested for job {}",
            style("✓").green(),
            job_id
        );
        println!("  Workers stop after the file they are currently on");
    } else {
        println!(
            "{} Job {} not found or already finished",
            style("✗").red(),
            job_id
        );
    }
    Ok(())
}
