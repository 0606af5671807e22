//! Job listing command.

use console::style;

use crate::config::Settings;

/// List recent scan jobs.
pub async fn cmd_jobs(settings: &Settings, limit: i64) -> anyhow::Result<()> {
    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    let jobs = ctx.jobs().list_recent(limit).await?;
    if jobs.is_empty() {
        println!("{} No scan jobs yet", style("→").cyan());
        return Ok(());
    }

    println!("{} {} scan job(s)", style("→").cyan(), jobs.len());
    for job in jobs {
        println!(
            "  #{:<5} {:<10} {:>4}/{:<4} {}",
            job.id, job.status, job.processed_files, job.total_files, job.folder_path
        );
    }
    Ok(())
}
