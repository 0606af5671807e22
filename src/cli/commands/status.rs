//! Job status command.

use console::style;

use crate::config::Settings;

/// Print the current state of one scan job.
pub async fn cmd_status(settings: &Settings, job_id: i32) -> anyhow::Result<()> {
    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    let Some(job) = ctx.jobs().get(job_id).await? else {
        println!("{} Scan job {} not found", style("✗").red(), job_id);
        return Ok(());
    };

    println!("{} Scan job {}", style("→").cyan(), job.id);
    println!("  Folder:    {}", job.folder_path);
    println!("  Status:    {}", job.status);
    println!(
        "  Progress:  {}/{} ({:.1}%)",
        job.processed_files,
        job.total_files,
        job.progress_percentage()
    );
    println!("  Created:   {}", job.created_at.to_rfc3339());
    if let Some(completed_at) = job.completed_at {
        println!("  Finished:  {}", completed_at.to_rfc3339());
    }
    if let Some(csv_path) = &job.csv_path {
        println!("  CSV:       {}", csv_path);
    }

    let problematic = ctx.documents().list_problematic(job.id).await?;
    if !problematic.is_empty() {
        println!(
            "  {} {} document(s) with errors:",
            style("✗").red(),
            problematic.len()
        );
        for doc in problematic {
            println!(
                "    {} ({})",
                doc.file_path,
                doc.error.as_deref().unwrap_or("critical fields missing")
            );
        }
    }

    Ok(())
}
