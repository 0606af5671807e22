//! Folder scan command.

use std::path::Path;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use crate::config::Settings;
use crate::models::JobStatus;
use crate::services::ScanEvent;

/// Register a scan job for a folder and (unless told otherwise) process it.
pub async fn cmd_scan(
    settings: &Settings,
    folder: &Path,
    workers: Option<usize>,
    engine: Option<&str>,
    no_process: bool,
) -> anyhow::Result<()> {
    let mut settings = settings.clone();
    if let Some(workers) = workers {
        settings.workers = workers;
    }
    if let Some(engine) = engine {
        settings.engine = engine.to_string();
    }

    let ctx = settings.create_db_context();
    ctx.init_schema().await?;
    let service = settings.build_service(&ctx)?;

    println!("{} Scanning {}", style("→").cyan(), folder.display());
    let job = service.start(folder).await?;

    if job.status == JobStatus::Failed {
        println!(
            "  {} No readable files found, job {} marked failed",
            style("✗").red(),
            job.id
        );
        return Ok(());
    }
    println!(
        "  {} Job {} registered with {} files",
        style("✓").green(),
        job.id,
        job.total_files
    );

    if no_process {
        println!("  Run `fieldscan status {}` to follow it later", job.id);
        return Ok(());
    }

    let (tx, mut rx) = mpsc::channel::<ScanEvent>(64);
    let progress = ProgressBar::new(job.total_files as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )?
        .progress_chars("#>-"),
    );

    let reporter = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                ScanEvent::FileStarted { file_path, .. } => {
                    progress.set_message(file_path);
                }
                ScanEvent::FileCompleted { .. } | ScanEvent::FileFailed { .. } => {
                    progress.inc(1);
                }
                _ => {}
            }
        }
        progress.finish_and_clear();
    });

    let job = service.process(job.id, Some(tx)).await?;
    let _ = reporter.await;

    let problematic = ctx.documents().list_problematic(job.id).await?;
    let marker = if job.status == JobStatus::Completed {
        style("✓").green()
    } else {
        style("✗").red()
    };
    println!(
        "  {} Job {} {}: {}/{} files processed, {} with errors",
        marker,
        job.id,
        job.status,
        job.processed_files,
        job.total_files,
        problematic.len()
    );

    Ok(())
}
