//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod cancel;
mod delete;
mod export;
mod init;
mod jobs;
mod scan;
mod serve;
mod status;
mod unify;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "fieldscan")]
#[command(about = "Document scanning and field extraction service")]
#[command(version)]
pub struct Cli {
    /// Database file (overrides config file)
    #[arg(long, short = 't', global = true, env = "FIELDSCAN_DATABASE")]
    database: Option<PathBuf>,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Scan a folder of documents
    Scan {
        /// Folder to scan
        folder: PathBuf,
        /// Number of extraction workers
        #[arg(short, long)]
        workers: Option<usize>,
        /// Engine mode: combine, pdftext, tesseract, paddleocr
        #[arg(short, long)]
        engine: Option<String>,
        /// Register the job without processing it
        #[arg(long)]
        no_process: bool,
    },

    /// Show the status of a scan job
    Status {
        job_id: i32,
    },

    /// List recent scan jobs
    Jobs {
        /// Maximum number of jobs to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Cancel a running scan job
    Cancel {
        job_id: i32,
    },

    /// Export job results as CSV
    Export {
        job_id: i32,
    },

    /// Combine a job's output PDFs into one file
    Unify {
        job_id: i32,
    },

    /// Delete a scan job with its documents and fields
    Delete {
        job_id: i32,
    },

    /// Start the web server
    Serve {
        /// Bind address (port, host, or host:port)
        #[arg(short, long, default_value = "3030")]
        bind: String,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        settings.database_path = database;
    }

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Scan {
            folder,
            workers,
            engine,
            no_process,
        } => scan::cmd_scan(&settings, &folder, workers, engine.as_deref(), no_process).await,
        Commands::Status { job_id } => status::cmd_status(&settings, job_id).await,
        Commands::Jobs { limit } => jobs::cmd_jobs(&settings, limit).await,
        Commands::Cancel { job_id } => cancel::cmd_cancel(&settings, job_id).await,
        Commands::Export { job_id } => export::cmd_export(&settings, job_id).await,
        Commands::Unify { job_id } => unify::cmd_unify(&settings, job_id).await,
        Commands::Delete { job_id } => delete::cmd_delete(&settings, job_id).await,
        Commands::Serve { bind } => serve::cmd_serve(&settings, &bind).await,
    }
}
