//! Database initialization command.

use console::style;

use crate::config::Settings;

/// Create the database and run migrations.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    println!(
        "{} Initializing database at {}",
        style("→").cyan(),
        settings.database_path.display()
    );

    if let Some(parent) = settings.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    println!("  {} Database ready", style("✓").green());
    Ok(())
}
