//! Database context for managing connections and repository access.
//!
//! The DbContext is the primary entry point for all database operations.
//! It holds the connection factory and provides access to all repositories.

use std::path::Path;

use super::document::DocumentRepository;
use super::job::ScanJobRepository;
use super::migrations::run_migrations;
use super::pool::{AsyncSqlitePool, DieselError};

/// Database context that manages connections and provides repository access.
#[derive(Clone)]
pub struct DbContext {
    pool: AsyncSqlitePool,
}

impl DbContext {
    /// Create a context from a database file path.
    pub fn from_sqlite_path(db_path: &Path) -> Self {
        Self {
            pool: AsyncSqlitePool::from_path(db_path),
        }
    }

    /// Create a context from a database URL (`sqlite:` prefix optional).
    pub fn from_url(url: &str) -> Self {
        Self {
            pool: AsyncSqlitePool::new(url),
        }
    }

    /// Run pending schema migrations.
    pub async fn init_schema(&self) -> Result<(), DieselError> {
        run_migrations(self.pool.database_url()).await
    }

    pub fn jobs(&self) -> ScanJobRepository {
        ScanJobRepository::new(self.pool.clone())
    }

    pub fn documents(&self) -> DocumentRepository {
        DocumentRepository::new(self.pool.clone())
    }
}
