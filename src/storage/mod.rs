//! Storage abstractions for monitor documents.
//!
//! A run reads three documents and writes at most two:
//!
//! ```text
//! {root}/
//! ├── scope.json        # Input: repositories to monitor
//! ├── database.json     # Input/Output: score history (written only on change)
//! └── report.md         # Output: rendered report (read first in tag mode)
//! ```

pub mod local;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Database, Scope};

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for monitor storage backends.
#[async_trait]
pub trait MonitorStorage: Send + Sync {
    /// Load and validate the scope document. Missing scope is an error.
    async fn load_scope(&self) -> Result<Scope>;

    /// Load and validate the database. Missing database is empty.
    async fn load_database(&self) -> Result<Database>;

    /// Load the previously rendered report. Missing report is empty.
    async fn load_report(&self) -> Result<String>;

    /// Replace the stored database wholesale.
    async fn save_database(&self, database: &Database) -> Result<()>;

    /// Replace the stored report.
    async fn save_report(&self, content: &str) -> Result<()>;

    /// Files written by a run, for committing.
    fn document_paths(&self) -> Vec<PathBuf>;
}
