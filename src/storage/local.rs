//! Local filesystem storage implementation.
//!
//! Every write goes to a temporary sibling file that is then renamed over
//! the target, so a reader never observes a half-written document.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{Database, PathsConfig, Scope};
use crate::storage::MonitorStorage;

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    paths: PathsConfig,
}

impl LocalStorage {
    /// Create a new LocalStorage resolving `paths` against `root_dir`.
    pub fn new(root_dir: impl Into<PathBuf>, paths: PathsConfig) -> Self {
        Self {
            root_dir: root_dir.into(),
            paths,
        }
    }

    /// Get the full path for a relative key.
    pub fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    pub fn scope_path(&self) -> PathBuf {
        self.path(&self.paths.scope)
    }

    pub fn database_path(&self) -> PathBuf {
        self.path(&self.paths.database)
    }

    pub fn report_path(&self) -> PathBuf {
        self.path(&self.paths.report)
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.ensure_dir(path).await?;

        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp = path.with_file_name(tmp_name);

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Read a text file, returning None if it doesn't exist.
    async fn read_text(&self, path: &Path) -> Result<Option<String>> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl MonitorStorage for LocalStorage {
    async fn load_scope(&self) -> Result<Scope> {
        let path = self.scope_path();
        let content = self.read_text(&path).await?.ok_or_else(|| {
            AppError::config(format!("scope file not found at {}", path.display()))
        })?;
        Scope::from_json(&content)
    }

    async fn load_database(&self) -> Result<Database> {
        let path = self.database_path();
        match self.read_text(&path).await? {
            Some(content) => Database::from_json(&content),
            None => {
                log::info!("Database does not exist at {}, starting empty", path.display());
                Ok(Database::new())
            }
        }
    }

    async fn load_report(&self) -> Result<String> {
        let path = self.report_path();
        match self.read_text(&path).await? {
            Some(content) => Ok(content),
            None => {
                log::info!("Previous report does not exist, ignoring previous content for tags");
                Ok(String::new())
            }
        }
    }

    async fn save_database(&self, database: &Database) -> Result<()> {
        let json = database.to_json()?;
        self.write_bytes(&self.database_path(), json.as_bytes()).await
    }

    async fn save_report(&self, content: &str) -> Result<()> {
        self.write_bytes(&self.report_path(), content.as_bytes())
            .await
    }

    fn document_paths(&self) -> Vec<PathBuf> {
        vec![self.database_path(), self.report_path()]
    }
}
