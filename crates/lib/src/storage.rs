//! Process-wide storage handle. The webhook path only ever asks for it to be initialized.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::OnceCell;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Make the store ready for use. Safe to call before every request.
    async fn initialize(&self) -> Result<()>;
}

/// JSON file store. First initialize creates the parent directory and an empty document.
pub struct FileStorage {
    path: PathBuf,
    ready: OnceCell<()>,
}

impl FileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            ready: OnceCell::new(),
        }
    }

    async fn prepare(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating storage directory {}", dir.display()))?;
        }
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            tokio::fs::write(&self.path, b"{}")
                .await
                .with_context(|| format!("writing storage file {}", self.path.display()))?;
            log::info!("created storage at {}", self.path.display());
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn initialize(&self) -> Result<()> {
        self.ready.get_or_try_init(|| self.prepare()).await?;
        Ok(())
    }
}
