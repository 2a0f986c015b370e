use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::protocol::ExportFormat;
use tracing::info;

/// `<prefix>_export_<YYYYMMDDHHMMSS>.<ext>`
pub fn export_filename(prefix: &str, format: ExportFormat, now: DateTime<Utc>) -> String {
    format!(
        "{prefix}_export_{}.{}",
        now.format("%Y%m%d%H%M%S"),
        format.extension()
    )
}

/// Destination for downloaded export blobs.
#[async_trait]
pub trait DownloadSink: Send + Sync {
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<()>;
}

pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl DownloadSink for DirectorySink {
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("failed to create export dir '{}'", self.root.display()))?;
        let path = self.root.join(filename);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("failed to write export '{}'", path.display()))?;
        info!(path = %path.display(), bytes = bytes.len(), "export saved");
        Ok(())
    }
}
