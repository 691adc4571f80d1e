//! Installed version marker.
//!
//! The marker is a plain text file whose whole content is the version string
//! last installed. A missing or blank file means nothing has been installed
//! yet. Writes go through a sibling temporary file that is renamed over the
//! marker, so readers never observe a truncated version.

use crate::libs::error::PersistenceError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Default marker file name inside the install directory.
pub const VERSION_FILE_NAME: &str = "version.txt";

#[derive(Debug, Clone)]
pub struct VersionStore {
    path: PathBuf,
}

impl VersionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the trimmed installed version, or `None` when the marker is
    /// absent or blank.
    pub async fn read(&self) -> Result<Option<String>, PersistenceError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "version marker not found");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let version = content.trim();
        if version.is_empty() {
            return Ok(None);
        }
        Ok(Some(version.to_string()))
    }

    /// Atomically replaces the marker content with `version`.
    pub async fn write(&self, version: &str) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let tmp_path = self.tmp_path();
        let result: std::io::Result<()> = async {
            let mut file = fs::File::create(&tmp_path).await?;
            file.write_all(version.as_bytes()).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&tmp_path, &self.path).await
        }
        .await;

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        debug!(path = %self.path.display(), version, "version marker written");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_else(|| VERSION_FILE_NAME.into());
        name.push(format!(".{}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }
}
