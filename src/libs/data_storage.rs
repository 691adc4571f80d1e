use std::env;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "agent-updater";

/// Installation directory holding the marker file, the run lock,
/// `configuration.txt` and the download directory.
#[derive(Debug, Clone)]
pub struct DataStorage {
    base_path: PathBuf,
}

impl DataStorage {
    /// Uses the directory of the running executable, falling back to the
    /// working directory.
    pub fn new() -> Self {
        let base_path = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));

        Self { base_path }
    }

    pub fn at(base_path: impl Into<PathBuf>) -> Self {
        Self { base_path: base_path.into() }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl Default for DataStorage {
    fn default() -> Self {
        Self::new()
    }
}
