//! Update decision-and-fetch pipeline.
//!
//! One call to [`Updater::run_update_check`] walks the pipeline once:
//!
//! ```text
//! lock ─▶ resolve ─▶ read marker ─▶ equal? ──yes──▶ UpToDate
//!                                     │
//!                                     no
//!                                     ▼
//!                                 download ─▶ write marker ─▶ Updated
//! ```
//!
//! Any step may end the run with `Failed`. The marker file is only written
//! after a complete download, so a failed download never changes what
//! `read()` returns. A failed marker write leaves the artifact on disk and
//! the old record in place; the next run sees the mismatch and downloads
//! again.
//!
//! The pipeline never retries; the scheduler invoking the updater supplies
//! the retry cadence.

use crate::libs::config::Config;
use crate::libs::error::{DownloadError, PersistenceError, ResolutionError, UpdateError};
use crate::libs::fetcher::{artifact_path, ArtifactFetcher, Download};
use crate::libs::lock::RunLock;
use crate::libs::resolver::VersionResolver;
use crate::libs::version_store::VersionStore;
use chrono::Local;
use reqwest::Client;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Source of the version a merchant should run.
#[allow(async_fn_in_trait)]
pub trait ResolveVersion {
    async fn resolve(&self, merchant_key: &str) -> Result<String, ResolutionError>;
}

/// Source of artifact binaries.
#[allow(async_fn_in_trait)]
pub trait FetchArtifact {
    async fn download(&self, version: &str, destination: &Path) -> Result<Download, DownloadError>;
}

/// Record of the currently installed version.
#[allow(async_fn_in_trait)]
pub trait InstalledVersion {
    async fn read(&self) -> Result<Option<String>, PersistenceError>;
    async fn write(&self, version: &str) -> Result<(), PersistenceError>;
}

impl ResolveVersion for VersionResolver {
    async fn resolve(&self, merchant_key: &str) -> Result<String, ResolutionError> {
        VersionResolver::resolve(self, merchant_key).await
    }
}

impl FetchArtifact for ArtifactFetcher {
    async fn download(&self, version: &str, destination: &Path) -> Result<Download, DownloadError> {
        ArtifactFetcher::download(self, version, destination).await
    }
}

impl InstalledVersion for VersionStore {
    async fn read(&self) -> Result<Option<String>, PersistenceError> {
        VersionStore::read(self).await
    }

    async fn write(&self, version: &str) -> Result<(), PersistenceError> {
        VersionStore::write(self, version).await
    }
}

/// Terminal result of one update check.
#[derive(Debug)]
pub enum UpdateOutcome {
    /// The installed version already matches the catalog.
    UpToDate { version: String },
    /// `version` was downloaded and recorded as installed.
    Updated { version: String, artifact: Download },
    Failed(UpdateError),
}

impl UpdateOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, UpdateOutcome::Failed(_))
    }

    /// Process exit status reported to the invoking scheduler.
    pub fn exit_status(&self) -> u8 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

impl fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateOutcome::UpToDate { version } => write!(f, "version {} is already installed", version),
            UpdateOutcome::Updated { version, artifact } => {
                write!(f, "updated to version {} ({})", version, artifact.path.display())
            }
            UpdateOutcome::Failed(e) => write!(f, "update failed: {}", e),
        }
    }
}

/// Sequences resolution, comparison, download and persistence.
pub struct Updater<R = VersionResolver, F = ArtifactFetcher, S = VersionStore> {
    merchant_key: String,
    download_dir: PathBuf,
    lock_file: PathBuf,
    resolver: R,
    fetcher: F,
    store: S,
}

impl Updater {
    pub fn new(client: Client, config: &Config) -> Self {
        Self::with_components(
            config,
            VersionResolver::new(client.clone(), config),
            ArtifactFetcher::new(client, config),
            VersionStore::new(&config.version_file),
        )
    }
}

impl<R, F, S> Updater<R, F, S>
where
    R: ResolveVersion,
    F: FetchArtifact,
    S: InstalledVersion,
{
    pub fn with_components(config: &Config, resolver: R, fetcher: F, store: S) -> Self {
        Self {
            merchant_key: config.merchant_key.clone(),
            download_dir: config.download_dir.clone(),
            lock_file: config.lock_file.clone(),
            resolver,
            fetcher,
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs one update check. Every failure is returned as
    /// [`UpdateOutcome::Failed`].
    pub async fn run_update_check(&self) -> UpdateOutcome {
        let outcome = match self.check().await {
            Ok(outcome) => outcome,
            Err(e) => UpdateOutcome::Failed(e),
        };

        match &outcome {
            UpdateOutcome::Failed(e) => info!(error = %e, "update check failed"),
            outcome => info!(%outcome, "update check finished"),
        }
        outcome
    }

    async fn check(&self) -> Result<UpdateOutcome, UpdateError> {
        let _lock = RunLock::try_acquire(&self.lock_file)
            .map_err(PersistenceError::from)?
            .ok_or(UpdateError::AlreadyRunning)?;

        let target = self.resolver.resolve(&self.merchant_key).await?;
        debug!(merchant_key = %self.merchant_key, %target, "resolved target version");

        let installed = self.store.read().await?;
        debug!(installed = installed.as_deref().unwrap_or("<none>"), "read installed version");

        if installed.as_deref() == Some(target.as_str()) {
            return Ok(UpdateOutcome::UpToDate { version: target });
        }

        let destination = artifact_path(&self.download_dir, &target, Local::now());
        let artifact = self.fetcher.download(&target, &destination).await?;
        debug!(path = %artifact.path.display(), bytes = artifact.bytes, "artifact downloaded");

        if let Err(e) = self.store.write(&target).await {
            warn!(
                path = %artifact.path.display(),
                "artifact downloaded but version marker not updated, next run will download again"
            );
            return Err(e.into());
        }

        Ok(UpdateOutcome::Updated { version: target, artifact })
    }
}
