//! Error taxonomy of the update pipeline.
//!
//! Every component returns its own error type. The orchestrator folds them
//! into [`UpdateError`], which is carried by `UpdateOutcome::Failed` and never
//! propagated past `Updater::run_update_check`.

use reqwest::StatusCode;
use std::io;
use thiserror::Error;

/// Failure to determine the version assigned to the merchant.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// Transport failure, non-success status or an unreadable catalog body.
    #[error("version catalog request failed: {0}")]
    Network(#[source] reqwest::Error),

    /// The catalog has no (or an empty) entry for the merchant.
    #[error("merchant key '{0}' not found in the version catalog")]
    KeyNotFound(String),
}

/// Failure while fetching an artifact from the artifact store.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The artifact store answered with a non-success status.
    #[error("artifact store returned {status}: {body}")]
    Http { status: StatusCode, body: String },

    #[error("artifact request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("invalid artifact url '{0}'")]
    InvalidUrl(String),

    #[error("failed to write artifact: {0}")]
    Io(#[from] io::Error),

    /// The streamed bytes do not hash to the digest advertised by the store.
    #[error("artifact checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("latest version is not published in the artifact store")]
    MissingLatestVersion,
}

/// Failure to read or write the installed version marker.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("version marker I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Reason carried by a failed update check.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Another update check holds the run lock for this installation.
    #[error("another update check is already running")]
    AlreadyRunning,

    #[error("update check was cancelled")]
    Cancelled,
}
