//! Artifact download from the artifact store.
//!
//! Artifacts live at `{artifact folder}/agent-win-{version}` and are fetched
//! with the store's bearer token. The body is streamed chunk by chunk into
//! `{destination}.part`, hashed on the way, and only renamed to the final
//! destination once the transfer completed and the digest checked out.

use crate::libs::config::{Config, Secret};
use crate::libs::error::DownloadError;
use crate::libs::http::CHECKSUM_SHA256_HEADER;
use chrono::{DateTime, Local};
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Placeholder replaced by the version in artifact URL templates.
pub const VERSION_PLACEHOLDER: &str = "#VERSION#";

/// Pseudo-version under which the store publishes the newest build.
pub const LATEST_VERSION: &str = "latest";

/// URL template of a downloadable artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDescriptor {
    template: String,
}

impl ArtifactDescriptor {
    pub fn new(template: impl Into<String>) -> Self {
        Self { template: template.into() }
    }

    /// Windows agent build stored in `folder`.
    pub fn windows_agent(folder: &Url) -> Self {
        Self::new(format!("{}/agent-win-{}", folder.as_str().trim_end_matches('/'), VERSION_PLACEHOLDER))
    }

    /// URL of the artifact for `version`.
    ///
    /// The version must stay inside the artifact name: path separators,
    /// query and fragment delimiters, escapes and whitespace are rejected.
    pub fn url_for(&self, version: &str) -> Result<Url, DownloadError> {
        let url = self.template.replace(VERSION_PLACEHOLDER, version);
        if !is_artifact_name_safe(version) {
            return Err(DownloadError::InvalidUrl(url));
        }
        Url::parse(&url).map_err(|_| DownloadError::InvalidUrl(url))
    }
}

fn is_artifact_name_safe(version: &str) -> bool {
    !version.is_empty()
        && version != "."
        && version != ".."
        && !version
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_whitespace() || c.is_control())
}

/// Local file name for a download of `version` started at `at`.
///
/// The millisecond timestamp keeps attempts apart; characters that could
/// escape `dir` are replaced.
pub fn artifact_path(dir: &Path, version: &str, at: DateTime<Local>) -> PathBuf {
    let version: String = version
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    dir.join(format!("agent_{}_{}.exe", version, at.format("%d-%m-%Y_%H%M%S%3f")))
}

fn part_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

/// Observer of a running download.
pub trait DownloadProgress: Send + Sync {
    fn start(&self, _total: Option<u64>) {}
    fn advance(&self, _bytes: u64) {}
    fn finish(&self) {}
}

pub struct NoProgress;

impl DownloadProgress for NoProgress {}

/// Terminal progress bar for interactive runs.
pub struct ProgressBarObserver {
    bar: ProgressBar,
}

impl ProgressBarObserver {
    pub fn new() -> Self {
        Self { bar: ProgressBar::hidden() }
    }
}

impl Default for ProgressBarObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadProgress for ProgressBarObserver {
    fn start(&self, total: Option<u64>) {
        match total {
            Some(total) => {
                self.bar.set_length(total);
                if let Ok(style) = ProgressStyle::with_template("-> Downloading [{bar:40}] {percent}% {eta}") {
                    self.bar.set_style(style.progress_chars("= "));
                }
            }
            None => {
                if let Ok(style) = ProgressStyle::with_template("-> Downloading {bytes} {spinner}") {
                    self.bar.set_style(style);
                }
            }
        }
        self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
    }

    fn advance(&self, bytes: u64) {
        self.bar.inc(bytes);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

/// A completed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub path: PathBuf,
    pub bytes: u64,
    /// Lowercase hex SHA-256 of the artifact.
    pub sha256: String,
}

#[derive(Debug, Deserialize)]
struct ArtifactInfo {
    properties: Option<ArtifactProperties>,
}

#[derive(Debug, Deserialize)]
struct ArtifactProperties {
    version: Option<Vec<String>>,
}

#[derive(Clone)]
pub struct ArtifactFetcher {
    client: Client,
    descriptor: ArtifactDescriptor,
    token: Secret,
    progress: Arc<dyn DownloadProgress>,
}

impl ArtifactFetcher {
    pub fn new(client: Client, config: &Config) -> Self {
        Self::with_descriptor(
            client,
            ArtifactDescriptor::windows_agent(&config.artifact_folder_url),
            config.artifact_token.clone(),
        )
    }

    pub fn with_descriptor(client: Client, descriptor: ArtifactDescriptor, token: Secret) -> Self {
        Self {
            client,
            descriptor,
            token,
            progress: Arc::new(NoProgress),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn DownloadProgress>) -> Self {
        self.progress = progress;
        self
    }

    /// Streams the artifact of `version` to `destination`.
    pub async fn download(&self, version: &str, destination: &Path) -> Result<Download, DownloadError> {
        let url = self.descriptor.url_for(version)?;
        debug!(%url, destination = %destination.display(), "downloading artifact");

        let res = self.get(url).await?;
        let expected = res
            .headers()
            .get(CHECKSUM_SHA256_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.trim().to_ascii_lowercase());

        let part = part_path(destination);
        let file = OpenOptions::new().write(true).create_new(true).open(&part).await?;

        let streamed = match self.stream_to(res, file).await {
            Ok(streamed) => streamed,
            Err(e) => {
                let _ = fs::remove_file(&part).await;
                return Err(e);
            }
        };
        let (bytes, sha256) = streamed;

        match expected {
            Some(expected) if expected != sha256 => {
                let _ = fs::remove_file(&part).await;
                return Err(DownloadError::ChecksumMismatch { expected, actual: sha256 });
            }
            Some(_) => debug!(sha256 = %sha256, "artifact checksum verified"),
            None => warn!(sha256 = %sha256, "artifact store sent no checksum, skipping verification"),
        }

        if let Err(e) = fs::rename(&part, destination).await {
            let _ = fs::remove_file(&part).await;
            return Err(e.into());
        }

        Ok(Download {
            path: destination.to_path_buf(),
            bytes,
            sha256,
        })
    }

    /// Newest version published in the store, read from the `properties`
    /// metadata of the `latest` artifact.
    pub async fn latest_version(&self) -> Result<String, DownloadError> {
        let mut url = self.descriptor.url_for(LATEST_VERSION)?;
        url.set_query(Some("properties"));

        let info = self.get(url).await?.json::<ArtifactInfo>().await.map_err(DownloadError::Transport)?;

        info.properties
            .and_then(|properties| properties.version)
            .and_then(|versions| versions.into_iter().next())
            .filter(|version| !version.trim().is_empty())
            .ok_or(DownloadError::MissingLatestVersion)
    }

    async fn get(&self, url: Url) -> Result<Response, DownloadError> {
        let res = self
            .client
            .get(url)
            .bearer_auth(self.token.expose())
            .send()
            .await
            .map_err(DownloadError::Transport)?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(DownloadError::Http { status, body });
        }
        Ok(res)
    }

    async fn stream_to(&self, res: Response, mut file: fs::File) -> Result<(u64, String), DownloadError> {
        let mut hasher = Sha256::new();
        let mut written = 0u64;

        self.progress.start(res.content_length());
        let mut stream = res.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(DownloadError::Transport)?;
            file.write_all(&chunk).await?;
            hasher.update(&chunk);
            written += chunk.len() as u64;
            self.progress.advance(chunk.len() as u64);
        }
        file.flush().await?;
        file.sync_all().await?;
        self.progress.finish();

        Ok((written, hex::encode(hasher.finalize())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_windows_agent_template() {
        let folder = Url::parse("https://sambhalreg.jfrog.io/artifactory/generic-local/files/").unwrap();
        let descriptor = ArtifactDescriptor::windows_agent(&folder);
        assert_eq!(
            descriptor.url_for("1.2.3").unwrap().as_str(),
            "https://sambhalreg.jfrog.io/artifactory/generic-local/files/agent-win-1.2.3"
        );
    }

    #[test]
    fn test_url_for_rejects_names_escaping_the_artifact() {
        let descriptor = ArtifactDescriptor::new("https://store.example/files/agent-win-#VERSION#");
        for version in ["../../api/security/token", "2.0.0#evil", "2.0.0?list", "2.0.0%2F..", "2.0 .0", ""] {
            assert!(matches!(descriptor.url_for(version), Err(DownloadError::InvalidUrl(_))), "{:?}", version);
        }
        assert!(descriptor.url_for("2.0.0-rc.1+build_7").is_ok());
    }

    #[test]
    fn test_artifact_path_embeds_version_and_timestamp() {
        let at = Local.with_ymd_and_hms(2024, 2, 13, 9, 5, 7).unwrap();
        let path = artifact_path(Path::new("build"), "2.0.0", at);
        assert_eq!(path, Path::new("build").join("agent_2.0.0_13-02-2024_090507000.exe"));
    }

    #[test]
    fn test_artifact_path_cannot_escape_directory() {
        let at = Local.with_ymd_and_hms(2024, 2, 13, 9, 5, 7).unwrap();
        let path = artifact_path(Path::new("build"), "../../etc/passwd", at);
        assert_eq!(path.parent(), Some(Path::new("build")));
    }

    #[test]
    fn test_part_path_appends_suffix() {
        assert_eq!(part_path(Path::new("build/agent_1.exe")), Path::new("build/agent_1.exe.part"));
    }
}
