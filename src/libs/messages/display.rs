//! Display implementation for updater messages.
//!
//! All user-facing text lives here, so every command prints the same wording
//! for the same event.

use super::types::Message;
use std::fmt::{Display, Formatter, Result};

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let s = match self {
            // === RUN MESSAGES ===
            Message::CheckStarted(merchant_key) => format!("Checking the agent version for merchant {}", merchant_key),
            Message::CheckFinished => "Update check finished".to_string(),
            Message::DownloadDirCreateFailed(e) => format!("Failed to create the download directory: {}", e),
            Message::ShutdownSignalReceived => "Received shutdown signal, cancelling the update check".to_string(),

            // === UPDATE MESSAGES ===
            Message::NoUpdateRequired(version) => {
                format!("No update required. Version {} given by the API is already installed", version)
            }
            Message::UpdateCompleted { version, path } => {
                format!("Version {} downloaded successfully to {}, version info updated", version, path)
            }
            Message::UpdateFailed(e) => format!("Update failed: {}", e),
            Message::UpdateAlreadyRunning => "Another update check is already running for this installation".to_string(),

            // === VERSION MESSAGES ===
            Message::InstalledVersion(version) => format!("Current installed version: {}", version),
            Message::NoInstalledVersion => "No version is installed yet".to_string(),
            Message::LatestVersion(version) => format!("Latest version in the artifact store: {}", version),

            // === HEALTH CHECK MESSAGES ===
            Message::HealthCheckNotConfigured => "Health check ping is not configured, outcome is not reported".to_string(),
            Message::MonitorNotConfigured => "Health check monitor API is not configured (HC_API_BASE_URL, HC_API_KEY, HC_UUID_CRON)".to_string(),
            Message::MonitorToggled(action) => format!("Health check monitor: {} done", action),
            Message::MonitorToggleFailed(e) => format!("Failed to toggle the health check monitor: {}", e),
            Message::HeartbeatNotConfigured => "Cron heartbeat is not configured (HC_PING_URL_CRON)".to_string(),
            Message::HeartbeatSent => "Cron heartbeat sent".to_string(),
            Message::HeartbeatFailed(e) => format!("Cron heartbeat failed: {}", e),

            // === CONFIGURATION MESSAGES ===
            Message::ConfigLoadFailed(e) => format!("Failed to load configuration: {}", e),
        };
        write!(f, "{}", s)
    }
}
