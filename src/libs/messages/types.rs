#[derive(Debug, Clone)]
pub enum Message {
    // === RUN MESSAGES ===
    CheckStarted(String), // merchant key
    CheckFinished,
    DownloadDirCreateFailed(String),
    ShutdownSignalReceived,

    // === UPDATE MESSAGES ===
    NoUpdateRequired(String), // version
    UpdateCompleted {
        version: String,
        path: String,
    },
    UpdateFailed(String),
    UpdateAlreadyRunning,

    // === VERSION MESSAGES ===
    InstalledVersion(String),
    NoInstalledVersion,
    LatestVersion(String),

    // === HEALTH CHECK MESSAGES ===
    HealthCheckNotConfigured,
    MonitorNotConfigured,
    MonitorToggled(String), // action
    MonitorToggleFailed(String),
    HeartbeatNotConfigured,
    HeartbeatSent,
    HeartbeatFailed(String),

    // === CONFIGURATION MESSAGES ===
    ConfigLoadFailed(String),
}
