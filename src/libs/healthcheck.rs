//! Health-check service integration.
//!
//! Two independent capabilities share the service:
//!
//! - [`HealthCheck`] pings the updater's check with the outcome of each run
//!   (`{ping url}/{uuid}` on success, `{ping url}/{uuid}/fail` on failure).
//! - [`MonitorToggle`] pauses and resumes the cron check through the
//!   management API (`{api base}/api/v2/checks/{uuid}/pause|resume`).
//! - [`Heartbeat`] signals the cron check itself (`GET {cron ping url}`).
//!
//! Ping failures are logged and swallowed: an unreachable health-check
//! service must not change the outcome of an update.

use crate::libs::config::{HealthCheckConfig, MonitorConfig};
use crate::libs::error::UpdateError;
use crate::libs::http::Http;
use crate::libs::update::UpdateOutcome;
use anyhow::Result;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use tracing::{debug, warn};

/// Receives the terminal outcome of every update check.
#[allow(async_fn_in_trait)]
pub trait Reporter {
    async fn report(&self, outcome: &UpdateOutcome);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingKind {
    Success,
    Fail,
    /// Attaches a note to the check without changing its state.
    Log,
}

impl PingKind {
    fn suffix(self) -> &'static str {
        match self {
            PingKind::Success => "",
            PingKind::Fail => "fail",
            PingKind::Log => "log",
        }
    }
}

#[derive(Debug, Clone)]
pub struct HealthCheck {
    client: Client,
    config: HealthCheckConfig,
}

impl HealthCheck {
    pub fn new(client: Client, config: &HealthCheckConfig) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }

    pub fn ping_url(&self, kind: PingKind) -> Url {
        Http::join_url(&self.config.ping_url, &[self.config.updater_uuid.as_str(), kind.suffix()])
    }

    /// Sends one ping with an optional text body.
    pub async fn ping(&self, kind: PingKind, body: Option<String>) -> Result<()> {
        let url = self.ping_url(kind);
        debug!(%url, ?kind, "pinging health check");

        let mut request = self.client.post(url);
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, "text/plain; charset=utf-8").body(body);
        }
        request.send().await?.error_for_status()?;
        Ok(())
    }
}

impl Reporter for HealthCheck {
    async fn report(&self, outcome: &UpdateOutcome) {
        // An overlapping run is not a failure of this installation; the run
        // holding the lock reports its own outcome.
        let (kind, body) = match outcome {
            UpdateOutcome::Failed(UpdateError::AlreadyRunning) => (PingKind::Log, Some(UpdateError::AlreadyRunning.to_string())),
            UpdateOutcome::Failed(e) => (PingKind::Fail, Some(e.to_string())),
            _ => (PingKind::Success, None),
        };
        if let Err(e) = self.ping(kind, body).await {
            warn!(error = %e, ?kind, "health check ping failed");
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorAction {
    Pause,
    Resume,
}

impl MonitorAction {
    pub fn as_str(self) -> &'static str {
        match self {
            MonitorAction::Pause => "pause",
            MonitorAction::Resume => "resume",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MonitorToggle {
    client: Client,
    config: MonitorConfig,
}

impl MonitorToggle {
    pub fn new(client: Client, config: &MonitorConfig) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }

    pub fn action_url(&self, action: MonitorAction) -> Url {
        Http::join_url(
            &self.config.api_base_url,
            &["api/v2/checks", self.config.cron_uuid.as_str(), action.as_str()],
        )
    }

    /// Pauses or resumes the cron check.
    pub async fn set(&self, action: MonitorAction) -> Result<()> {
        let url = self.action_url(action);
        debug!(%url, action = action.as_str(), "toggling health check monitor");

        self.client
            .post(url)
            .header("X-Api-Key", self.config.api_key.expose())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("")
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Liveness signal of the scheduler driving the updater.
#[derive(Debug, Clone)]
pub struct Heartbeat {
    client: Client,
    url: Url,
}

impl Heartbeat {
    pub fn new(client: Client, url: &Url) -> Self {
        Self { client, url: url.clone() }
    }

    pub async fn send(&self) -> Result<()> {
        debug!(url = %self.url, "sending cron heartbeat");
        self.client.get(self.url.clone()).send().await?.error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::config::Secret;

    #[test]
    fn test_ping_urls() {
        let check = HealthCheck::new(
            Client::new(),
            &HealthCheckConfig {
                ping_url: Url::parse("https://hc-ping.com").unwrap(),
                updater_uuid: "5f1c".to_string(),
            },
        );
        assert_eq!(check.ping_url(PingKind::Success).as_str(), "https://hc-ping.com/5f1c");
        assert_eq!(check.ping_url(PingKind::Fail).as_str(), "https://hc-ping.com/5f1c/fail");
        assert_eq!(check.ping_url(PingKind::Log).as_str(), "https://hc-ping.com/5f1c/log");
    }

    #[test]
    fn test_monitor_action_url() {
        let toggle = MonitorToggle::new(
            Client::new(),
            &MonitorConfig {
                api_base_url: Url::parse("https://healthchecks.io/").unwrap(),
                api_key: Secret::new("key"),
                cron_uuid: "c2a9".to_string(),
            },
        );
        assert_eq!(
            toggle.action_url(MonitorAction::Resume).as_str(),
            "https://healthchecks.io/api/v2/checks/c2a9/resume"
        );
    }
}
