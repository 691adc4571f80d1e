use crate::libs::config::Config;
use crate::libs::error::{DownloadError, UpdateError};
use crate::libs::fetcher::{ArtifactFetcher, ProgressBarObserver};
use crate::libs::healthcheck::{HealthCheck, Reporter};
use crate::libs::messages::Message;
use crate::libs::resolver::VersionResolver;
use crate::libs::update::{UpdateOutcome, Updater};
use crate::libs::version_store::VersionStore;
use crate::{msg_error, msg_info, msg_print, msg_success, msg_warning};
use anyhow::Result;
use clap::Args;
use reqwest::Client;
use std::future::Future;
use std::sync::Arc;

#[derive(Debug, Default, Args)]
pub struct CheckArgs {
    #[arg(long, help = "Show a progress bar while downloading")]
    pub progress: bool,
}

/// Runs one update check, reports the outcome and maps it to the exit status.
pub async fn cmd(args: CheckArgs, client: Client, config: &Config) -> Result<u8> {
    let outcome = run_until(&args, client, config, shutdown_signal()).await;
    Ok(outcome.exit_status())
}

/// Runs one update check unless `shutdown` resolves first, then prints the
/// outcome and reports it once to the health check.
///
/// Cancellation always yields `Failed(Cancelled)`. A shutdown that lands
/// after the marker was replaced still reports the run as cancelled; the
/// next run finds the new version installed and reports `UpToDate`.
pub async fn run_until(args: &CheckArgs, client: Client, config: &Config, shutdown: impl Future<Output = ()>) -> UpdateOutcome {
    msg_info!(Message::CheckStarted(config.merchant_key.clone()));

    let outcome = match tokio::fs::create_dir_all(&config.download_dir).await {
        Ok(()) => run(args, client.clone(), config, shutdown).await,
        Err(e) => {
            msg_error!(Message::DownloadDirCreateFailed(e.to_string()));
            UpdateOutcome::Failed(DownloadError::Io(e).into())
        }
    };

    print_outcome(&outcome);
    match &config.health_check {
        Some(health_check) => HealthCheck::new(client, health_check).report(&outcome).await,
        None => msg_info!(Message::HealthCheckNotConfigured),
    }
    msg_print!(Message::CheckFinished);

    outcome
}

async fn run(args: &CheckArgs, client: Client, config: &Config, shutdown: impl Future<Output = ()>) -> UpdateOutcome {
    let mut fetcher = ArtifactFetcher::new(client.clone(), config);
    if args.progress {
        fetcher = fetcher.with_progress(Arc::new(ProgressBarObserver::new()));
    }
    let updater = Updater::with_components(
        config,
        VersionResolver::new(client, config),
        fetcher,
        VersionStore::new(&config.version_file),
    );

    tokio::select! {
        outcome = updater.run_update_check() => outcome,
        _ = shutdown => {
            msg_warning!(Message::ShutdownSignalReceived);
            UpdateOutcome::Failed(UpdateError::Cancelled)
        }
    }
}

fn print_outcome(outcome: &UpdateOutcome) {
    match outcome {
        UpdateOutcome::UpToDate { version } => msg_info!(Message::NoUpdateRequired(version.clone())),
        UpdateOutcome::Updated { version, artifact } => msg_success!(Message::UpdateCompleted {
            version: version.clone(),
            path: artifact.path.display().to_string(),
        }),
        UpdateOutcome::Failed(UpdateError::AlreadyRunning) => msg_warning!(Message::UpdateAlreadyRunning),
        UpdateOutcome::Failed(e) => msg_error!(Message::UpdateFailed(e.to_string())),
    }
}

/// Resolves on SIGTERM/SIGINT (Ctrl-C on Windows). Never resolves when the
/// handlers cannot be installed.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => std::future::pending::<()>().await,
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
