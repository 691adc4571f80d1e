use crate::libs::config::Config;
use crate::libs::healthcheck::{Heartbeat, MonitorAction, MonitorToggle};
use crate::libs::messages::Message;
use crate::{msg_bail_anyhow, msg_success};
use anyhow::Result;
use clap::{Args, Subcommand};
use reqwest::Client;

#[derive(Debug, Args)]
pub struct MonitorArgs {
    #[command(subcommand)]
    action: MonitorCommand,
}

#[derive(Debug, Subcommand)]
enum MonitorCommand {
    #[command(about = "Pause the cron health check")]
    Pause,
    #[command(about = "Resume the cron health check")]
    Resume,
    #[command(about = "Send a heartbeat to the cron health check")]
    Ping,
}

pub async fn cmd(args: MonitorArgs, client: Client, config: &Config) -> Result<()> {
    let action = match args.action {
        MonitorCommand::Pause => MonitorAction::Pause,
        MonitorCommand::Resume => MonitorAction::Resume,
        MonitorCommand::Ping => return heartbeat(client, config).await,
    };
    let Some(monitor) = &config.monitor else {
        msg_bail_anyhow!(Message::MonitorNotConfigured);
    };

    if let Err(e) = MonitorToggle::new(client, monitor).set(action).await {
        msg_bail_anyhow!(Message::MonitorToggleFailed(e.to_string()));
    }

    msg_success!(Message::MonitorToggled(action.as_str().to_string()));
    Ok(())
}

async fn heartbeat(client: Client, config: &Config) -> Result<()> {
    let Some(url) = &config.cron_heartbeat_url else {
        msg_bail_anyhow!(Message::HeartbeatNotConfigured);
    };
    if let Err(e) = Heartbeat::new(client, url).send().await {
        msg_bail_anyhow!(Message::HeartbeatFailed(e.to_string()));
    }

    msg_success!(Message::HeartbeatSent);
    Ok(())
}
