pub mod check;
pub mod installed;
pub mod latest;
pub mod monitor;

use crate::libs::config::Config;
use crate::libs::data_storage::DataStorage;
use crate::libs::http::Http;
use crate::libs::messages::Message;
use crate::msg_error;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit status when the configuration cannot be loaded.
pub const CONFIG_ERROR_EXIT_STATUS: u8 = 2;

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Check the version assigned to the merchant and update the agent if needed")]
    Check(check::CheckArgs),
    #[command(about = "Show the latest version published in the artifact store")]
    Latest,
    #[command(about = "Show the installed agent version")]
    Installed,
    #[command(about = "Pause or resume the cron health check")]
    Monitor(monitor::MonitorArgs),
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[arg(long, global = true, help = "Installation directory (defaults to the executable's directory)")]
    install_dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Configuration file (defaults to configuration.txt in the installation directory)")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

impl Cli {
    pub async fn menu() -> Result<ExitCode> {
        Ok(ExitCode::from(Self::parse().run().await?))
    }

    /// Loads the configuration and runs the selected command, returning the
    /// process exit status.
    pub async fn run(self) -> Result<u8> {
        let storage = match &self.install_dir {
            Some(dir) => DataStorage::at(dir),
            None => DataStorage::new(),
        };
        let client = Http::client()?;

        let config = match Config::load(&storage, self.config.as_deref(), &client).await {
            Ok(config) => config,
            Err(e) => {
                msg_error!(Message::ConfigLoadFailed(e.to_string()));
                return Ok(CONFIG_ERROR_EXIT_STATUS);
            }
        };

        match self.command.unwrap_or(Commands::Check(check::CheckArgs::default())) {
            Commands::Check(args) => check::cmd(args, client, &config).await,
            Commands::Latest => latest::cmd(client, &config).await.map(|_| 0),
            Commands::Installed => installed::cmd(&config).await.map(|_| 0),
            Commands::Monitor(args) => monitor::cmd(args, client, &config).await.map(|_| 0),
        }
    }
}
