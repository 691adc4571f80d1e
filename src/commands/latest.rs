use crate::libs::config::Config;
use crate::libs::fetcher::ArtifactFetcher;
use crate::libs::messages::Message;
use crate::msg_print;
use anyhow::Result;
use reqwest::Client;

pub async fn cmd(client: Client, config: &Config) -> Result<()> {
    let version = ArtifactFetcher::new(client, config).latest_version().await?;
    msg_print!(Message::LatestVersion(version));
    Ok(())
}
