use crate::libs::config::Config;
use crate::libs::messages::Message;
use crate::libs::version_store::VersionStore;
use crate::msg_print;
use anyhow::Result;

pub async fn cmd(config: &Config) -> Result<()> {
    match VersionStore::new(&config.version_file).read().await? {
        Some(version) => msg_print!(Message::InstalledVersion(version)),
        None => msg_print!(Message::NoInstalledVersion),
    }
    Ok(())
}
