//! Core library modules of the updater.
//!
//! The update pipeline is split into leaf components that are sequenced by
//! [`update::Updater`]:
//!
//! - [`version_store`]: installed version marker file
//! - [`resolver`]: remote version catalog lookup
//! - [`fetcher`]: streamed artifact download
//! - [`update`]: comparison policy and outcome
//!
//! Around them sit the configuration, the run lock, the health-check
//! collaborators and the user-facing messages.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use agent_updater::libs::config::Config;
//! use agent_updater::libs::data_storage::DataStorage;
//! use agent_updater::libs::http::Http;
//! use agent_updater::libs::update::Updater;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let client = Http::client()?;
//! let config = Config::load(&DataStorage::new(), None, &client).await?;
//! let outcome = Updater::new(client, &config).run_update_check().await;
//! println!("{}", outcome);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data_storage;
pub mod error;
pub mod fetcher;
pub mod healthcheck;
pub mod http;
pub mod lock;
pub mod messages;
pub mod resolver;
pub mod update;
pub mod version_store;
