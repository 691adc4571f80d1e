//! # Agent Updater
//!
//! Keeps the merchant agent binary on the version the version catalog assigns
//! to the merchant. Meant to be invoked periodically by a scheduler.
//!
//! ## Features
//!
//! - **Version Resolution**: Looks up the merchant's target version in the remote catalog
//! - **Streamed Download**: Fetches the artifact from the artifact store without buffering it in memory
//! - **Atomic Version Marker**: Records the installed version with a temp-file-then-rename write
//! - **Single Run Guard**: File lock prevents overlapping checks on one installation
//! - **Health Reporting**: Pings the health-check service with every outcome
//!
//! ## Usage
//!
//! ```rust,no_run
//! use agent_updater::commands::Cli;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let _exit = Cli::menu().await?;
//!     Ok(())
//! }
//! ```

pub mod commands;
pub mod libs;
