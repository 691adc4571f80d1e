//! Version catalog lookup.
//!
//! The catalog endpoint answers with one JSON object mapping merchant keys to
//! the version each merchant should run, e.g. `{"HQ-123-456": "1.4.2"}`. It
//! is fetched on every check; nothing is cached.

use crate::libs::config::Config;
use crate::libs::error::ResolutionError;
use reqwest::{Client, Url};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct VersionResolver {
    client: Client,
    catalog_url: Url,
}

impl VersionResolver {
    pub fn new(client: Client, config: &Config) -> Self {
        Self::with_url(client, config.catalog_url.clone())
    }

    pub fn with_url(client: Client, catalog_url: Url) -> Self {
        Self { client, catalog_url }
    }

    /// Returns the version assigned to `merchant_key`.
    pub async fn resolve(&self, merchant_key: &str) -> Result<String, ResolutionError> {
        debug!(url = %self.catalog_url, merchant_key, "requesting version catalog");

        let catalog = self
            .client
            .get(self.catalog_url.clone())
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(ResolutionError::Network)?
            .json::<HashMap<String, serde_json::Value>>()
            .await
            .map_err(ResolutionError::Network)?;

        lookup(&catalog, merchant_key)
    }
}

/// Entries that are not non-empty strings are treated as absent.
fn lookup(catalog: &HashMap<String, serde_json::Value>, merchant_key: &str) -> Result<String, ResolutionError> {
    catalog
        .get(merchant_key)
        .and_then(|value| value.as_str())
        .map(str::trim)
        .filter(|version| !version.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| ResolutionError::KeyNotFound(merchant_key.to_string()))
}
