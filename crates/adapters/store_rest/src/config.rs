//! REST store configuration.

use std::time::Duration;

use serde::Deserialize;

/// Where the device collection lives and how long to wait for it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RestStoreConfig {
    /// Base URL of the API, without the resource segment.
    pub base_url: String,
    /// Name of the collection holding devices and logs.
    pub resource: String,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for RestStoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api/v1".to_string(),
            resource: "dispositivos".to_string(),
            request_timeout_ms: 2000,
        }
    }
}

impl RestStoreConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// `{base}/{resource}`, tolerating a trailing slash on the base.
    #[must_use]
    pub fn collection_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.resource)
    }

    /// `{base}/{resource}/{id}`.
    #[must_use]
    pub fn item_url(&self, id: &str) -> String {
        format!("{}/{id}", self.collection_url())
    }
}
