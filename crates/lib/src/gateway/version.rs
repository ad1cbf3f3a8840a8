//! Version reporting for `GET /`: local build version plus the latest published one.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Version of this build.
pub fn current_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Body of `GET /` when no redirect is configured.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub current_version: String,
    pub latest_version: Option<String>,
}

#[derive(Debug, thiserror::Error)]
enum VersionError {
    #[error("version request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("version source error: {0}")]
    Api(String),
    #[error("version source has no version field")]
    Missing,
}

#[derive(Debug, Deserialize)]
struct VersionDocument {
    version: Option<String>,
}

/// Remote JSON document (e.g. a published manifest) carrying a top-level `version`.
#[derive(Clone)]
pub struct VersionSource {
    url: Option<String>,
    client: reqwest::Client,
}

impl VersionSource {
    pub fn new(url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            url: url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()),
            client,
        }
    }

    /// Latest published version, or None when no source is configured or the fetch fails.
    pub async fn latest(&self) -> Option<String> {
        let url = self.url.as_deref()?;
        match self.fetch(url).await {
            Ok(v) => Some(v),
            Err(e) => {
                log::debug!("latest version lookup failed: {}", e);
                None
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<String, VersionError> {
        let res = self.client.get(url).send().await?;
        if !res.status().is_success() {
            return Err(VersionError::Api(res.status().to_string()));
        }
        let doc: VersionDocument = res.json().await?;
        doc.version
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(VersionError::Missing)
    }
}
