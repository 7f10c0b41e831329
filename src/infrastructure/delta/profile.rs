//! The Delta Sharing credential profile: a small JSON file handed out by
//! the data provider. Read-only input, never mutated by this system.

use crate::domain::errors::{FetchError, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareProfile {
    #[serde(default)]
    pub share_credentials_version: Option<u32>,
    pub endpoint: String,
    #[serde(default)]
    pub expiration_time: Option<String>,
    pub bearer_token: String,
}

impl ShareProfile {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            FetchError::Config(format!("cannot read profile {}: {e}", path.display()))
        })?;
        let profile: ShareProfile = serde_json::from_str(&contents)
            .map_err(|e| FetchError::Config(format!("malformed profile: {e}")))?;
        if profile.endpoint.is_empty() {
            return Err(FetchError::Config("profile endpoint is empty".into()));
        }
        Ok(profile)
    }

    /// Endpoint with any trailing slash removed, ready for path joining.
    pub fn base_url(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }

    /// Parsed credential expiration, when the provider supplied one.
    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        self.expiration_time
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc))
    }

    pub fn is_expired(&self) -> bool {
        self.expiration().is_some_and(|t| t < Utc::now())
    }
}

// Bearer tokens must never reach logs, so Debug is written by hand.
impl fmt::Debug for ShareProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareProfile")
            .field("endpoint", &self.endpoint)
            .field("expiration_time", &self.expiration_time)
            .field("bearer_token", &"<redacted>")
            .finish()
    }
}
