//! Forge (pull request host) collaborator port.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::domain::models::PrStatus;

/// Pull request snapshot returned by a forge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrInfo {
    pub number: u64,
    pub state: String,
    pub url: String,
    pub is_draft: bool,
}

impl PrInfo {
    /// Convert into the cached form stored on a registry entry.
    ///
    /// Forge-specific fields go into the opaque `extra` map.
    pub fn into_status(self, fetched_at: DateTime<Utc>) -> PrStatus {
        let mut extra = Map::new();
        extra.insert("url".to_string(), Value::String(self.url));
        extra.insert("is_draft".to_string(), Value::Bool(self.is_draft));
        PrStatus {
            number: Some(self.number),
            state: Some(self.state),
            fetched: true,
            fetched_at: Some(fetched_at),
            extra,
        }
    }
}

/// Looks up pull request status on a forge.
#[async_trait]
pub trait Forge: Send + Sync {
    /// Find the PR whose head is `branch` in the repository behind `origin_url`.
    ///
    /// Returns `Ok(None)` when the branch has no PR or the origin is not
    /// hosted on this forge.
    async fn get_pr_for_branch(&self, origin_url: &str, branch: &str) -> Result<Option<PrInfo>>;
}
