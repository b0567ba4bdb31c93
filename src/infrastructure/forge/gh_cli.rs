//! GitHub adapter for the [`Forge`] port backed by the `gh` CLI.

use std::process::Stdio;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::domain::ports::{Forge, PrInfo};

const PR_JSON_FIELDS: &str = "number,state,url,isDraft";

/// Looks up pull requests with `gh pr list`.
#[derive(Debug, Clone)]
pub struct GhCliForge {
    gh_bin: String,
}

impl Default for GhCliForge {
    fn default() -> Self {
        Self::new("gh")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GhPullRequest {
    number: u64,
    state: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    is_draft: bool,
}

impl From<GhPullRequest> for PrInfo {
    fn from(pr: GhPullRequest) -> Self {
        Self {
            number: pr.number,
            state: pr.state,
            url: pr.url,
            is_draft: pr.is_draft,
        }
    }
}

impl GhCliForge {
    pub fn new(gh_bin: impl Into<String>) -> Self {
        Self {
            gh_bin: gh_bin.into(),
        }
    }
}

/// `owner/name` for a GitHub remote URL, or `None` for other hosts.
///
/// Accepts `git@github.com:owner/name.git`, `ssh://git@github.com/owner/name`
/// and `https://github.com/owner/name(.git)`.
pub fn github_repo_slug(origin_url: &str) -> Option<String> {
    let url = origin_url.trim();
    let rest = url
        .strip_prefix("git@github.com:")
        .or_else(|| url.strip_prefix("ssh://git@github.com/"))
        .or_else(|| url.strip_prefix("https://github.com/"))
        .or_else(|| url.strip_prefix("http://github.com/"))?;

    let rest = rest.trim_end_matches('/');
    let rest = rest.strip_suffix(".git").unwrap_or(rest);
    let mut parts = rest.split('/');
    let owner = parts.next().filter(|s| !s.is_empty())?;
    let name = parts.next().filter(|s| !s.is_empty())?;
    if parts.next().is_some() {
        return None;
    }
    Some(format!("{owner}/{name}"))
}

fn parse_pr_list(stdout: &[u8]) -> Result<Option<PrInfo>> {
    let prs: Vec<GhPullRequest> =
        serde_json::from_slice(stdout).context("Failed to parse `gh pr list` output")?;
    Ok(prs.into_iter().next().map(PrInfo::from))
}

#[async_trait]
impl Forge for GhCliForge {
    #[instrument(skip(self), fields(gh = %self.gh_bin))]
    async fn get_pr_for_branch(&self, origin_url: &str, branch: &str) -> Result<Option<PrInfo>> {
        let Some(slug) = github_repo_slug(origin_url) else {
            debug!("origin is not a GitHub remote; no PR lookup");
            return Ok(None);
        };

        let output = Command::new(&self.gh_bin)
            .args(["pr", "list", "--repo", &slug, "--head", branch])
            .args(["--state", "all", "--json", PR_JSON_FIELDS, "--limit", "1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to run `{}`; is the GitHub CLI installed?", self.gh_bin))?;

        if !output.status.success() {
            return Err(anyhow!(
                "`gh pr list` failed for {slug}: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        parse_pr_list(&output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_github_repo_slug() {
        for url in [
            "git@github.com:acme/api.git",
            "ssh://git@github.com/acme/api.git",
            "https://github.com/acme/api",
            "https://github.com/acme/api.git",
            "https://github.com/acme/api/",
        ] {
            assert_eq!(github_repo_slug(url).as_deref(), Some("acme/api"), "{url}");
        }
    }

    #[test]
    fn test_non_github_has_no_slug() {
        assert_eq!(github_repo_slug("git@gitlab.com:acme/api.git"), None);
        assert_eq!(github_repo_slug("https://github.com/acme"), None);
        assert_eq!(github_repo_slug(""), None);
    }

    #[test]
    fn test_parse_pr_list() {
        let out = br#"[{"number":42,"state":"MERGED","url":"https://github.com/acme/api/pull/42","isDraft":false}]"#;
        let pr = parse_pr_list(out).unwrap().unwrap();
        assert_eq!(pr.number, 42);
        assert_eq!(pr.state, "MERGED");
        assert!(!pr.is_draft);

        assert!(parse_pr_list(b"[]").unwrap().is_none());
        assert!(parse_pr_list(b"not json").is_err());
    }

    #[tokio::test]
    async fn test_non_github_origin_skips_lookup() {
        let forge = GhCliForge::new("/nonexistent/gh");
        let pr = forge
            .get_pr_for_branch("https://gitlab.com/acme/api.git", "main")
            .await
            .unwrap();
        assert!(pr.is_none());
    }
}
