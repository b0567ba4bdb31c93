//! Version-control collaborator port.

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::{LiveWorktree, RepoInfo};

/// Read and manipulate worktrees and repositories on disk.
///
/// The registry services only consume what this reports; they never run
/// version-control commands themselves.
#[async_trait]
pub trait VcsClient: Send + Sync {
    /// List every worktree directly under `dir`.
    async fn list_worktrees(&self, dir: &Path) -> Result<Vec<LiveWorktree>>;

    /// List main repositories directly under each of `dirs`, sorted by name.
    async fn list_repos(&self, dirs: &[PathBuf]) -> Result<Vec<RepoInfo>>;

    /// Delete a worktree directory through the version-control tool.
    async fn remove_worktree(&self, worktree: &LiveWorktree, force: bool) -> Result<()>;

    /// Attach a label to a repository.
    async fn add_label(&self, repo: &RepoInfo, label: &str) -> Result<()>;

    /// Detach a label from a repository.
    async fn remove_label(&self, repo: &RepoInfo, label: &str) -> Result<()>;
}
