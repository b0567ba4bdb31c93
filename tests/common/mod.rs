//! Common test utilities for integration tests
//!
//! Provides shared fixtures and an in-memory `VcsClient` so registry,
//! resolver and session behaviour can be exercised without real git
//! repositories.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;

use arbor::domain::models::{Config, LiveWorktree, RepoInfo};
use arbor::domain::ports::VcsClient;
use arbor::infrastructure::registry::RegistryStore;

/// Create a temporary directory for test isolation
///
/// Returns a TempDir that will be cleaned up when dropped.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Live worktree at `/wt/<dir>` belonging to `/code/<repo>`.
pub fn wt(dir: &str, repo: &str, branch: &str) -> LiveWorktree {
    LiveWorktree::new(
        format!("/wt/{dir}"),
        format!("/code/{repo}"),
        branch,
        format!("git@github.com:acme/{repo}.git"),
    )
}

/// Main repository at `/code/<name>` with the given labels.
pub fn repo(name: &str, branch: &str, labels: &[&str]) -> RepoInfo {
    RepoInfo::new(format!("/code/{name}"), branch).with_labels(labels.iter().copied())
}

/// Registry store in `dir` with a short lock timeout.
pub fn store(dir: &Path) -> RegistryStore {
    RegistryStore::new(dir, Duration::from_secs(5))
}

/// Config pointing at a temporary worktree root.
pub fn config_for(worktree_dir: &Path) -> Config {
    let mut config = Config {
        worktree_dir: worktree_dir.to_path_buf(),
        ..Config::default()
    };
    config.registry.lock_timeout_ms = 5_000;
    config
}

/// In-memory VCS: returns whatever worktrees and repositories it is given.
#[derive(Default)]
pub struct FakeVcs {
    worktrees: Mutex<Vec<LiveWorktree>>,
    repos: Mutex<Vec<RepoInfo>>,
    removed: Mutex<Vec<PathBuf>>,
}

impl FakeVcs {
    pub fn new(worktrees: Vec<LiveWorktree>, repos: Vec<RepoInfo>) -> Self {
        Self {
            worktrees: Mutex::new(worktrees),
            repos: Mutex::new(repos),
            removed: Mutex::new(Vec::new()),
        }
    }

    pub fn set_worktrees(&self, worktrees: Vec<LiveWorktree>) {
        *self.worktrees.lock().unwrap() = worktrees;
    }

    pub fn removed(&self) -> Vec<PathBuf> {
        self.removed.lock().unwrap().clone()
    }
}

#[async_trait]
impl VcsClient for FakeVcs {
    async fn list_worktrees(&self, _dir: &Path) -> Result<Vec<LiveWorktree>> {
        Ok(self.worktrees.lock().unwrap().clone())
    }

    async fn list_repos(&self, _dirs: &[PathBuf]) -> Result<Vec<RepoInfo>> {
        Ok(self.repos.lock().unwrap().clone())
    }

    async fn remove_worktree(&self, worktree: &LiveWorktree, _force: bool) -> Result<()> {
        self.worktrees
            .lock()
            .unwrap()
            .retain(|w| w.path != worktree.path);
        self.removed.lock().unwrap().push(worktree.path.clone());
        Ok(())
    }

    async fn add_label(&self, repo: &RepoInfo, label: &str) -> Result<()> {
        let mut repos = self.repos.lock().unwrap();
        if let Some(r) = repos.iter_mut().find(|r| r.path == repo.path) {
            if !r.has_label(label) {
                r.labels.push(label.to_string());
            }
        }
        Ok(())
    }

    async fn remove_label(&self, repo: &RepoInfo, label: &str) -> Result<()> {
        let mut repos = self.repos.lock().unwrap();
        if let Some(r) = repos.iter_mut().find(|r| r.path == repo.path) {
            r.labels.retain(|l| l != label);
        }
        Ok(())
    }
}
