//! Worktree domain model.
//!
//! Live worktrees and repositories as reported by the VCS collaborator, and
//! the [`Target`] the resolver hands back to commands.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A worktree that currently exists on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveWorktree {
    /// Worktree filesystem path
    pub path: PathBuf,
    /// Main repository the worktree belongs to
    pub repo_path: PathBuf,
    /// Checked-out branch (empty when HEAD is detached)
    pub branch: String,
    /// `origin` remote URL (empty when unset)
    pub origin_url: String,
    /// Whether the worktree has uncommitted changes
    #[serde(default)]
    pub is_dirty: bool,
}

impl LiveWorktree {
    /// Create a clean worktree record.
    pub fn new(
        path: impl Into<PathBuf>,
        repo_path: impl Into<PathBuf>,
        branch: impl Into<String>,
        origin_url: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            repo_path: repo_path.into(),
            branch: branch.into(),
            origin_url: origin_url.into(),
            is_dirty: false,
        }
    }

    /// Name of the main repository (its directory name).
    pub fn repo_name(&self) -> String {
        repo_name_of(&self.repo_path)
    }
}

/// A main repository known to arbor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoInfo {
    pub name: String,
    pub path: PathBuf,
    /// Currently checked-out branch of the main working copy
    pub branch: String,
    /// User-assigned labels
    #[serde(default)]
    pub labels: Vec<String>,
}

impl RepoInfo {
    pub fn new(path: impl Into<PathBuf>, branch: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: repo_name_of(&path),
            path,
            branch: branch.into(),
            labels: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// Directory name of a repository path.
pub fn repo_name_of(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.to_string_lossy().into_owned(),
        |n| n.to_string_lossy().into_owned(),
    )
}

/// One concrete worktree or repository chosen by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub path: PathBuf,
    pub branch: String,
    pub main_repo_path: PathBuf,
    /// Registry ID; `None` when the target is a main repository.
    pub id: Option<u64>,
}

impl Target {
    pub fn from_worktree(wt: &LiveWorktree, id: u64) -> Self {
        Self {
            path: wt.path.clone(),
            branch: wt.branch.clone(),
            main_repo_path: wt.repo_path.clone(),
            id: Some(id),
        }
    }

    pub fn from_repo(repo: &RepoInfo) -> Self {
        Self {
            path: repo.path.clone(),
            branch: repo.branch.clone(),
            main_repo_path: repo.path.clone(),
            id: None,
        }
    }

    pub fn is_worktree(&self) -> bool {
        self.id.is_some()
    }

    pub fn repo_name(&self) -> String {
        repo_name_of(&self.main_repo_path)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(
                f,
                "#{id} {}:{} ({})",
                self.repo_name(),
                self.branch,
                self.path.display()
            ),
            None => write!(
                f,
                "{}:{} ({})",
                self.repo_name(),
                self.branch,
                self.path.display()
            ),
        }
    }
}

/// Ambient inputs for context-sensitive resolution.
///
/// Passed explicitly instead of reading process state so precedence rules can
/// be exercised directly in tests.
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    pub working_dir: PathBuf,
    pub explicit_id: Option<u64>,
    pub explicit_repo: Option<String>,
    pub explicit_label: Option<String>,
}

impl ResolveContext {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_id(mut self, id: u64) -> Self {
        self.explicit_id = Some(id);
        self
    }

    #[must_use]
    pub fn with_repo(mut self, repo: impl Into<String>) -> Self {
        self.explicit_repo = Some(repo.into());
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.explicit_label = Some(label.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_display() {
        let wt = LiveWorktree::new("/wt/api-x", "/code/api", "x", "");
        let target = Target::from_worktree(&wt, 3);
        assert_eq!(target.to_string(), "#3 api:x (/wt/api-x)");
        assert!(target.is_worktree());

        let repo = RepoInfo::new("/code/api", "main");
        let target = Target::from_repo(&repo);
        assert_eq!(target.to_string(), "api:main (/code/api)");
        assert!(!target.is_worktree());
    }

    #[test]
    fn test_repo_labels() {
        let repo = RepoInfo::new("/code/api", "main").with_labels(["backend", "go"]);
        assert_eq!(repo.name, "api");
        assert!(repo.has_label("backend"));
        assert!(!repo.has_label("frontend"));
    }
}
