//! `git` command-line adapter for the [`VcsClient`] port.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use crate::domain::models::{LiveWorktree, RepoInfo};
use crate::domain::ports::VcsClient;

/// Git config key holding repository labels (multi-valued).
pub const LABEL_CONFIG_KEY: &str = "arbor.label";

/// Talks to repositories by shelling out to `git`.
#[derive(Debug, Clone)]
pub struct GitCli {
    git_bin: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

struct GitOutput {
    success: bool,
    stdout: String,
    stderr: String,
}

impl GitCli {
    pub fn new(git_bin: impl Into<String>) -> Self {
        Self {
            git_bin: git_bin.into(),
        }
    }

    async fn run(&self, cwd: &Path, args: &[&str]) -> Result<GitOutput> {
        let output = Command::new(&self.git_bin)
            .arg("-C")
            .arg(cwd)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to run `{} {}`", self.git_bin, args.join(" ")))?;

        Ok(GitOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    /// Run git and return stdout, failing on a non-zero exit.
    async fn git(&self, cwd: &Path, args: &[&str]) -> Result<String> {
        let out = self.run(cwd, args).await?;
        if !out.success {
            return Err(anyhow!(
                "`git {}` failed in {}: {}",
                args.join(" "),
                cwd.display(),
                out.stderr
            ));
        }
        Ok(out.stdout)
    }

    /// Run git and return stdout, or `None` on a non-zero exit (e.g. unset config).
    async fn git_optional(&self, cwd: &Path, args: &[&str]) -> Result<Option<String>> {
        let out = self.run(cwd, args).await?;
        Ok(out.success.then_some(out.stdout))
    }

    async fn current_branch(&self, path: &Path) -> Result<String> {
        let head = self.git(path, &["rev-parse", "--abbrev-ref", "HEAD"]).await?;
        Ok(if head == "HEAD" { String::new() } else { head })
    }

    async fn inspect_worktree(&self, path: &Path) -> Result<LiveWorktree> {
        let branch = self.current_branch(path).await?;
        let common_dir = self
            .git(path, &["rev-parse", "--path-format=absolute", "--git-common-dir"])
            .await?;
        let repo_path = main_repo_from_common_dir(Path::new(&common_dir));
        let origin_url = self
            .git_optional(path, &["config", "--get", "remote.origin.url"])
            .await?
            .unwrap_or_default();
        let status = self.git(path, &["status", "--porcelain"]).await?;

        Ok(LiveWorktree {
            path: path.to_path_buf(),
            repo_path,
            branch,
            origin_url,
            is_dirty: !status.is_empty(),
        })
    }

    async fn inspect_repo(&self, path: &Path) -> RepoInfo {
        let branch = match self.current_branch(path).await {
            Ok(branch) => branch,
            Err(err) => {
                debug!(repo = %path.display(), error = %err, "could not read repository branch");
                String::new()
            }
        };
        let labels = match self
            .git_optional(path, &["config", "--local", "--get-all", LABEL_CONFIG_KEY])
            .await
        {
            Ok(Some(raw)) => parse_labels(&raw),
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(repo = %path.display(), error = %err, "could not read repository labels");
                Vec::new()
            }
        };
        RepoInfo::new(path, branch).with_labels(labels)
    }
}

/// Main repository path for a worktree's common git dir.
///
/// `/code/api/.git` maps to `/code/api`; a bare repository maps to itself.
pub fn main_repo_from_common_dir(common_dir: &Path) -> PathBuf {
    if common_dir.file_name().is_some_and(|n| n == ".git") {
        if let Some(parent) = common_dir.parent() {
            return parent.to_path_buf();
        }
    }
    common_dir.to_path_buf()
}

fn parse_labels(raw: &str) -> Vec<String> {
    let mut labels: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    labels.sort();
    labels.dedup();
    labels
}

/// Immediate, non-hidden subdirectories of `dir`, sorted by path.
async fn child_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(dir = %dir.display(), "directory does not exist");
            return Ok(Vec::new());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to read directory {}", dir.display()))
        }
    };

    let mut dirs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

#[async_trait]
impl VcsClient for GitCli {
    #[instrument(skip(self))]
    async fn list_worktrees(&self, dir: &Path) -> Result<Vec<LiveWorktree>> {
        let mut worktrees = Vec::new();
        for path in child_dirs(dir).await? {
            // Linked worktrees have a `.git` file pointing at the main repository.
            if !path.join(".git").is_file() {
                continue;
            }
            match self.inspect_worktree(&path).await {
                Ok(wt) => worktrees.push(wt),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable worktree");
                }
            }
        }
        debug!(count = worktrees.len(), "listed worktrees");
        Ok(worktrees)
    }

    #[instrument(skip(self))]
    async fn list_repos(&self, dirs: &[PathBuf]) -> Result<Vec<RepoInfo>> {
        let mut repos = Vec::new();
        for dir in dirs {
            for path in child_dirs(dir).await? {
                if path.join(".git").is_dir() {
                    repos.push(self.inspect_repo(&path).await);
                }
            }
        }
        repos.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
        Ok(repos)
    }

    #[instrument(skip(self, worktree), fields(path = %worktree.path.display()))]
    async fn remove_worktree(&self, worktree: &LiveWorktree, force: bool) -> Result<()> {
        let path = worktree.path.to_string_lossy();
        let mut args = vec!["worktree", "remove"];
        if force {
            args.push("--force");
        }
        args.push(&path);
        self.git(&worktree.repo_path, &args)
            .await
            .context("Git worktree removal failed")?;
        Ok(())
    }

    async fn add_label(&self, repo: &RepoInfo, label: &str) -> Result<()> {
        if repo.has_label(label) {
            return Ok(());
        }
        self.git(&repo.path, &["config", "--local", "--add", LABEL_CONFIG_KEY, label])
            .await?;
        Ok(())
    }

    async fn remove_label(&self, repo: &RepoInfo, label: &str) -> Result<()> {
        if !repo.has_label(label) {
            return Ok(());
        }
        self.git(
            &repo.path,
            &["config", "--local", "--fixed-value", "--unset-all", LABEL_CONFIG_KEY, label],
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_repo_from_common_dir() {
        assert_eq!(
            main_repo_from_common_dir(Path::new("/code/api/.git")),
            PathBuf::from("/code/api")
        );
        assert_eq!(
            main_repo_from_common_dir(Path::new("/srv/api.git")),
            PathBuf::from("/srv/api.git")
        );
    }

    #[test]
    fn test_parse_labels_dedups() {
        assert_eq!(parse_labels("web\nbackend\n\nweb\n"), vec!["backend", "web"]);
    }

    #[tokio::test]
    async fn test_child_dirs_skips_hidden_and_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("b")).unwrap();
        std::fs::create_dir(dir.path().join("a")).unwrap();
        std::fs::create_dir(dir.path().join(".hidden")).unwrap();
        std::fs::write(dir.path().join("file"), "").unwrap();

        let dirs = child_dirs(dir.path()).await.unwrap();
        assert_eq!(dirs, vec![dir.path().join("a"), dir.path().join("b")]);
    }

    #[tokio::test]
    async fn test_missing_dir_lists_nothing() {
        let git = GitCli::default();
        let listed = git
            .list_worktrees(Path::new("/definitely/not/here"))
            .await
            .unwrap();
        assert!(listed.is_empty());
    }
}
