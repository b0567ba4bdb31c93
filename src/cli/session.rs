//! The locked load → sync → mutate → save cycle every command runs in.
//!
//! Opening a session takes the registry lock, loads the registry, scans the
//! worktree root and repository directories, syncs, and saves right away if
//! the sync changed anything. The lock is held until the session is
//! committed or dropped.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::types::TargetArgs;
use crate::domain::models::{Config, LiveWorktree, Registry, RepoInfo, Target, WorktreeEntry, WorktreeKey};
use crate::domain::ports::VcsClient;
use crate::infrastructure::git::GitCli;
use crate::infrastructure::registry::{RegistryLock, RegistryStore};
use crate::services::{sync_worktrees_with_report, IdLookup, SyncReport, TargetResolver};

pub struct Session {
    pub config: Config,
    pub registry: Registry,
    pub worktrees: Vec<LiveWorktree>,
    pub repos: Vec<RepoInfo>,
    pub ids: IdLookup,
    pub report: SyncReport,
    store: RegistryStore,
    lock: RegistryLock,
    vcs: Arc<dyn VcsClient>,
    working_dir: PathBuf,
}

impl Session {
    /// Open a session against the real git CLI and the process working directory.
    pub async fn open(config: &Config) -> Result<Self> {
        let working_dir = std::env::current_dir().context("Failed to read current directory")?;
        Self::open_with(config.clone(), Arc::new(GitCli::default()), working_dir).await
    }

    pub async fn open_with(
        config: Config,
        vcs: Arc<dyn VcsClient>,
        working_dir: impl AsRef<Path>,
    ) -> Result<Self> {
        let worktree_dir = canonical(&config.worktree_dir);
        let repo_dirs: Vec<PathBuf> = config.repo_dirs.iter().map(|d| canonical(d)).collect();

        let store = RegistryStore::new(
            &worktree_dir,
            Duration::from_millis(config.registry.lock_timeout_ms),
        );
        let (mut registry, lock) = store.load_with_lock().await?;

        // Scan under the lock: a writer that finished while we waited may
        // have removed worktrees.
        let worktrees = vcs
            .list_worktrees(&worktree_dir)
            .await
            .context("Failed to list worktrees")?;
        let repos = vcs
            .list_repos(&repo_dirs)
            .await
            .context("Failed to list repositories")?;

        let (ids, report) = sync_worktrees_with_report(&mut registry, &worktrees);
        if report.changed() {
            store.save(&registry)?;
            info!(?report, "registry synced");
        } else {
            debug!(live = worktrees.len(), "registry already in sync");
        }

        Ok(Self {
            config,
            registry,
            worktrees,
            repos,
            ids,
            report,
            store,
            lock,
            vcs,
            working_dir: canonical(working_dir.as_ref()),
        })
    }

    pub fn resolver(&self) -> TargetResolver<'_> {
        TargetResolver::new(&self.worktrees, &self.ids, &self.repos)
    }

    /// Resolve a command's target: positional input first, then flags and
    /// the working directory.
    pub fn resolve(&self, args: &TargetArgs) -> Result<Target> {
        let resolver = self.resolver();
        let target = match args.target.as_deref() {
            Some(input) => resolver.resolve_by_id_or_branch(input)?,
            None => resolver.resolve_by_id_or_repo_or_context(&args.context(self.working_dir.clone()))?,
        };
        debug!(%target, "target resolved");
        Ok(target)
    }

    /// Every target in scope for a positional input, or the single context target.
    pub fn resolve_all(&self, args: &TargetArgs) -> Result<Vec<Target>> {
        match args.target.as_deref() {
            Some(input) => Ok(self.resolver().resolve_all_by_id_or_branch(input)?),
            None => self.resolve(args).map(|t| vec![t]),
        }
    }

    /// Resolve a target that must be a worktree, returning it with its live record.
    pub fn resolve_worktree(&self, args: &TargetArgs) -> Result<(Target, &LiveWorktree)> {
        let target = self.resolve(args)?;
        if !target.is_worktree() {
            anyhow::bail!(
                "'{}' is a main repository; this command needs a worktree (pass -n ID or a branch)",
                target.repo_name()
            );
        }
        let live = self
            .live(&target.path)
            .with_context(|| format!("Worktree {} is no longer on disk", target.path.display()))?;
        Ok((target, live))
    }

    pub fn live(&self, path: &Path) -> Option<&LiveWorktree> {
        self.worktrees.iter().find(|wt| wt.path == path)
    }

    pub fn entry(&self, id: u64) -> Option<&WorktreeEntry> {
        self.registry.entry_by_id(id).map(|(_, e)| e)
    }

    pub fn key_of(&self, id: u64) -> Option<WorktreeKey> {
        self.registry.entry_by_id(id).map(|(k, _)| k.clone())
    }

    pub fn vcs(&self) -> &dyn VcsClient {
        self.vcs.as_ref()
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn store(&self) -> &RegistryStore {
        &self.store
    }

    /// Save the registry and release the lock.
    pub fn commit(mut self) -> Result<()> {
        self.store.save(&self.registry)?;
        self.lock.release();
        Ok(())
    }

    /// Release the lock without saving again.
    pub fn close(mut self) {
        self.lock.release();
    }
}

/// Canonical form of `path`, or `path` itself when it does not exist.
fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
