//! Pull request status refresh.
//!
//! Fetches PR status for many worktrees concurrently with a fixed-size pool
//! so the forge's rate limits are respected. The registry is shared with the
//! workers behind an in-process mutex for the duration of the refresh; the
//! cross-process registry lock is the caller's concern and stays held
//! around the whole load-through-save bracket.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::domain::models::{ForgeConfig, LiveWorktree, PrStatus, Registry};
use crate::domain::ports::Forge;
use crate::services::worktree_sync::IdLookup;

/// Outcome of a refresh pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Entries whose cached status was replaced
    pub updated: usize,
    /// Lookups that failed (cached status left unchanged)
    pub failed: usize,
    /// Worktrees not queried (no branch/origin, or cache still fresh)
    pub skipped: usize,
    /// Lookups abandoned because the refresh was cancelled
    pub cancelled: usize,
}

/// Refresh settings.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    pub concurrency: usize,
    pub timeout: Duration,
    pub cache_ttl_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            timeout: Duration::from_secs(30),
            cache_ttl_secs: 300,
        }
    }
}

impl From<&ForgeConfig> for RefreshConfig {
    fn from(cfg: &ForgeConfig) -> Self {
        Self {
            concurrency: cfg.concurrency.max(1),
            timeout: Duration::from_secs(cfg.timeout_secs),
            cache_ttl_secs: cfg.cache_ttl_secs,
        }
    }
}

#[derive(Debug)]
enum FetchOutcome {
    Updated,
    Failed,
    Cancelled,
}

/// Refreshes cached PR status on registry entries.
pub struct PrRefresher {
    forge: Arc<dyn Forge>,
    config: RefreshConfig,
}

impl PrRefresher {
    pub fn new(forge: Arc<dyn Forge>, config: RefreshConfig) -> Self {
        Self { forge, config }
    }

    /// Refresh PR status for the given live worktrees.
    ///
    /// With `force` every worktree is queried; otherwise entries with a fresh
    /// cached snapshot are skipped. Cancelling `cancel` abandons pending and
    /// in-flight lookups; whatever completed is kept in `registry`.
    #[instrument(skip_all, fields(worktrees = worktrees.len(), force))]
    pub async fn refresh(
        &self,
        registry: &mut Registry,
        worktrees: &[LiveWorktree],
        ids: &IdLookup,
        force: bool,
        cancel: CancellationToken,
    ) -> RefreshSummary {
        let now = Utc::now();
        let mut summary = RefreshSummary::default();
        let mut jobs = Vec::new();

        for wt in worktrees {
            let Some(&id) = ids.get(&wt.path) else {
                continue;
            };
            if wt.branch.is_empty() || wt.origin_url.is_empty() {
                summary.skipped += 1;
                continue;
            }
            let fresh = registry
                .entry_by_id(id)
                .and_then(|(_, e)| e.pr_status.as_ref())
                .is_some_and(|s| !s.is_stale(now, self.config.cache_ttl_secs));
            if fresh && !force {
                summary.skipped += 1;
                continue;
            }
            jobs.push((id, wt.origin_url.clone(), wt.branch.clone()));
        }

        if jobs.is_empty() {
            debug!(?summary, "nothing to refresh");
            return summary;
        }

        let shared = Arc::new(Mutex::new(std::mem::take(registry)));
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut set = JoinSet::new();

        for (id, origin_url, branch) in jobs {
            let forge = Arc::clone(&self.forge);
            let shared = Arc::clone(&shared);
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();
            let timeout = self.config.timeout;

            set.spawn(async move {
                let _permit = tokio::select! {
                    () = cancel.cancelled() => return FetchOutcome::Cancelled,
                    permit = semaphore.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return FetchOutcome::Cancelled,
                    },
                };

                let lookup = tokio::time::timeout(timeout, forge.get_pr_for_branch(&origin_url, &branch));
                let result = tokio::select! {
                    () = cancel.cancelled() => return FetchOutcome::Cancelled,
                    result = lookup => result,
                };

                let status = match result {
                    Ok(Ok(Some(info))) => info.into_status(Utc::now()),
                    Ok(Ok(None)) => PrStatus {
                        fetched: true,
                        fetched_at: Some(Utc::now()),
                        ..PrStatus::default()
                    },
                    Ok(Err(err)) => {
                        warn!(worktree_id = id, branch = %branch, error = %err, "PR lookup failed, keeping cached status");
                        return FetchOutcome::Failed;
                    }
                    Err(_) => {
                        warn!(worktree_id = id, branch = %branch, timeout_secs = timeout.as_secs(), "PR lookup timed out, keeping cached status");
                        return FetchOutcome::Failed;
                    }
                };

                let mut registry = shared.lock().await;
                match registry.entry_by_id_mut(id) {
                    Some(entry) => {
                        entry.pr_status = Some(status);
                        debug!(worktree_id = id, branch = %branch, "PR status updated");
                        FetchOutcome::Updated
                    }
                    None => FetchOutcome::Failed,
                }
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(FetchOutcome::Updated) => summary.updated += 1,
                Ok(FetchOutcome::Failed) => summary.failed += 1,
                Ok(FetchOutcome::Cancelled) => summary.cancelled += 1,
                Err(err) => {
                    warn!(error = %err, "PR refresh worker panicked");
                    summary.failed += 1;
                }
            }
        }

        // Every worker has finished, so this is the only handle left.
        *registry = match Arc::try_unwrap(shared) {
            Ok(mutex) => mutex.into_inner(),
            Err(shared) => shared.lock().await.clone(),
        };

        info!(
            updated = summary.updated,
            failed = summary.failed,
            skipped = summary.skipped,
            cancelled = summary.cancelled,
            "PR refresh finished"
        );
        summary
    }
}
