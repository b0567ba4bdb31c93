//! `arbor prune`: remove clean worktrees whose pull request was merged.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::display::{action_failure, action_success};
use crate::cli::output::{output, CommandOutput};
use crate::cli::session::Session;
use crate::domain::models::{Config, LiveWorktree};

const MERGED: &str = "MERGED";

#[derive(Args, Debug)]
pub struct PruneArgs {
    /// Only list what would be removed
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
pub struct PrunedWorktree {
    pub id: u64,
    pub branch: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PruneOutput {
    pub dry_run: bool,
    pub worktrees: Vec<PrunedWorktree>,
}

impl CommandOutput for PruneOutput {
    fn to_human(&self) -> String {
        if self.worktrees.is_empty() {
            return "Nothing to prune.".to_string();
        }
        self.worktrees
            .iter()
            .map(|wt| {
                let what = format!("#{} {} ({})", wt.id, wt.branch, wt.path);
                match (&wt.error, self.dry_run) {
                    (Some(err), _) => action_failure(&format!("{what}: {err}")),
                    (None, true) => format!("Would remove {what}"),
                    (None, false) => action_success(&format!("Removed {what}")),
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Live worktrees that are clean and whose cached PR state is merged.
pub(crate) fn prunable(session: &Session) -> Vec<(u64, LiveWorktree)> {
    let mut found: Vec<(u64, LiveWorktree)> = session
        .worktrees
        .iter()
        .filter(|wt| !wt.is_dirty && !session.working_dir().starts_with(&wt.path))
        .filter_map(|wt| {
            let id = *session.ids.get(&wt.path)?;
            let merged = session
                .entry(id)
                .and_then(|e| e.pr_status.as_ref())
                .and_then(|s| s.state.as_deref())
                .is_some_and(|state| state.eq_ignore_ascii_case(MERGED));
            merged.then(|| (id, wt.clone()))
        })
        .collect();
    found.sort_by_key(|(id, _)| *id);
    found
}

pub async fn execute(args: PruneArgs, config: &Config, json: bool) -> Result<()> {
    let mut session = Session::open(config).await?;
    let candidates = prunable(&session);
    let mut results = Vec::with_capacity(candidates.len());

    for (id, wt) in candidates {
        let mut result = PrunedWorktree {
            id,
            branch: wt.branch.clone(),
            path: wt.path.display().to_string(),
            error: None,
        };
        if !args.dry_run {
            match session.vcs().remove_worktree(&wt, false).await {
                Ok(()) => {
                    if let Some(key) = session.key_of(id) {
                        session.registry.mark_removed(&key);
                    }
                    info!(worktree_id = id, "pruned merged worktree");
                }
                Err(err) => {
                    warn!(worktree_id = id, error = %err, "could not prune worktree");
                    result.error = Some(format!("{err:#}"));
                }
            }
        }
        results.push(result);
    }

    if args.dry_run {
        session.close();
    } else {
        session.commit()?;
    }

    output(
        &PruneOutput {
            dry_run: args.dry_run,
            worktrees: results,
        },
        json,
    );
    Ok(())
}
