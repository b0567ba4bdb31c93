//! `arbor remove`: delete a worktree and retire its ID.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::info;

use crate::cli::display::action_success;
use crate::cli::output::{output, CommandOutput};
use crate::cli::session::Session;
use crate::cli::types::TargetArgs;
use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct RemoveArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Remove even with uncommitted changes
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
pub struct RemoveOutput {
    pub id: u64,
    pub branch: String,
    pub path: String,
}

impl CommandOutput for RemoveOutput {
    fn to_human(&self) -> String {
        action_success(&format!(
            "Removed worktree #{} ({}) at {}",
            self.id, self.branch, self.path
        ))
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: RemoveArgs, config: &Config, json: bool) -> Result<()> {
    let mut session = Session::open(config).await?;
    let (target, live) = session.resolve_worktree(&args.target)?;
    let id = target.id.context("worktree without an ID")?;

    if live.is_dirty && !args.force {
        anyhow::bail!(
            "Worktree #{id} at {} has uncommitted changes; use --force to remove it anyway",
            target.path.display()
        );
    }
    if session.working_dir().starts_with(&target.path) {
        anyhow::bail!("Refusing to remove worktree #{id}: it contains the current directory");
    }

    let live = live.clone();
    session.vcs().remove_worktree(&live, args.force).await?;

    if let Some(key) = session.key_of(id) {
        session.registry.mark_removed(&key);
    }
    session.commit()?;
    info!(worktree_id = id, path = %target.path.display(), "worktree removed");

    output(
        &RemoveOutput {
            id,
            branch: target.branch,
            path: target.path.display().to_string(),
        },
        json,
    );
    Ok(())
}
