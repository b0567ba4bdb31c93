//! `arbor pr`: pull request status cache.

use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::cli::display::create_spinner;
use crate::cli::output::{output, CommandOutput};
use crate::cli::session::Session;
use crate::domain::models::Config;
use crate::infrastructure::forge::GhCliForge;
use crate::services::{PrRefresher, RefreshConfig, RefreshSummary};

#[derive(Args, Debug)]
pub struct PrArgs {
    #[command(subcommand)]
    pub command: PrCommands,
}

#[derive(Subcommand, Debug)]
pub enum PrCommands {
    /// Fetch pull request status for every worktree (Ctrl-C keeps partial results)
    Refresh {
        /// Ignore cached status and query every worktree
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RefreshOutput {
    pub updated: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: usize,
}

impl From<RefreshSummary> for RefreshOutput {
    fn from(s: RefreshSummary) -> Self {
        Self {
            updated: s.updated,
            failed: s.failed,
            skipped: s.skipped,
            cancelled: s.cancelled,
        }
    }
}

impl CommandOutput for RefreshOutput {
    fn to_human(&self) -> String {
        let mut text = format!(
            "PR status: {} updated, {} skipped (cached or no remote)",
            self.updated, self.skipped
        );
        if self.failed > 0 {
            text.push_str(&format!(", {} failed", self.failed));
        }
        if self.cancelled > 0 {
            text.push_str(&format!(", {} cancelled", self.cancelled));
        }
        text
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Refresh PR status for the session's worktrees; Ctrl-C cancels.
///
/// Completed lookups stay in `session.registry` either way, so the caller
/// saves after this returns.
pub(crate) async fn refresh_with_ctrl_c(
    session: &mut Session,
    force: bool,
    json: bool,
) -> RefreshSummary {
    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => cancel.cancel(),
                Err(err) => warn!(error = %err, "could not listen for Ctrl-C"),
            }
        })
    };

    let forge = Arc::new(GhCliForge::new(session.config.forge.gh_bin.clone()));
    let refresher = PrRefresher::new(forge, RefreshConfig::from(&session.config.forge));

    let spinner = create_spinner("Refreshing pull request status", !json);
    let summary = refresher
        .refresh(
            &mut session.registry,
            &session.worktrees,
            &session.ids,
            force,
            cancel,
        )
        .await;
    spinner.finish_and_clear();
    watcher.abort();

    summary
}

pub async fn execute(args: PrArgs, config: &Config, json: bool) -> Result<()> {
    match args.command {
        PrCommands::Refresh { force } => {
            let mut session = Session::open(config).await?;
            let summary = refresh_with_ctrl_c(&mut session, force, json).await;
            session.commit()?;
            output(&RefreshOutput::from(summary), json);
        }
    }
    Ok(())
}
