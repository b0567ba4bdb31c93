//! `arbor exec`: run a command in each matched worktree or repository.

use std::process::Stdio;

use anyhow::{Context, Result};
use clap::Args;
use tokio::process::Command;
use tracing::debug;

use crate::cli::session::Session;
use crate::cli::types::TargetArgs;
use crate::domain::models::Config;

/// Exported to the child so scripts know which worktree they run in.
pub const WORKTREE_ID_ENV: &str = "ARBOR_WORKTREE_ID";

#[derive(Args, Debug)]
pub struct ExecArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Command and arguments, after `--`
    #[arg(last = true, required = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

pub async fn execute(args: ExecArgs, config: &Config, _json: bool) -> Result<()> {
    let session = Session::open(config).await?;
    let targets = session.resolve_all(&args.target)?;
    // The child may itself run arbor; never hold the registry lock across it.
    session.close();

    let (program, rest) = args
        .command
        .split_first()
        .context("No command given after `--`")?;

    let mut exit_code = 0;
    for target in &targets {
        let mut command = Command::new(program);
        command
            .args(rest)
            .current_dir(&target.path)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(id) = target.id {
            command.env(WORKTREE_ID_ENV, id.to_string());
        }

        debug!(%target, program = %program, "running command");
        let status = command
            .status()
            .await
            .with_context(|| format!("Failed to run `{program}` in {}", target.path.display()))?;

        if !status.success() && exit_code == 0 {
            exit_code = status.code().unwrap_or(1);
        }
    }

    if exit_code != 0 {
        // First failing child's exit code, passed through unchanged.
        std::process::exit(exit_code);
    }
    Ok(())
}
