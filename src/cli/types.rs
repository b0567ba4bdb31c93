//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::cli::commands::{
    exec::ExecArgs, gc::GcArgs, label::LabelArgs, list::ListArgs, note::NoteArgs, pr::PrArgs,
    prune::PruneArgs, remove::RemoveArgs, reset::ResetArgs,
};
use crate::domain::models::ResolveContext;

#[derive(Parser, Debug)]
#[command(name = "arbor")]
#[command(about = "Arbor - stable numeric IDs for git worktrees", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (merged over user and project config)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List worktrees with their IDs
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show details for a worktree or repository
    Show(TargetArgs),

    /// Print the path of a worktree or repository
    Path(TargetArgs),

    /// Set, show or clear a worktree note
    Note(NoteArgs),

    /// Run a command inside a worktree
    Exec(ExecArgs),

    /// Remove a worktree
    #[command(alias = "rm")]
    Remove(RemoveArgs),

    /// Remove clean worktrees whose pull request is merged
    Prune(PruneArgs),

    /// Pull request status commands
    Pr(PrArgs),

    /// Manage repository labels
    Label(LabelArgs),

    /// Reconcile the registry with worktrees on disk
    Sync,

    /// Purge removed entries from the registry
    Gc(GcArgs),

    /// Clear the registry; IDs are renumbered on the next sync
    Reset(ResetArgs),
}

/// How a command picks its worktree or repository.
///
/// A positional target wins; otherwise the flags and then the working
/// directory are consulted.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Worktree ID, branch, or scope:branch (scope is a repo name or label)
    #[arg(conflicts_with_all = ["number", "repo", "label"])]
    pub target: Option<String>,

    /// Worktree ID
    #[arg(short = 'n', long = "number", value_name = "ID")]
    pub number: Option<u64>,

    /// Repository name
    #[arg(short, long, value_name = "NAME")]
    pub repo: Option<String>,

    /// Repository label
    #[arg(short, long, value_name = "LABEL")]
    pub label: Option<String>,
}

impl TargetArgs {
    /// Resolution context for flag/working-directory based lookup.
    pub fn context(&self, working_dir: PathBuf) -> ResolveContext {
        ResolveContext {
            working_dir,
            explicit_id: self.number,
            explicit_repo: self.repo.clone(),
            explicit_label: self.label.clone(),
        }
    }
}
