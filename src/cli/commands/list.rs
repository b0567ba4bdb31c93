//! `arbor list`: every live worktree with its ID.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::commands::pr::{refresh_with_ctrl_c, RefreshOutput};
use crate::cli::display::{colorize_pr, dirty_marker, list_table, render_list};
use crate::cli::output::{output, truncate, CommandOutput};
use crate::cli::session::Session;
use crate::domain::models::Config;

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Refresh pull request status before listing
    #[arg(long)]
    pub refresh: bool,

    /// With --refresh, ignore cached status
    #[arg(long, requires = "refresh")]
    pub force: bool,
}

#[derive(Debug, Serialize)]
pub struct WorktreeRow {
    pub id: u64,
    pub repo: String,
    pub branch: String,
    pub path: String,
    pub dirty: bool,
    pub pr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WorktreeListOutput {
    pub worktrees: Vec<WorktreeRow>,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh: Option<RefreshOutput>,
}

impl CommandOutput for WorktreeListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "repo", "branch", "pr", "note", "path"]);
        for row in &self.worktrees {
            let branch = if row.branch.is_empty() {
                "(detached)".to_string()
            } else {
                row.branch.clone()
            };
            table.add_row(vec![
                row.id.to_string(),
                row.repo.clone(),
                format!("{branch}{}", dirty_marker(row.dirty)),
                colorize_pr(&row.pr).to_string(),
                truncate(row.note.as_deref().unwrap_or(""), 40),
                row.path.clone(),
            ]);
        }
        let mut text = render_list("worktree", &table, self.total);
        if let Some(refresh) = &self.refresh {
            text.push('\n');
            text.push_str(&refresh.to_human());
        }
        text
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Rows for every live worktree, ordered by ID.
pub(crate) fn worktree_rows(session: &Session) -> Vec<WorktreeRow> {
    let mut rows: Vec<WorktreeRow> = session
        .worktrees
        .iter()
        .filter_map(|wt| {
            let id = *session.ids.get(&wt.path)?;
            let entry = session.entry(id);
            let pr_status = entry.and_then(|e| e.pr_status.as_ref());
            Some(WorktreeRow {
                id,
                repo: wt.repo_name(),
                branch: wt.branch.clone(),
                path: wt.path.display().to_string(),
                dirty: wt.is_dirty,
                pr: pr_status.map_or_else(|| "-".to_string(), |s| s.label()),
                pr_url: pr_status.and_then(|s| s.url()).map(str::to_string),
                note: entry.and_then(|e| e.note.clone()),
            })
        })
        .collect();
    rows.sort_by_key(|r| r.id);
    rows
}

pub async fn execute(args: ListArgs, config: &Config, json: bool) -> Result<()> {
    let mut session = Session::open(config).await?;

    let refresh = if args.refresh {
        let summary = refresh_with_ctrl_c(&mut session, args.force, json).await;
        Some(RefreshOutput::from(summary))
    } else {
        None
    };

    let worktrees = worktree_rows(&session);
    if refresh.is_some() {
        session.commit()?;
    } else {
        session.close();
    }

    let out = WorktreeListOutput {
        total: worktrees.len(),
        worktrees,
        refresh,
    };
    output(&out, json);
    Ok(())
}
