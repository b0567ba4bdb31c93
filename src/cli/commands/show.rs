//! `arbor show`: details of one worktree or repository.

use anyhow::Result;
use serde::Serialize;

use crate::cli::display::{colorize_pr, DetailView};
use crate::cli::output::{output, CommandOutput};
use crate::cli::session::Session;
use crate::cli::types::TargetArgs;
use crate::domain::models::{Config, PrStatus};

#[derive(Debug, Serialize)]
pub struct TargetDetailOutput {
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub repo: String,
    pub branch: String,
    pub path: String,
    pub main_repo_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dirty: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_status: Option<PrStatus>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

impl CommandOutput for TargetDetailOutput {
    fn to_human(&self) -> String {
        let title = match self.id {
            Some(id) => format!("Worktree #{id}"),
            None => format!("Repository {}", self.repo),
        };
        let branch = if self.branch.is_empty() {
            "(detached)"
        } else {
            self.branch.as_str()
        };
        let dirty = self.dirty.map(|d| if d { "yes" } else { "no" });
        let labels = (!self.labels.is_empty()).then(|| self.labels.join(", "));
        let pr_label = self.pr_status.as_ref().map(|s| colorize_pr(&s.label()).to_string());
        let pr_checked = self
            .pr_status
            .as_ref()
            .and_then(|s| s.fetched_at)
            .map(|t| t.to_rfc3339());

        DetailView::new(&title)
            .field("Repo", &self.repo)
            .field("Branch", branch)
            .field("Path", &self.path)
            .field("Main repo", &self.main_repo_path)
            .field_opt("Dirty", dirty)
            .field_opt("Origin", self.origin_url.as_deref())
            .field_opt("Labels", labels.as_deref())
            .field_opt("Note", self.note.as_deref())
            .section("Pull request")
            .field_opt("Status", pr_label.as_deref())
            .field_opt("URL", self.pr_status.as_ref().and_then(PrStatus::url))
            .field_opt("Checked", pr_checked.as_deref())
            .render()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: TargetArgs, config: &Config, json: bool) -> Result<()> {
    let session = Session::open(config).await?;
    let target = session.resolve(&args)?;

    let out = match target.id {
        Some(id) => {
            let live = session.live(&target.path);
            let entry = session.entry(id);
            TargetDetailOutput {
                kind: "worktree",
                id: Some(id),
                repo: target.repo_name(),
                branch: target.branch.clone(),
                path: target.path.display().to_string(),
                main_repo_path: target.main_repo_path.display().to_string(),
                dirty: live.map(|wt| wt.is_dirty),
                origin_url: live.map(|wt| wt.origin_url.clone()).filter(|u| !u.is_empty()),
                note: entry.and_then(|e| e.note.clone()),
                pr_status: entry.and_then(|e| e.pr_status.clone()),
                labels: Vec::new(),
            }
        }
        None => TargetDetailOutput {
            kind: "repository",
            id: None,
            repo: target.repo_name(),
            branch: target.branch.clone(),
            path: target.path.display().to_string(),
            main_repo_path: target.main_repo_path.display().to_string(),
            dirty: None,
            origin_url: None,
            note: None,
            pr_status: None,
            labels: session
                .repos
                .iter()
                .find(|r| r.path == target.path)
                .map(|r| r.labels.clone())
                .unwrap_or_default(),
        },
    };
    session.close();

    output(&out, json);
    Ok(())
}
