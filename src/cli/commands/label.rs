//! `arbor label`: tag repositories so `label:branch` can address them.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::cli::display::{action_success, list_table, render_list};
use crate::cli::output::{output, CommandOutput};
use crate::cli::session::Session;
use crate::domain::errors::DomainError;
use crate::domain::models::{Config, RepoInfo};

#[derive(Args, Debug)]
pub struct LabelArgs {
    #[command(subcommand)]
    pub command: LabelCommands,
}

#[derive(Subcommand, Debug)]
pub enum LabelCommands {
    /// Add a label to a repository
    Add {
        /// Label name
        label: String,

        /// Repository name (defaults to the repository you are in)
        #[arg(short, long)]
        repo: Option<String>,
    },
    /// Remove a label from a repository
    Remove {
        /// Label name
        label: String,

        /// Repository name (defaults to the repository you are in)
        #[arg(short, long)]
        repo: Option<String>,
    },
    /// List repositories and their labels
    List,
}

#[derive(Debug, Serialize)]
pub struct LabelChangeOutput {
    pub repo: String,
    pub label: String,
    pub added: bool,
}

impl CommandOutput for LabelChangeOutput {
    fn to_human(&self) -> String {
        if self.added {
            action_success(&format!("Labelled {} '{}'", self.repo, self.label))
        } else {
            action_success(&format!("Removed label '{}' from {}", self.label, self.repo))
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct RepoRow {
    pub name: String,
    pub labels: Vec<String>,
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct LabelListOutput {
    pub repositories: Vec<RepoRow>,
}

impl CommandOutput for LabelListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["repo", "labels", "path"]);
        for repo in &self.repositories {
            table.add_row(vec![repo.name.clone(), repo.labels.join(", "), repo.path.clone()]);
        }
        render_list("repository", &table, self.repositories.len())
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Label names are used as `label:branch` scopes, so they cannot contain `:`.
fn validate_label(label: &str) -> Result<&str> {
    let trimmed = label.trim();
    if trimmed.is_empty() || trimmed.contains(':') || trimmed.chars().any(char::is_whitespace) {
        return Err(DomainError::InvalidTarget {
            token: label.to_string(),
            reason: "labels must be non-empty without ':' or whitespace".to_string(),
        }
        .into());
    }
    Ok(trimmed)
}

/// The named repository, or the one enclosing the working directory.
fn repo_for(session: &Session, name: Option<&str>) -> Result<RepoInfo> {
    if let Some(name) = name {
        return session
            .repos
            .iter()
            .find(|r| r.name == name)
            .cloned()
            .ok_or_else(|| DomainError::TargetNotFound(format!("no repository named '{name}'")).into());
    }

    let cwd = session.working_dir();
    if let Some(repo) = session
        .repos
        .iter()
        .filter(|r| cwd.starts_with(&r.path))
        .max_by_key(|r| r.path.components().count())
    {
        return Ok(repo.clone());
    }

    // Inside a worktree: label its main repository.
    if let Some(wt) = session
        .worktrees
        .iter()
        .filter(|wt| cwd.starts_with(&wt.path))
        .max_by_key(|wt| wt.path.components().count())
    {
        return Ok(session
            .repos
            .iter()
            .find(|r| r.path == wt.repo_path)
            .cloned()
            .unwrap_or_else(|| RepoInfo::new(&wt.repo_path, "")));
    }

    Err(DomainError::TargetRequired(
        "not inside a repository; pass one with -r".to_string(),
    )
    .into())
}

pub async fn execute(args: LabelArgs, config: &Config, json: bool) -> Result<()> {
    let session = Session::open(config).await?;

    match args.command {
        LabelCommands::Add { label, repo } => {
            let label = validate_label(&label)?;
            let repo = repo_for(&session, repo.as_deref())?;
            session.vcs().add_label(&repo, label).await?;
            session.close();
            output(
                &LabelChangeOutput {
                    repo: repo.name,
                    label: label.to_string(),
                    added: true,
                },
                json,
            );
        }
        LabelCommands::Remove { label, repo } => {
            let label = validate_label(&label)?;
            let repo = repo_for(&session, repo.as_deref())?;
            session.vcs().remove_label(&repo, label).await?;
            session.close();
            output(
                &LabelChangeOutput {
                    repo: repo.name,
                    label: label.to_string(),
                    added: false,
                },
                json,
            );
        }
        LabelCommands::List => {
            let repositories = session
                .repos
                .iter()
                .map(|r| RepoRow {
                    name: r.name.clone(),
                    labels: r.labels.clone(),
                    path: r.path.display().to_string(),
                })
                .collect();
            session.close();
            output(&LabelListOutput { repositories }, json);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_label() {
        assert_eq!(validate_label(" web ").unwrap(), "web");
        assert!(validate_label("").is_err());
        assert!(validate_label("a:b").is_err());
        assert!(validate_label("two words").is_err());
    }
}
