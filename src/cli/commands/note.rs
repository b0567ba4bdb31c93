//! `arbor note`: free-text annotations on worktrees.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::cli::display::action_success;
use crate::cli::output::{output, CommandOutput};
use crate::cli::session::Session;
use crate::cli::types::TargetArgs;
use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct NoteArgs {
    #[command(subcommand)]
    pub command: NoteCommands,
}

#[derive(Subcommand, Debug)]
pub enum NoteCommands {
    /// Set the note (a blank note clears it)
    Set {
        /// Note text
        text: String,

        #[command(flatten)]
        target: TargetArgs,
    },
    /// Print the note
    Get {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Remove the note
    Clear {
        #[command(flatten)]
        target: TargetArgs,
    },
}

#[derive(Debug, Serialize)]
pub struct NoteOutput {
    pub id: u64,
    pub note: Option<String>,
    #[serde(skip)]
    pub changed: bool,
}

impl CommandOutput for NoteOutput {
    fn to_human(&self) -> String {
        match (&self.note, self.changed) {
            (Some(note), true) => action_success(&format!("Note on #{} set: {note}", self.id)),
            (None, true) => action_success(&format!("Note on #{} cleared", self.id)),
            (Some(note), false) => note.clone(),
            (None, false) => format!("No note on #{}", self.id),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: NoteArgs, config: &Config, json: bool) -> Result<()> {
    let session = Session::open(config).await?;

    let out = match args.command {
        NoteCommands::Get { target } => {
            let (target, _) = session.resolve_worktree(&target)?;
            let id = target.id.context("worktree without an ID")?;
            let note = session.entry(id).and_then(|e| e.note.clone());
            session.close();
            NoteOutput {
                id,
                note,
                changed: false,
            }
        }
        NoteCommands::Set { text, target } => update_note(session, &target, Some(&text))?,
        NoteCommands::Clear { target } => update_note(session, &target, None)?,
    };

    output(&out, json);
    Ok(())
}

fn update_note(mut session: Session, target: &TargetArgs, text: Option<&str>) -> Result<NoteOutput> {
    let (target, _) = session.resolve_worktree(target)?;
    let id = target.id.context("worktree without an ID")?;
    session.registry.set_note(id, text);
    let note = session.entry(id).and_then(|e| e.note.clone());
    session.commit()?;
    Ok(NoteOutput {
        id,
        note,
        changed: true,
    })
}
