//! `arbor reset`: clear the registry.

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::display::action_success;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::infrastructure::registry::RegistryStore;

#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Confirm: every ID, note and cached PR status is discarded
    #[arg(long)]
    pub yes: bool,
}

#[derive(Debug, Serialize)]
pub struct ResetOutput {
    pub registry: String,
}

impl CommandOutput for ResetOutput {
    fn to_human(&self) -> String {
        action_success(&format!(
            "Registry {} cleared; IDs restart at 1 on the next command",
            self.registry
        ))
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: ResetArgs, config: &Config, json: bool) -> Result<()> {
    if !args.yes {
        anyhow::bail!("Reset discards every ID, note and cached PR status; rerun with --yes");
    }

    let dir = std::fs::canonicalize(&config.worktree_dir).unwrap_or_else(|_| config.worktree_dir.clone());
    let store = RegistryStore::new(dir, Duration::from_millis(config.registry.lock_timeout_ms));
    store.reset().await?;

    output(
        &ResetOutput {
            registry: store.registry_path().display().to_string(),
        },
        json,
    );
    Ok(())
}
