//! `arbor sync`: reconcile the registry with worktrees on disk.

use anyhow::Result;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::cli::session::Session;
use crate::domain::models::Config;

#[derive(Debug, Serialize)]
pub struct SyncOutput {
    pub live: usize,
    pub created: usize,
    pub updated: usize,
    pub reassociated: usize,
    pub retired: usize,
    pub vanished: usize,
    pub next_id: u64,
}

impl CommandOutput for SyncOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!(
            "{} live worktree(s): {} new, {} updated, {} moved",
            self.live, self.created, self.updated, self.reassociated
        )];
        if self.vanished > 0 {
            lines.push(format!(
                "{} registered worktree(s) no longer on disk (IDs kept)",
                self.vanished
            ));
        }
        if self.retired > 0 {
            lines.push(format!(
                "{} removed entr{} set aside under a new key",
                self.retired,
                if self.retired == 1 { "y" } else { "ies" }
            ));
        }
        lines.push(format!("Next ID: {}", self.next_id));
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(config: &Config, json: bool) -> Result<()> {
    let session = Session::open(config).await?;
    let report = session.report;
    let out = SyncOutput {
        live: session.ids.len(),
        created: report.created,
        updated: report.updated,
        reassociated: report.reassociated,
        retired: report.retired,
        vanished: report.vanished,
        next_id: session.registry.next_id,
    };
    session.close();

    output(&out, json);
    Ok(())
}
