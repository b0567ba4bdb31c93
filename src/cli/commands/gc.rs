//! `arbor gc`: purge old removed entries.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use serde::Serialize;
use tracing::info;

use crate::cli::output::{output, CommandOutput};
use crate::cli::session::Session;
use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct GcArgs {
    /// Purge entries removed more than this many days ago
    #[arg(long, value_name = "DAYS", default_value_t = 30)]
    pub older_than_days: u32,
}

#[derive(Debug, Serialize)]
pub struct GcOutput {
    pub purged: usize,
    pub older_than_days: u32,
}

impl CommandOutput for GcOutput {
    fn to_human(&self) -> String {
        format!(
            "Purged {} removed entr{} older than {} day(s). Their IDs stay retired.",
            self.purged,
            if self.purged == 1 { "y" } else { "ies" },
            self.older_than_days
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Removal time before which entries are purged. Ages reaching past the
/// earliest representable time purge nothing.
fn cutoff(now: DateTime<Utc>, older_than_days: u32) -> DateTime<Utc> {
    Duration::try_days(i64::from(older_than_days))
        .and_then(|age| now.checked_sub_signed(age))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub async fn execute(args: GcArgs, config: &Config, json: bool) -> Result<()> {
    let mut session = Session::open(config).await?;
    let purged = session
        .registry
        .purge_removed(cutoff(Utc::now(), args.older_than_days));
    session.commit()?;
    info!(purged, days = args.older_than_days, "registry garbage collected");

    output(
        &GcOutput {
            purged,
            older_than_days: args.older_than_days,
        },
        json,
    );
    Ok(())
}
