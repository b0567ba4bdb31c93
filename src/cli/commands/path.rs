//! `arbor path`: print a target's directory, e.g. `cd "$(arbor path 3)"`.

use anyhow::Result;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::cli::session::Session;
use crate::cli::types::TargetArgs;
use crate::domain::models::Config;

#[derive(Debug, Serialize)]
pub struct PathOutput {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

impl CommandOutput for PathOutput {
    fn to_human(&self) -> String {
        self.path.clone()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: TargetArgs, config: &Config, json: bool) -> Result<()> {
    let session = Session::open(config).await?;
    let target = session.resolve(&args)?;
    session.close();

    output(
        &PathOutput {
            path: target.path.display().to_string(),
            id: target.id,
        },
        json,
    );
    Ok(())
}
