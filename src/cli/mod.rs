//! Command-line interface: argument types, commands and output.

pub mod commands;
pub mod display;
pub mod output;
pub mod session;
pub mod types;

pub use session::Session;
pub use types::{Cli, Commands, TargetArgs};

/// Print `err` and exit with status 1.
///
/// With `--json` the error is a `{"error": ...}` object on stdout so scripts
/// can parse it; otherwise it goes to stderr.
pub fn handle_error(err: anyhow::Error, json: bool) -> ! {
    let message = format!("{err:#}");
    if json {
        let payload = serde_json::json!({ "error": message });
        println!("{}", serde_json::to_string_pretty(&payload).unwrap_or_default());
    } else {
        eprintln!("{} {message}", console::style("error:").red().bold());
    }
    std::process::exit(1);
}
