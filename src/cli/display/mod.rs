//! Display framework for CLI output formatting.
//!
//! Shared primitives for colors, tables and detail views used across
//! command output. Coloring goes through `console`, which honours
//! `NO_COLOR` and drops styling when stdout is not a terminal.

pub mod colors;
pub mod detail;
pub mod progress;
pub mod table;

pub use colors::*;
pub use detail::*;
pub use progress::create_spinner;
pub use table::*;

/// Render a success action result.
pub fn action_success(message: &str) -> String {
    format!("{} {}", console::style("\u{2713}").green().bold(), message)
}

/// Render a failure action result.
pub fn action_failure(message: &str) -> String {
    format!("{} {}", console::style("\u{2717}").red().bold(), message)
}
