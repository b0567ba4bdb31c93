//! Color mapping for PR states and worktree markers.

use console::{style, StyledObject};

/// Colored PR label (`#12 OPEN`, `none`, `-`).
///
/// Color scheme:
/// - Green:  open
/// - Magenta: merged
/// - Red:    closed
/// - Dim:    no PR / never fetched
pub fn colorize_pr(label: &str) -> StyledObject<&str> {
    let upper = label.to_uppercase();
    if upper.ends_with("OPEN") {
        style(label).green()
    } else if upper.ends_with("MERGED") {
        style(label).magenta()
    } else if upper.ends_with("CLOSED") {
        style(label).red()
    } else {
        style(label).dim()
    }
}

/// Marker shown next to worktrees with uncommitted changes.
pub fn dirty_marker(is_dirty: bool) -> String {
    if is_dirty {
        style("*").yellow().bold().to_string()
    } else {
        String::new()
    }
}

/// Bold key followed by a dimmed colon.
pub fn label(name: &str) -> String {
    format!("{}{}", style(name).bold(), style(":").dim())
}
