//! Table builder wrapper around comfy-table for consistent list display.

use comfy_table::{presets, Cell, CellAlignment, ContentArrangement, Table};
use console::style;

/// Create a standard list table with the given headers.
///
/// Uses the NOTHING preset (no borders) for a clean CLI aesthetic.
pub fn list_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h.to_uppercase()).set_alignment(CellAlignment::Left)),
        );
    table
}

/// Render the table to string with a count header.
pub fn render_list(entity_name: &str, table: &Table, total: usize) -> String {
    if total == 0 {
        return format!("No {} found.", plural(entity_name));
    }
    let count_line = format!(
        "{} {}:",
        style(total).bold(),
        if total == 1 {
            entity_name.to_string()
        } else {
            plural(entity_name)
        }
    );
    format!("{count_line}\n{table}")
}

fn plural(noun: &str) -> String {
    match noun.strip_suffix('y') {
        Some(stem) => format!("{stem}ies"),
        None => format!("{noun}s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_empty_list() {
        let table = list_table(&["id", "branch"]);
        assert_eq!(render_list("worktree", &table, 0), "No worktrees found.");
    }

    #[test]
    fn test_render_list_pluralizes() {
        let mut table = list_table(&["id", "branch"]);
        table.add_row(vec!["1", "main"]);
        let text = console::strip_ansi_codes(&render_list("worktree", &table, 1)).to_string();
        assert!(text.starts_with("1 worktree:"));
        assert!(text.contains("BRANCH"));
        assert!(text.contains("main"));
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural("worktree"), "worktrees");
        assert_eq!(plural("repository"), "repositories");
    }
}
