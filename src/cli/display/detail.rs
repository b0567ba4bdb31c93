//! Detail view builder for key-value display of a single target.

use console::style;

use super::colors::label;

/// A builder for detail views (key-value display).
pub struct DetailView {
    title: String,
    sections: Vec<DetailSection>,
}

struct DetailSection {
    header: Option<String>,
    fields: Vec<(String, String)>,
}

impl DetailView {
    /// Create a new detail view with the given title.
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            sections: vec![DetailSection {
                header: None,
                fields: vec![],
            }],
        }
    }

    /// Add a key-value field to the current section.
    #[must_use]
    pub fn field(mut self, key: &str, value: &str) -> Self {
        if let Some(section) = self.sections.last_mut() {
            section.fields.push((key.to_string(), value.to_string()));
        }
        self
    }

    /// Add a field only if the value is Some.
    #[must_use]
    pub fn field_opt(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.field(key, v),
            None => self,
        }
    }

    /// Start a new named section with a header.
    #[must_use]
    pub fn section(mut self, header: &str) -> Self {
        self.sections.push(DetailSection {
            header: Some(header.to_string()),
            fields: vec![],
        });
        self
    }

    /// Render the detail view to a string.
    pub fn render(&self) -> String {
        let mut lines = vec![style(&self.title).bold().to_string()];
        let key_width = self
            .sections
            .iter()
            .flat_map(|s| s.fields.iter())
            .map(|(k, _)| k.chars().count())
            .max()
            .unwrap_or(12);

        for section in &self.sections {
            if section.fields.is_empty() {
                continue;
            }
            if let Some(header) = &section.header {
                lines.push(String::new());
                lines.push(style(header).bold().underlined().to_string());
            }
            for (key, value) in &section.fields {
                // Pad before styling; escape codes would skew the width.
                let pad = " ".repeat(key_width - key.chars().count());
                lines.push(format!("  {}{pad}  {value}", label(key)));
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_skips_empty_sections() {
        let text = DetailView::new("Worktree #3")
            .field("Branch", "feat/x")
            .field_opt("Note", None)
            .section("Pull request")
            .render();
        let plain = console::strip_ansi_codes(&text);
        assert!(plain.contains("Branch:"));
        assert!(plain.contains("feat/x"));
        assert!(!plain.contains("Note"));
        assert!(!plain.contains("Pull request"));
    }
}
