//! Markdown table rendering.
//!
//! Produces a GitHub-flavored Markdown table with sort indicators in the
//! header row, followed by the footer line. While loading, and when the
//! query matched nothing, the table has no body rows and the status
//! message follows it in italics.
//!
//! # Example
//!
//! ```rust
//! use tutorlix_render::{Column, MarkdownRenderer};
//! use tutorlix_table::TableState;
//!
//! let state: TableState = TableState::new(50);
//! let columns = Column::parse_list("id,title");
//! let markdown = MarkdownRenderer::new(&state.snapshot(), &columns).render();
//! assert!(markdown.contains("_Fetching data..._"));
//! ```

use std::fmt::Write;

use tutorlix_table::TableSnapshot;

use crate::{page_line, showing_line, Body, Column};

/// Renders a snapshot as a Markdown table.
pub struct MarkdownRenderer<'a> {
    snapshot: &'a TableSnapshot,
    columns: &'a [Column],
}

impl<'a> MarkdownRenderer<'a> {
    /// Creates a renderer for the given snapshot and columns.
    #[must_use]
    pub const fn new(snapshot: &'a TableSnapshot, columns: &'a [Column]) -> Self {
        Self { snapshot, columns }
    }

    /// Renders the search line, table, status message and footer.
    #[must_use]
    pub fn render(&self) -> String {
        let mut output = String::new();

        self.write_search(&mut output);
        self.write_header(&mut output);
        self.write_body(&mut output);
        self.write_footer(&mut output);

        output
    }

    fn write_search(&self, output: &mut String) {
        if !self.snapshot.search.is_empty() {
            let _ = writeln!(
                output,
                "**Search:** {}\n",
                escape_markdown(&self.snapshot.search)
            );
        }
    }

    fn write_header(&self, output: &mut String) {
        let labels: Vec<String> = self
            .columns
            .iter()
            .map(|column| escape_markdown(&column.label(&self.snapshot.sorting)))
            .collect();
        let _ = writeln!(output, "| {} |", labels.join(" | "));

        let rule = vec!["---"; self.columns.len()];
        let _ = writeln!(output, "| {} |", rule.join(" | "));
    }

    fn write_body(&self, output: &mut String) {
        match Body::of(self.snapshot) {
            Body::Rows(rows) => {
                for row in rows {
                    let cells: Vec<String> = self
                        .columns
                        .iter()
                        .map(|column| escape_markdown(&column.cell(row)))
                        .collect();
                    let _ = writeln!(output, "| {} |", cells.join(" | "));
                }
            }
            Body::Message(message) => {
                let _ = writeln!(output, "\n_{message}_");
            }
        }
    }

    fn write_footer(&self, output: &mut String) {
        let _ = writeln!(
            output,
            "\n{} · {}",
            showing_line(self.snapshot),
            page_line(self.snapshot)
        );
    }
}

/// Escapes characters that have meaning inside a Markdown table cell.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for ch in text.chars() {
        match ch {
            '*' | '_' | '`' | '#' | '[' | ']' | '(' | ')' | '!' | '\\' | '<' | '>' | '|' => {
                result.push('\\');
                result.push(ch);
            }
            '\n' => result.push_str("<br>"),
            _ => result.push(ch),
        }
    }

    result
}
