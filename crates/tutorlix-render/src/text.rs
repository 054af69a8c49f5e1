//! Plain-text table rendering for terminals.

use std::fmt::Write;

use tutorlix_table::TableSnapshot;

use crate::{page_line, showing_line, Body, Column};

/// Column separator.
const GUTTER: &str = "  ";

/// Renders a snapshot as an aligned plain-text table.
pub struct TextRenderer<'a> {
    snapshot: &'a TableSnapshot,
    columns: &'a [Column],
}

impl<'a> TextRenderer<'a> {
    /// Creates a renderer for the given snapshot and columns.
    #[must_use]
    pub const fn new(snapshot: &'a TableSnapshot, columns: &'a [Column]) -> Self {
        Self { snapshot, columns }
    }

    /// Renders the table, body and footer.
    #[must_use]
    pub fn render(&self) -> String {
        let mut output = String::new();

        if !self.snapshot.search.is_empty() {
            let _ = writeln!(output, "Search: {}\n", self.snapshot.search);
        }

        let headers: Vec<String> = self
            .columns
            .iter()
            .map(|column| column.label(&self.snapshot.sorting))
            .collect();

        let body = Body::of(self.snapshot);
        let cells: Vec<Vec<String>> = match body {
            Body::Rows(rows) => rows
                .iter()
                .map(|row| self.columns.iter().map(|column| column.cell(row)).collect())
                .collect(),
            Body::Message(_) => Vec::new(),
        };

        let widths: Vec<usize> = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                cells
                    .iter()
                    .map(|row| display_width(&row[i]))
                    .chain(std::iter::once(display_width(header)))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write_line(&mut output, &headers, &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        write_line(&mut output, &rule, &widths);

        match body {
            Body::Rows(_) => {
                for row in &cells {
                    write_line(&mut output, row, &widths);
                }
            }
            Body::Message(message) => {
                let _ = writeln!(output, "{message}");
            }
        }

        let _ = writeln!(output);
        let _ = writeln!(output, "{}", showing_line(self.snapshot));
        let _ = writeln!(output, "{}", page_line(self.snapshot));

        output
    }
}

/// Writes one padded row, without trailing whitespace.
fn write_line(output: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if i > 0 {
            line.push_str(GUTTER);
        }
        line.push_str(cell);
        let padding = width.saturating_sub(display_width(cell));
        line.extend(std::iter::repeat(' ').take(padding));
    }
    let _ = writeln!(output, "{}", line.trim_end());
}

fn display_width(text: &str) -> usize {
    text.chars().count()
}
