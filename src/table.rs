use std::fmt::Write;

use itertools::Itertools;
use unicode_width::UnicodeWidthStr;

struct Column {
    header: String,
    data: Vec<String>,
}

/// A builder for aligned tabular output.
///
/// Columns are added with `column()`. Headers are left-justified and underlined by a rule,
/// data is right-justified so numbers line up. Call `render()` for the text or `print()` to
/// write it to stdout.
#[derive(Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Create an empty table.
    pub fn new() -> Self {
        Table::default()
    }

    /// Add a column with the given header and data rows.
    pub fn column(mut self, header: impl Into<String>, data: Vec<String>) -> Self {
        self.columns.push(Column {
            header: header.into(),
            data,
        });
        self
    }

    /// Format the table. Rows missing from shorter columns render as empty cells.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if self.columns.is_empty() {
            return out;
        }

        // Column widths: max of header and data widths (using Unicode width)
        let widths: Vec<usize> = self
            .columns
            .iter()
            .map(|col| {
                let max_data = col.data.iter().map(|v| v.width()).max().unwrap_or(0);
                std::cmp::max(col.header.width(), max_data)
            })
            .collect();

        let header = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(c, &w)| ljust(&c.header, w))
            .join(" | ");
        let _ = writeln!(out, "{}", header.trim_end());

        let rule = widths.iter().map(|&w| "-".repeat(w)).join("-+-");
        let _ = writeln!(out, "{rule}");

        let num_rows = self.columns.iter().map(|c| c.data.len()).max().unwrap_or(0);
        for row_idx in 0..num_rows {
            let row = self
                .columns
                .iter()
                .zip(&widths)
                .map(|(col, &w)| rjust(col.data.get(row_idx).map_or("", |s| s.as_str()), w))
                .join(" | ");
            let _ = writeln!(out, "{}", row.trim_end());
        }
        out
    }

    /// Print the table to stdout with aligned columns.
    pub fn print(&self) {
        print!("{}", self.render());
    }
}

/// Dedup consecutive identical values, replacing duplicates with empty strings
/// e.g. `dedup(["foo", "foo", "foo", "bar", "bar", "baz"]) == ["foo", "", "", "bar", "", "baz"]`.
pub fn dedup(items: impl IntoIterator<Item = String>) -> Vec<String> {
    items
        .into_iter()
        .chunk_by(|item| item.clone())
        .into_iter()
        .flat_map(|(key, group)| {
            std::iter::once(key).chain(std::iter::repeat_n(String::new(), group.count() - 1))
        })
        .collect()
}

/// Left-justify string to given width (using Unicode display width).
fn ljust(s: &str, width: usize) -> String {
    let current_width = s.width();
    if current_width >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - current_width))
    }
}

/// Right-justify string to given width (using Unicode display width).
fn rjust(s: &str, width: usize) -> String {
    let current_width = s.width();
    if current_width >= width {
        s.to_string()
    } else {
        format!("{}{}", " ".repeat(width - current_width), s)
    }
}
