//! Reads tag strings from a text file, one row per line.
//!
//! Spreadsheet ingestion is left to other tools. Tab-separated exports are
//! supported by selecting columns, whose cells are joined into one tag string.

use std::{io, path::Path};

/// One input row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// 1-based line number in the input.
    pub line: usize,
    /// The tag string.
    pub text: String,
}

/// Splits input text into rows.
#[derive(Debug, Clone, Default)]
pub struct RowReader {
    columns: Vec<usize>,
    skip_header: bool,
}

impl RowReader {
    /// A reader that takes every line whole.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects 1-based tab-separated columns. Empty selects the whole line.
    #[must_use]
    pub fn with_columns(mut self, columns: Vec<usize>) -> Self {
        self.columns = columns;
        self
    }

    /// Skips the first line.
    #[must_use]
    pub const fn with_skip_header(mut self, skip_header: bool) -> Self {
        self.skip_header = skip_header;
        self
    }

    /// Splits text into rows. Blank rows are dropped but keep their line
    /// numbers.
    #[must_use]
    pub fn read_str(&self, text: &str) -> Vec<Row> {
        text.lines()
            .enumerate()
            .skip(usize::from(self.skip_header))
            .filter_map(|(index, line)| {
                let text = self.select(line);
                (!text.trim().is_empty()).then(|| Row {
                    line: index + 1,
                    text,
                })
            })
            .collect()
    }

    /// Reads a file and splits it into rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read_path(&self, path: &Path) -> io::Result<Vec<Row>> {
        let text = std::fs::read_to_string(path)?;
        Ok(self.read_str(&text))
    }

    fn select(&self, line: &str) -> String {
        if self.columns.is_empty() {
            return line.to_string();
        }

        let cells: Vec<&str> = line.split('\t').collect();
        self.columns
            .iter()
            .filter_map(|&column| cells.get(column.checked_sub(1)?))
            .map(|cell| unquote(cell.trim()))
            .filter(|cell| !cell.is_empty())
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn unquote(cell: &str) -> &str {
    cell.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(cell)
        .trim()
}
