use std::io;

use rayon::prelude::*;
use serde::Serialize;
use tracing::instrument;

use crate::{
    input::Row,
    validation::{Issue, Severity, Validator},
};

/// The issues found on one input row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowReport {
    line: usize,
    issues: Vec<Issue>,
}

impl RowReport {
    /// 1-based line number of the row.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }

    /// Every issue of the row, in rule engine order.
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    fn of(&self, severity: Severity) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(move |issue| issue.severity() == severity)
    }
}

/// The result of validating a whole input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    rows: Vec<RowReport>,
}

impl Report {
    /// Rows that have at least one issue, in input order.
    #[must_use]
    pub fn rows(&self) -> &[RowReport] {
        &self.rows
    }

    /// Total number of errors.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Total number of warnings.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// Whether any row has an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    fn count(&self, severity: Severity) -> usize {
        self.rows.iter().map(|row| row.of(severity).count()).sum()
    }

    /// Writes the error channel: an `Errors on line N:` header per row,
    /// one tab-prefixed entry per error and a blank line.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_errors(&self, out: &mut impl io::Write) -> io::Result<()> {
        self.write_channel(out, Severity::Error, "Errors")
    }

    /// Writes the warning channel, in the same layout as
    /// [`Report::write_errors`].
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_warnings(&self, out: &mut impl io::Write) -> io::Result<()> {
        self.write_channel(out, Severity::Warning, "Warnings")
    }

    fn write_channel(
        &self,
        out: &mut impl io::Write,
        severity: Severity,
        heading: &str,
    ) -> io::Result<()> {
        for row in &self.rows {
            let mut issues = row.of(severity).peekable();
            if issues.peek().is_none() {
                continue;
            }
            writeln!(out, "{heading} on line {}:", row.line)?;
            for issue in issues {
                writeln!(out, "\t{issue}")?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    /// Renders the report as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Validates every row. Rows are independent and are checked in parallel;
/// the report keeps input order.
#[instrument(level = "debug", skip_all, fields(rows = rows.len()))]
pub fn validate_rows(validator: &Validator, rows: &[Row]) -> Report {
    let rows: Vec<RowReport> = rows
        .par_iter()
        .map(|row| RowReport {
            line: row.line,
            issues: validator.validate_str(&row.text),
        })
        .filter(|report| !report.issues.is_empty())
        .collect();

    let report = Report { rows };
    tracing::debug!(
        errors = report.error_count(),
        warnings = report.warning_count(),
        "rows validated"
    );
    report
}
