use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::Parser;
use hed::{
    Config, Report, RowReader, SchemaSource, Validator, config::FILE_NAME, validate_rows,
};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Validate tag strings against a schema")]
pub struct Validate {
    /// The schema (text format, or a .json/.yaml canonical document)
    #[arg(long, value_name = "PATH")]
    schema: PathBuf,

    /// Validation settings (defaults to hed.toml next to the input, if any)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Tab-separated columns holding tags, 1-based (can be specified
    /// multiple times)
    #[arg(long = "column", value_name = "N")]
    columns: Vec<usize>,

    /// Skip the first line of the input
    #[arg(long)]
    skip_header: bool,

    /// Write the error channel to a file instead of stdout
    #[arg(long, value_name = "PATH")]
    errors: Option<PathBuf>,

    /// Write the warning channel to a file instead of stdout
    #[arg(long, value_name = "PATH")]
    warnings: Option<PathBuf>,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Validate a single tag string instead of a file
    #[arg(long, short, value_name = "TAGS", conflicts_with = "file")]
    string: Option<String>,

    /// The input file, one tag string per line
    #[arg(required_unless_present = "string")]
    file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Validate {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        let config = self.load_config()?;

        let source = SchemaSource::open(&self.schema)
            .with_context(|| format!("failed to read schema '{}'", self.schema.display()))?;
        let schema = source.load(&config)?;
        tracing::info!(
            schema = %source.path().display(),
            tags = schema.len(),
            "schema loaded"
        );
        let validator = Validator::with_config(&schema, &config)?;

        let reader = RowReader::new()
            .with_columns(self.columns.clone())
            .with_skip_header(self.skip_header);
        let rows = match (&self.string, &self.file) {
            (Some(string), _) => reader.read_str(string),
            (None, Some(file)) => reader
                .read_path(file)
                .with_context(|| format!("failed to read '{}'", file.display()))?,
            (None, None) => anyhow::bail!("no input given"),
        };
        tracing::info!(rows = rows.len(), "validating");

        let report = validate_rows(&validator, &rows);

        match self.output {
            OutputFormat::Table => self.output_table(&report)?,
            OutputFormat::Json => super::write_output(None, &report.to_json()?)?,
        }

        // Exit with appropriate code
        if report.has_errors() {
            std::process::exit(2);
        }

        Ok(())
    }

    /// `--config` if given, else `hed.toml` beside the input file (or in the
    /// working directory for `--string`), else the defaults.
    fn load_config(&self) -> anyhow::Result<Config> {
        if let Some(path) = &self.config {
            return Config::load(path)
                .with_context(|| format!("failed to load config '{}'", path.display()));
        }

        let directory = self
            .file
            .as_deref()
            .and_then(Path::parent)
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let candidate = directory.join(FILE_NAME);
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "using config");
            Config::load(&candidate)
                .with_context(|| format!("failed to load config '{}'", candidate.display()))
        } else {
            Ok(Config::default())
        }
    }

    fn output_table(&self, report: &Report) -> anyhow::Result<()> {
        match &self.errors {
            Some(path) => report.write_errors(&mut super::create(path)?)?,
            None => report.write_errors(&mut io::stdout().lock())?,
        }
        match &self.warnings {
            Some(path) => report.write_warnings(&mut super::create(path)?)?,
            None => report.write_warnings(&mut io::stdout().lock())?,
        }

        let errors = report.error_count();
        let warnings = report.warning_count();
        let summary = format!("{errors} errors, {warnings} warnings");
        let summary = if errors > 0 {
            summary.error()
        } else if warnings > 0 {
            summary.warning()
        } else {
            summary.success()
        };

        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{summary}")?;
        if errors + warnings > 0 && (self.errors.is_some() || self.warnings.is_some()) {
            writeln!(stdout, "{}", "See the report files for details".dim())?;
        }
        Ok(())
    }
}
