use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use hed::{SchemaSource, render};
use tracing::instrument;

#[derive(Debug, Parser)]
#[command(about = "Render a schema back to the text format")]
pub struct Render {
    /// The schema (a .json/.yaml canonical document, or the text format)
    #[arg(value_name = "SCHEMA")]
    schema: PathBuf,

    /// Where to write the text (defaults to stdout)
    #[arg(long, short, value_name = "OUTPUT")]
    output: Option<PathBuf>,
}

impl Render {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        let source = SchemaSource::open(&self.schema)
            .with_context(|| format!("failed to read schema '{}'", self.schema.display()))?;
        let text = render(source.tree())?;
        super::write_output(self.output.as_deref(), &text)
    }
}
