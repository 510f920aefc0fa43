use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use hed::{Compiler, render_xml};
use tracing::instrument;

#[derive(Debug, Parser)]
#[command(about = "Compile a text schema into a canonical document")]
pub struct Compile {
    /// The text schema
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Where to write the document (defaults to stdout)
    #[arg(long, short, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Document format
    #[arg(long, value_name = "FORMAT", default_value = "json")]
    format: Format,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum Format {
    #[default]
    Json,
    Yaml,
    /// The legacy XML layout
    Xml,
}

impl Compile {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        let text = std::fs::read_to_string(&self.input)
            .with_context(|| format!("failed to read '{}'", self.input.display()))?;

        let mut compiler = Compiler::new();
        let tree = compiler
            .compile(text.lines())
            .with_context(|| format!("failed to compile '{}'", self.input.display()))?;
        tracing::info!(
            nodes = tree.len(),
            unit_classes = tree.unit_classes().len(),
            lints = compiler.lints().len(),
            "compiled schema"
        );

        let document = match self.format {
            Format::Json => tree.to_json()?,
            Format::Yaml => tree.to_yaml()?,
            Format::Xml => render_xml(&tree)?,
        };

        super::write_output(self.output.as_deref(), &document)
    }
}
