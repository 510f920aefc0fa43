use std::{
    fs::File,
    io::{self, Write},
    path::Path,
};

use anyhow::Context;
use clap::ArgAction;

mod compile;
mod render;
mod terminal;
mod validate;

use compile::Compile;
use render::Render;
use validate::Validate;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global=true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);
        self.command.run()
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Validate tag strings against a schema
    ///
    /// Each line of the input is one tag string. Errors and warnings are
    /// reported per line.
    Validate(Validate),

    /// Compile a text schema into a canonical document
    Compile(Compile),

    /// Render a schema back to the text format
    Render(Render),
}

impl Command {
    fn run(self) -> anyhow::Result<()> {
        match self {
            Self::Validate(command) => command.run()?,
            Self::Compile(command) => command.run()?,
            Self::Render(command) => command.run()?,
        }
        Ok(())
    }
}

/// Writes `content` to `path`, or to stdout when no path is given.
fn write_output(path: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("failed to write '{}'", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                writeln!(stdout)?;
            }
            Ok(())
        }
    }
}

/// Creates a file for writing, with the path in the error.
fn create(path: &Path) -> anyhow::Result<File> {
    File::create(path).with_context(|| format!("failed to create '{}'", path.display()))
}
