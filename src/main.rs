//! `hed` validates HED tag strings and converts HED schemas between formats.

use clap::Parser;

mod cli;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
