//! Boardroom CLI: turn a meeting transcript into notes, a PRD, an ROI review
//! and a Jira plan.
//!
//! Supporting documents in the context folder are condensed into a context
//! pack first, then a fixed sequence of agent stages runs over the transcript.

mod commands;

use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
