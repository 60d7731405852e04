//! # gocker
//!
//! Watches the containers of a docker host and reports their lifecycle to a
//! remote endpoint. Keeps itself up to date with the latest published
//! release.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

mod commands;
mod logging;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.log.as_deref())?;
    commands::execute(&cli)
}
