//! # glancepub
//!
//! Publishes Glance disk-image repositories into a web-servable tree.

mod commands;
mod output;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env());
    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    commands::execute(cli)
}
