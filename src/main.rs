#![forbid(unsafe_code)]
//! climate command line tool

use tracing_subscriber::EnvFilter;

use climate::commands::{plan, METADATA};
use climate::RunOptions;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let plan = plan()?;
    climate::run_and_exit(&plan, RunOptions::default().metadata(METADATA))
}
