//! @acp:module "Show Command"
//! @acp:summary "Print the metadata subtree of one command"
//! @acp:domain cli
//! @acp:layer handler

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use super::Cli;
use crate::error::ExitError;
use crate::metadata::Metadata;
use crate::param::Receiver;

/// Options for the show command
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ShowOptions {
    /// Metadata payload to read
    pub file: PathBuf,

    /// Command path below the root, e.g. `remote add`
    pub path: Vec<String>,

    /// Print on a single line
    #[arg(long)]
    pub compact: bool,
}

/// Execute the show command
pub fn execute_show(cli: Receiver<Cli>, options: ShowOptions) -> Result<()> {
    cli.apply();

    let bytes = std::fs::read(&options.file)
        .with_context(|| format!("Failed to read {}", options.file.display()))?;
    let metadata = Metadata::decode(&bytes)
        .with_context(|| format!("{} is not valid metadata", options.file.display()))?;

    let Some(node) = metadata.lookup(options.path.as_slice()) else {
        // Distinguish "no such command" from a broken payload
        return Err(ExitError::with_message(
            2,
            format!("no metadata for command path `{}`", options.path.join(" ")),
        )
        .into());
    };

    let rendered = if options.compact {
        serde_json::to_string(node)?
    } else {
        serde_json::to_string_pretty(node)?
    };
    println!("{}", rendered);
    Ok(())
}
