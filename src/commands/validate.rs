//! @acp:module "Validate Command"
//! @acp:summary "Check that a metadata payload decodes"
//! @acp:domain cli
//! @acp:layer handler

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use console::style;

use super::{count_commands, Cli};
use crate::metadata::Metadata;
use crate::param::Receiver;

/// Options for the validate command
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ValidateOptions {
    /// Metadata payload to check
    pub file: PathBuf,
}

/// Execute the validate command
pub fn execute_validate(cli: Receiver<Cli>, options: ValidateOptions) -> Result<()> {
    cli.apply();

    let bytes = std::fs::read(&options.file)
        .with_context(|| format!("Failed to read {}", options.file.display()))?;
    let metadata = Metadata::decode(&bytes)
        .with_context(|| format!("{} is not valid metadata", options.file.display()))?;

    println!(
        "{} {} is valid ({} commands documented)",
        style("✓").green(),
        options.file.display(),
        count_commands(&metadata)
    );
    Ok(())
}
