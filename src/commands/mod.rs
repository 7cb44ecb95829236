//! @acp:module "Commands"
//! @acp:summary "Commands of the climate tool, built with the library itself"
//! @acp:domain cli
//! @acp:layer handler
//!
//! The tool checks and inspects metadata payloads before they get embedded
//! into a binary. Each command is in its own submodule.

pub mod show;
pub mod validate;

pub use show::{execute_show, ShowOptions};
pub use validate::{execute_validate, ValidateOptions};

use crate::plan::{structure, StructPlan};

/// Metadata describing the tool's own commands
pub const METADATA: &[u8] = include_bytes!("metadata.json");

/// Flags shared by every command
#[derive(clap::Args, Debug, Default)]
pub struct Cli {
    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// Apply terminal settings before a command prints anything
    pub fn apply(&self) {
        if self.no_color {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }
    }
}

/// `metadata` command group
#[derive(clap::Args, Debug, Default)]
pub struct MetadataCommand {}

/// The full command tree of the tool
pub fn plan() -> crate::Result<StructPlan> {
    let metadata = structure::<MetadataCommand>()
        .named("metadata")
        .method("validate", execute_validate)?
        .method("show", execute_show)?;

    structure::<Cli>().named("climate").subcommand(metadata)
}

/// Number of commands in a metadata tree, root included
pub(crate) fn count_commands(md: &crate::Metadata) -> usize {
    1 + md.children.values().map(count_commands).sum::<usize>()
}
