#![forbid(unsafe_code)]

//! @acp:module "climate Library"
//! @acp:summary "Build command-line interfaces from plain functions and structs"
//! @acp:domain cli
//! @acp:layer api
//! @acp:stability stable
//!
//! # climate
//!
//! Turn functions and clap-derived structs into a dispatchable command tree.
//!
//! ## Features
//!
//! - **Plain functions**: `fn([Context], [Options], [Args]) -> [Result]`
//! - **Struct commands**: struct flags shared with nested subcommands
//! - **Exit codes**: explicit codes and subprocess codes pass through
//! - **Metadata**: help text, aliases and flag docs from a build-time payload
//!
//! ## Example
//!
//! ```rust,no_run
//! use climate::{structure, Args, Context, Receiver, RunOptions};
//!
//! #[derive(clap::Args, Default)]
//! struct Remote {
//!     /// Print more detail
//!     #[arg(long, short)]
//!     verbose: bool,
//! }
//!
//! #[derive(clap::Args, Default)]
//! struct AddOptions {
//!     /// Fetch right after adding
//!     #[arg(long)]
//!     fetch: bool,
//! }
//!
//! fn add(remote: Receiver<Remote>, ctx: Context, opts: AddOptions, args: Args) -> anyhow::Result<()> {
//!     if ctx.is_cancelled() {
//!         return Err(climate::exit(130));
//!     }
//!     if remote.verbose {
//!         println!("adding {:?} (fetch: {})", *args, opts.fetch);
//!     }
//!     Ok(())
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     let plan = structure::<Remote>().method("add", add)?;
//!     climate::run_and_exit(&plan, RunOptions::default())
//! }
//! ```

pub mod context;
pub mod error;
pub mod metadata;
pub mod param;
pub mod plan;
pub mod reflection;
pub mod run;

pub mod commands;

// Re-exports
pub use context::Context;
pub use error::{exit, Error, ExitError, Result, SubprocessError};
pub use metadata::Metadata;
pub use param::{Args, IntoCallable, Options, Outcome, Param, Receiver};
pub use plan::{func, structure, FuncPlan, Plan, StructPlan};
pub use reflection::{Descriptor, Role, Shape, TypeKey};
pub use run::{exit_code, run, run_and_exit, RunOptions};
pub use tokio_util::sync::CancellationToken;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
