//! @acp:module "Plans"
//! @acp:summary "Executable command units built from functions and structs"
//! @acp:domain cli
//! @acp:layer service
//!
//! A plan knows how to describe itself to clap ([`Plan::command`]) and how
//! to run once clap has resolved the invocation ([`Plan::dispatch`]).
//! [`FuncPlan`] wraps a single function; [`StructPlan`] wraps a clap-derived
//! struct together with its subcommands and leaf operations.

mod func;
mod node;

use std::ffi::OsString;
use std::path::Path;

use clap::{ArgMatches, Command};
use console::style;

use crate::context::Context;
use crate::error::{ExitError, Result};
use crate::metadata::Metadata;
use crate::param::{Invocation, Scope};
use crate::reflection::Descriptor;

pub use func::{func, FuncPlan};
pub use node::{structure, StructPlan};

/// An executable node of a command tree
pub trait Plan: Send + Sync {
    /// Command name as typed on the command line
    fn name(&self) -> &str;

    fn descriptor(&self) -> &Descriptor;

    /// The clap definition of this plan and everything below it
    fn command(&self, metadata: Option<&Metadata>) -> Command;

    /// Run the resolved invocation. Errors propagate unchanged.
    fn dispatch(&self, inv: &Invocation<'_>, metadata: Option<&Metadata>) -> anyhow::Result<()>;

    /// Fail if the tree rooted here cannot be executed
    fn validate(&self) -> Result<()> {
        self.descriptor().validate()
    }

    /// Parse `argv` against this plan and dispatch the selected command.
    ///
    /// Parse failures and command errors are printed to stderr here; the
    /// returned error is only meant for exit-code derivation.
    fn execute(
        &self,
        ctx: &Context,
        argv: Vec<OsString>,
        metadata: Option<&Metadata>,
    ) -> anyhow::Result<()> {
        let name = argv
            .first()
            .and_then(|arg0| Path::new(arg0).file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name().to_string());

        let cmd = self.command(metadata).name(name.clone());
        let matches = match cmd.try_get_matches_from(argv) {
            Ok(matches) => matches,
            Err(err) => {
                // --help and --version land here too, with exit code 0
                let _ = err.print();
                return Err(ExitError::new(err.exit_code()).into());
            }
        };

        let ctx = ctx.scoped(&name);
        let scope = Scope::default();
        let result = self.dispatch(&invocation(&ctx, &matches, &scope), metadata);
        if let Err(err) = &result {
            report(err);
        }
        result
    }
}

pub(crate) fn invocation<'a>(
    ctx: &'a Context,
    matches: &'a ArgMatches,
    scope: &'a Scope,
) -> Invocation<'a> {
    Invocation {
        ctx,
        matches,
        scope,
    }
}

fn report(err: &anyhow::Error) {
    let silent = err
        .downcast_ref::<ExitError>()
        .is_some_and(|exit| exit.message().is_none());
    if !silent {
        eprintln!("{} {:#}", style("Error:").red().bold(), err);
    }
}

/// `RemoteAdd` -> `remote-add`
pub(crate) fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_uppercase() {
            if prev_lower {
                out.push('-');
            }
            out.extend(c.to_lowercase());
            prev_lower = false;
        } else if c == '_' {
            out.push('-');
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }
    out
}
