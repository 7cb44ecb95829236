//! @acp:module "Run"
//! @acp:summary "Execute a plan and turn its outcome into a process exit code"
//! @acp:domain cli
//! @acp:layer api

use std::ffi::OsString;

use tokio_util::sync::CancellationToken;

use crate::context::Context;
use crate::error::{ExitError, SubprocessError};
use crate::metadata::Metadata;
use crate::plan::Plan;

/// Settings for a single [`run`]
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    metadata: Option<Vec<u8>>,
    args: Option<Vec<OsString>>,
}

impl RunOptions {
    /// Metadata payload used to augment `--help` output
    pub fn metadata(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.metadata = Some(bytes.into());
        self
    }

    /// Command line to parse, program name first (defaults to the process argv)
    pub fn args<I, T>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }
}

/// Exit code for the outcome of a plan.
///
/// The first [`ExitError`] or [`SubprocessError`] found in the error chain
/// decides the code; any other error maps to `1`.
pub fn exit_code(result: &anyhow::Result<()>) -> i32 {
    let Err(err) = result else {
        return 0;
    };
    for cause in err.chain() {
        if let Some(exit) = cause.downcast_ref::<ExitError>() {
            return exit.code();
        }
        if let Some(subprocess) = cause.downcast_ref::<SubprocessError>() {
            return subprocess.exit_code();
        }
    }
    1
}

/// Execute `plan` and return the exit code.
///
/// The execution context is a child of `parent` and is cancelled before this
/// function returns, whatever the outcome.
///
/// # Panics
///
/// If the plan tree is malformed (a receiver nobody provides) or the
/// metadata payload cannot be decoded. Both are packaging defects.
pub fn run(parent: &CancellationToken, plan: &dyn Plan, options: RunOptions) -> i32 {
    if let Err(err) = plan.validate() {
        panic!("cannot run `{}`: {}", plan.name(), err);
    }

    let metadata = options.metadata.as_deref().map(|bytes| match Metadata::decode(bytes) {
        Ok(metadata) => metadata,
        Err(err) => panic!("{}", err),
    });

    let token = parent.child_token();
    let _cancel_on_exit = token.clone().drop_guard();
    let ctx = Context::new(token);

    let argv = options
        .args
        .unwrap_or_else(|| std::env::args_os().collect());

    // Errors were already printed by the plan; only the code is left to derive.
    let result = plan.execute(&ctx, argv, metadata.as_ref());
    let code = exit_code(&result);
    tracing::debug!(code, "command finished");
    code
}

/// Execute `plan` against the process arguments and exit with its code
pub fn run_and_exit(plan: &dyn Plan, options: RunOptions) -> ! {
    let code = run(&CancellationToken::new(), plan, options);
    std::process::exit(code)
}
