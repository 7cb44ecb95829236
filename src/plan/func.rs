//! @acp:module "Callable Plan"
//! @acp:summary "A single function exposed as a command"
//! @acp:domain cli
//! @acp:layer service

use clap::Command;

use crate::error::{Error, Result};
use crate::metadata::Metadata;
use crate::param::{Callable, Handler, IntoCallable, Invocation};
use crate::reflection::{Descriptor, Shape};

use super::Plan;

/// Plan wrapping one function of shape
/// `fn([Receiver<T>], [Context], [Options], [Args]) -> [Result<(), E>]`
pub struct FuncPlan {
    name: String,
    descriptor: Descriptor,
    callable: Box<dyn Callable>,
}

impl std::fmt::Debug for FuncPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FuncPlan")
            .field("name", &self.name)
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

impl FuncPlan {
    pub(crate) fn new<M, F: IntoCallable<M>>(name: impl Into<String>, f: F) -> Result<Self> {
        let Handler(callable) = f.into_handler();
        let shape = Shape::classify(&callable.roles(), callable.fallible())?;
        let name = name.into();
        check_unique_ids(&name, callable.augment(Command::new(name.clone())))?;
        Ok(Self {
            name,
            descriptor: Descriptor::callable(shape),
            callable,
        })
    }

    /// Override the command name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Options fields and the residual positional share one clap namespace
fn check_unique_ids(name: &str, cmd: Command) -> Result<()> {
    let mut seen: Vec<&str> = Vec::new();
    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_str();
        if seen.contains(&id) {
            return Err(Error::InvalidShapeKind(format!(
                "`{}` declares the argument `{}` twice; rename the options field",
                name, id
            )));
        }
        seen.push(id);
    }
    Ok(())
}

/// Build a plan from a free function.
///
/// All of the context, options, arguments and error return are optional:
///
/// ```rust,no_run
/// use climate::{func, Args, Context};
///
/// #[derive(clap::Args, Default)]
/// struct Greet {
///     /// Who to greet
///     #[arg(long, default_value = "world")]
///     name: String,
/// }
///
/// fn greet(_ctx: Context, opts: Greet, args: Args) -> anyhow::Result<()> {
///     println!("hello {} {:?}", opts.name, *args);
///     Ok(())
/// }
///
/// let plan = func(greet).expect("supported shape");
/// climate::run_and_exit(&plan, climate::RunOptions::default());
/// ```
///
/// Free functions have no enclosing struct, so a `Receiver` parameter is
/// rejected with [`Error::InvalidShapeKind`].
pub fn func<M, F: IntoCallable<M>>(f: F) -> Result<FuncPlan> {
    let plan = FuncPlan::new("app", f)?;
    if let Some(key) = plan
        .descriptor
        .shape()
        .and_then(|shape| shape.receivers.first())
    {
        return Err(Error::InvalidShapeKind(format!(
            "free function cannot take a receiver (`{}`)",
            key.name()
        )));
    }
    Ok(plan)
}

impl Plan for FuncPlan {
    fn name(&self) -> &str {
        &self.name
    }

    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn command(&self, metadata: Option<&Metadata>) -> Command {
        let cmd = self.callable.augment(Command::new(self.name.clone()));
        match metadata {
            Some(md) => md.apply(cmd),
            None => cmd,
        }
    }

    fn dispatch(&self, inv: &Invocation<'_>, _metadata: Option<&Metadata>) -> anyhow::Result<()> {
        tracing::debug!(path = ?inv.ctx.path(), "invoking command");
        self.callable.call(inv)
    }
}
