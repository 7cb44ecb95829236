//! @acp:module "Struct Plan"
//! @acp:summary "A clap-derived struct as an inner node of the command tree"
//! @acp:domain cli
//! @acp:layer service
//!
//! The struct's own fields become flags shared by every command below it.
//! Children are either nested struct plans or leaf operations registered
//! with [`StructPlan::method`], kept in registration order.

use clap::{ArgMatches, Command};

use crate::error::{Error, Result};
use crate::metadata::Metadata;
use crate::param::{IntoCallable, Invocation, Options, Scope};
use crate::reflection::{Descriptor, TypeKey};

use super::{invocation, kebab_case, FuncPlan, Plan};

type Augment = fn(Command) -> Command;
type Bind = fn(&ArgMatches, &Scope) -> anyhow::Result<Scope>;

/// Plan wrapping a struct type and its subcommands
pub struct StructPlan {
    name: String,
    descriptor: Descriptor,
    augment: Augment,
    bind: Bind,
    children: Vec<Box<dyn Plan>>,
}

impl std::fmt::Debug for StructPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructPlan")
            .field("name", &self.name)
            .field("descriptor", &self.descriptor)
            .field("children", &self.children().collect::<Vec<_>>())
            .finish()
    }
}

/// Materialize `T` from the matches and push it on the receiver scope
fn bind<T: Options>(matches: &ArgMatches, scope: &Scope) -> anyhow::Result<Scope> {
    let mut instance = T::default();
    instance.update_from_arg_matches(matches)?;
    tracing::debug!(node = TypeKey::of::<T>().short_name(), "bound struct flags");
    Ok(scope.with(instance))
}

/// Add `T`'s flags, made global so they are accepted after a subcommand name.
/// Required flags stay local; clap does not allow them to be global.
fn augment<T: Options>(cmd: Command) -> Command {
    let cmd = T::augment_args(cmd);
    let flags: Vec<String> = cmd
        .get_arguments()
        .filter(|arg| !arg.is_positional() && !arg.is_required_set())
        .map(|arg| arg.get_id().as_str().to_string())
        .collect();
    flags
        .iter()
        .fold(cmd, |cmd, id| cmd.mut_arg(id.as_str(), |arg| arg.global(true)))
}

/// Build a plan for the struct `T`, named after the type in kebab-case
pub fn structure<T: Options>() -> StructPlan {
    StructPlan::new::<T>()
}

impl StructPlan {
    pub fn new<T: Options>() -> Self {
        Self {
            name: kebab_case(TypeKey::of::<T>().short_name()),
            descriptor: Descriptor::structure::<T>(),
            augment: augment::<T>,
            bind: bind::<T>,
            children: Vec::new(),
        }
    }

    /// Override the command name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Register a leaf operation under this node.
    ///
    /// `f` has the same shape as for [`func`](super::func) and may also take
    /// a leading `Receiver<T>` for this node's (or any ancestor's) struct.
    pub fn method<M, F: IntoCallable<M>>(self, name: &str, f: F) -> Result<Self> {
        let leaf = FuncPlan::new(name, f)?;
        self.push(Box::new(leaf))
    }

    /// Register a nested struct command
    pub fn subcommand(self, child: StructPlan) -> Result<Self> {
        self.push(Box::new(child))
    }

    fn push(mut self, child: Box<dyn Plan>) -> Result<Self> {
        if self.children.iter().any(|c| c.name() == child.name()) {
            return Err(Error::DuplicateCommand(format!(
                "`{}` already has a child named `{}`",
                self.name,
                child.name()
            )));
        }
        self.descriptor.adopt(child.descriptor());
        self.children.push(child);
        Ok(self)
    }

    /// Child names in registration order
    pub fn children(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(|c| c.name())
    }
}

impl Plan for StructPlan {
    fn name(&self) -> &str {
        &self.name
    }

    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn command(&self, metadata: Option<&Metadata>) -> Command {
        let mut cmd = (self.augment)(Command::new(self.name.clone()));
        for child in &self.children {
            let child_md = metadata.and_then(|md| md.child(child.name()));
            cmd = cmd.subcommand(child.command(child_md));
        }
        match metadata {
            Some(md) => md.apply(cmd),
            None => cmd,
        }
    }

    fn dispatch(&self, inv: &Invocation<'_>, metadata: Option<&Metadata>) -> anyhow::Result<()> {
        let scope = (self.bind)(inv.matches, inv.scope)?;

        let Some((name, matches)) = inv.matches.subcommand() else {
            // Bare invocation of an inner node: show what is available
            let mut cmd = self.command(metadata).bin_name(inv.ctx.path().join(" "));
            cmd.print_help()?;
            return Ok(());
        };

        let child = self
            .children
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| anyhow::anyhow!("`{}` has no command `{}`", self.name, name))?;

        let ctx = inv.ctx.scoped(name);
        tracing::debug!(path = ?ctx.path(), "dispatching subcommand");
        child.dispatch(
            &invocation(&ctx, matches, &scope),
            metadata.and_then(|md| md.child(name)),
        )
    }
}
