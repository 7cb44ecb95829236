//! @acp:module "Parameter Roles"
//! @acp:summary "Closed set of adapters turning plain functions into commands"
//! @acp:domain cli
//! @acp:layer service
//!
//! Every type a command may take as a parameter implements [`Param`], which
//! names its [`Role`] and knows how to extract a value from an invocation.
//! [`IntoCallable`] is implemented once per arity for any function whose
//! parameters are all `Param`s and whose return type is an [`Outcome`].

use std::any::Any;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use clap::{Arg, ArgAction, ArgMatches, Command, FromArgMatches};

use crate::context::Context;
use crate::reflection::{Role, TypeKey};

/// Clap id of the trailing positional that collects residual arguments
pub(crate) const ARGS_ID: &str = "args";

/// A clap-derived struct usable as an options parameter or struct command.
///
/// Implemented automatically for `#[derive(clap::Args, Default)]` structs.
pub trait Options: clap::Args + FromArgMatches + Default + Send + Sync + 'static {}

impl<T> Options for T where T: clap::Args + FromArgMatches + Default + Send + Sync + 'static {}

/// Bound struct instances along the resolved command path, outermost first
#[derive(Clone, Default)]
pub(crate) struct Scope {
    bound: Vec<(TypeKey, Arc<dyn Any + Send + Sync>)>,
}

impl Scope {
    pub(crate) fn with<T: Send + Sync + 'static>(&self, value: T) -> Self {
        let mut bound = self.bound.clone();
        bound.push((TypeKey::of::<T>(), Arc::new(value)));
        Self { bound }
    }

    /// Nearest bound instance of `T`
    pub(crate) fn lookup<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let key = TypeKey::of::<T>();
        self.bound
            .iter()
            .rev()
            .find(|(k, _)| *k == key)
            .and_then(|(_, value)| Arc::clone(value).downcast::<T>().ok())
    }
}

/// Everything a parameter may be extracted from
pub struct Invocation<'a> {
    pub(crate) ctx: &'a Context,
    pub(crate) matches: &'a ArgMatches,
    pub(crate) scope: &'a Scope,
}

/// A type that may appear as a command parameter
pub trait Param: Sized {
    fn role() -> Role;

    /// Add whatever arguments this parameter binds from
    fn augment(cmd: Command) -> Command {
        cmd
    }

    fn extract(inv: &Invocation<'_>) -> anyhow::Result<Self>;
}

impl Param for Context {
    fn role() -> Role {
        Role::Context
    }

    fn extract(inv: &Invocation<'_>) -> anyhow::Result<Self> {
        Ok(inv.ctx.clone())
    }
}

impl<T: Options> Param for T {
    fn role() -> Role {
        Role::Options(TypeKey::of::<T>())
    }

    fn augment(cmd: Command) -> Command {
        T::augment_args(cmd)
    }

    fn extract(inv: &Invocation<'_>) -> anyhow::Result<Self> {
        let mut options = T::default();
        options.update_from_arg_matches(inv.matches)?;
        tracing::trace!(options = TypeKey::of::<T>().short_name(), "bound options");
        Ok(options)
    }
}

/// Residual positional arguments of a command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args(pub Vec<String>);

impl Args {
    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl Deref for Args {
    type Target = Vec<String>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Args {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl Param for Args {
    fn role() -> Role {
        Role::Args
    }

    fn augment(cmd: Command) -> Command {
        cmd.arg(
            Arg::new(ARGS_ID)
                .action(ArgAction::Append)
                .num_args(0..)
                .value_name("ARGS"),
        )
    }

    fn extract(inv: &Invocation<'_>) -> anyhow::Result<Self> {
        let args = inv
            .matches
            .get_many::<String>(ARGS_ID)
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        Ok(Args(args))
    }
}

/// The bound instance of an enclosing struct command.
///
/// Leaf operations registered with [`StructPlan::method`](crate::StructPlan::method)
/// take `Receiver<Self>` to read their node's flags; deeper commands may ask
/// for any ancestor's type.
#[derive(Debug)]
pub struct Receiver<T>(Arc<T>);

impl<T> Clone for Receiver<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Deref for Receiver<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: Send + Sync + 'static> Param for Receiver<T> {
    fn role() -> Role {
        Role::Receiver(TypeKey::of::<T>())
    }

    fn extract(inv: &Invocation<'_>) -> anyhow::Result<Self> {
        inv.scope.lookup::<T>().map(Receiver).ok_or_else(|| {
            anyhow::anyhow!(
                "no enclosing `{}` command is bound",
                TypeKey::of::<T>().short_name()
            )
        })
    }
}

/// Return types a command may have: `()` or `Result<(), E>`
pub trait Outcome {
    fn fallible() -> bool;

    fn into_result(self) -> anyhow::Result<()>;
}

impl Outcome for () {
    fn fallible() -> bool {
        false
    }

    fn into_result(self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<E> Outcome for Result<(), E>
where
    E: Into<anyhow::Error>,
{
    fn fallible() -> bool {
        true
    }

    fn into_result(self) -> anyhow::Result<()> {
        self.map_err(Into::into)
    }
}

/// Type-erased command body
pub(crate) trait Callable: Send + Sync {
    fn roles(&self) -> Vec<Role>;

    fn fallible(&self) -> bool;

    fn augment(&self, cmd: Command) -> Command;

    fn call(&self, inv: &Invocation<'_>) -> anyhow::Result<()>;
}

/// A type-erased command body produced by [`IntoCallable`]
pub struct Handler(pub(crate) Box<dyn Callable>);

/// Conversion of a plain function into a command body.
///
/// `M` is a marker (the parameter tuple) that keeps the per-arity impls apart.
pub trait IntoCallable<M>: Send + Sync + 'static {
    fn into_handler(self) -> Handler;
}

struct FnCallable<F, M> {
    f: F,
    _marker: PhantomData<fn() -> M>,
}

macro_rules! impl_callable {
    ($($p:ident),*) => {
        impl<F, R, $($p,)*> Callable for FnCallable<F, ($($p,)*)>
        where
            F: Fn($($p),*) -> R + Send + Sync,
            R: Outcome,
            $($p: Param,)*
        {
            fn roles(&self) -> Vec<Role> {
                vec![$($p::role()),*]
            }

            fn fallible(&self) -> bool {
                R::fallible()
            }

            #[allow(unused_mut)]
            fn augment(&self, cmd: Command) -> Command {
                let mut cmd = cmd;
                $(cmd = $p::augment(cmd);)*
                cmd
            }

            #[allow(unused_variables, non_snake_case)]
            fn call(&self, inv: &Invocation<'_>) -> anyhow::Result<()> {
                $(let $p = $p::extract(inv)?;)*
                (self.f)($($p),*).into_result()
            }
        }

        impl<F, R, $($p,)*> IntoCallable<($($p,)*)> for F
        where
            F: Fn($($p),*) -> R + Send + Sync + 'static,
            R: Outcome + 'static,
            $($p: Param + 'static,)*
        {
            fn into_handler(self) -> Handler {
                Handler(Box::new(FnCallable {
                    f: self,
                    _marker: PhantomData,
                }))
            }
        }
    };
}

impl_callable!();
impl_callable!(P1);
impl_callable!(P1, P2);
impl_callable!(P1, P2, P3);
impl_callable!(P1, P2, P3, P4);
