//! @acp:module "Reflection Descriptor"
//! @acp:summary "Signature shape of callables and flag layout of structs"
//! @acp:domain cli
//! @acp:layer model
//!
//! A descriptor is built once when a plan is constructed and never changes
//! afterwards. Callables are described by the ordered roles of their
//! parameters; structs by the flags their clap definition declares.

use std::any::{type_name, TypeId};
use std::fmt;

use clap::{Args as ClapArgs, Command};

use crate::error::{Error, Result};

/// Lookup-only handle on a Rust type
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last path segment of the type name, without generics
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Recognized parameter roles, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Bound instance of an enclosing struct command
    Receiver(TypeKey),
    /// Execution context
    Context,
    /// Options struct whose fields become flags
    Options(TypeKey),
    /// Residual positional arguments
    Args,
}

impl Role {
    fn rank(&self) -> u8 {
        match self {
            Role::Receiver(_) => 0,
            Role::Context => 1,
            Role::Options(_) => 2,
            Role::Args => 3,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Role::Receiver(_) => "receiver",
            Role::Context => "context",
            Role::Options(_) => "options",
            Role::Args => "args",
        }
    }
}

/// Classified signature of a callable
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shape {
    pub receivers: Vec<TypeKey>,
    pub context: bool,
    pub options: Option<TypeKey>,
    pub args: bool,
    pub fallible: bool,
}

impl Shape {
    /// Classify `[receiver*] [context?] [options?] [args?] -> [error?]`.
    ///
    /// Fails if a role repeats or appears out of canonical order. Receivers
    /// may repeat as long as each names a different struct.
    pub fn classify(roles: &[Role], fallible: bool) -> Result<Self> {
        let mut shape = Shape {
            fallible,
            ..Default::default()
        };

        let mut last: Option<Role> = None;
        for role in roles {
            if let Some(prev) = last {
                let receivers = matches!((prev, role), (Role::Receiver(_), Role::Receiver(_)));
                if role.rank() < prev.rank() || (role.rank() == prev.rank() && !receivers) {
                    return Err(Error::InvalidShapeKind(format!(
                        "parameter `{}` may not follow `{}`; expected [receiver] [context] [options] [args]",
                        role.label(),
                        prev.label()
                    )));
                }
            }
            match role {
                Role::Receiver(key) => {
                    if shape.receivers.contains(key) {
                        return Err(Error::InvalidShapeKind(format!(
                            "receiver `{}` is requested twice",
                            key.name()
                        )));
                    }
                    shape.receivers.push(*key);
                }
                Role::Context => shape.context = true,
                Role::Options(key) => shape.options = Some(*key),
                Role::Args => shape.args = true,
            }
            last = Some(*role);
        }

        Ok(shape)
    }

    /// The roles in invocation order
    pub fn roles(&self) -> Vec<Role> {
        let mut roles: Vec<Role> = self.receivers.iter().copied().map(Role::Receiver).collect();
        if self.context {
            roles.push(Role::Context);
        }
        if let Some(key) = self.options {
            roles.push(Role::Options(key));
        }
        if self.args {
            roles.push(Role::Args);
        }
        roles
    }
}

/// One flag (or positional) declared by a struct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub id: String,
    pub long: Option<String>,
    pub short: Option<char>,
    pub help: Option<String>,
    pub required: bool,
    pub positional: bool,
}

impl FieldDescriptor {
    fn from_arg(arg: &clap::Arg) -> Self {
        Self {
            id: arg.get_id().as_str().to_string(),
            long: arg.get_long().map(str::to_string),
            short: arg.get_short(),
            help: arg.get_help().map(|h| h.to_string()),
            required: arg.is_required_set(),
            positional: arg.is_positional(),
        }
    }
}

/// Read the field layout of a clap-derived struct
pub fn fields_of<T: ClapArgs>() -> Vec<FieldDescriptor> {
    T::augment_args(Command::new("fields"))
        .get_arguments()
        .map(FieldDescriptor::from_arg)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    Callable(Shape),
    Struct {
        ty: TypeKey,
        fields: Vec<FieldDescriptor>,
    },
}

/// Introspected description of a plan's underlying callable or struct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    kind: Kind,
    /// Receiver types requested below this node that no enclosing struct
    /// has provided yet
    unresolved: Vec<TypeKey>,
}

impl Descriptor {
    pub fn callable(shape: Shape) -> Self {
        let unresolved = shape.receivers.clone();
        Self {
            kind: Kind::Callable(shape),
            unresolved,
        }
    }

    pub fn structure<T: ClapArgs + 'static>() -> Self {
        Self {
            kind: Kind::Struct {
                ty: TypeKey::of::<T>(),
                fields: fields_of::<T>(),
            },
            unresolved: Vec::new(),
        }
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn shape(&self) -> Option<&Shape> {
        match &self.kind {
            Kind::Callable(shape) => Some(shape),
            Kind::Struct { .. } => None,
        }
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        match &self.kind {
            Kind::Struct { fields, .. } => fields,
            Kind::Callable(_) => &[],
        }
    }

    pub fn unresolved(&self) -> &[TypeKey] {
        &self.unresolved
    }

    /// Fold a child's unresolved receivers into this struct node; the ones
    /// naming this node's own type are satisfied here
    pub(crate) fn adopt(&mut self, child: &Descriptor) {
        let own = match &self.kind {
            Kind::Struct { ty, .. } => Some(*ty),
            Kind::Callable(_) => None,
        };
        for key in &child.unresolved {
            if Some(*key) != own && !self.unresolved.contains(key) {
                self.unresolved.push(*key);
            }
        }
    }

    /// Error unless every receiver in the tree has a provider
    pub fn validate(&self) -> Result<()> {
        match self.unresolved.first() {
            None => Ok(()),
            Some(key) => Err(Error::InvalidShapeKind(format!(
                "receiver `{}` is not provided by any enclosing struct command",
                key.name()
            ))),
        }
    }
}
