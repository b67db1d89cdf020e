//! Type descriptions produced by the front end.

use std::fmt;

use crate::ast::{Expression, Statement};

/// Reference to a type from a field, argument, let binding or return.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum TypeRef {
    Simple {
        name: String,
        #[cfg_attr(feature = "serde", serde(default))]
        optional: bool,
    },
    Map {
        key: String,
        value: String,
        #[cfg_attr(feature = "serde", serde(default))]
        key_as: Option<String>,
        #[cfg_attr(feature = "serde", serde(default))]
        value_as: Option<String>,
    },
    Bounced {
        name: String,
    },
    Void,
}

impl TypeRef {
    pub fn simple(name: impl Into<String>) -> Self {
        Self::Simple {
            name: name.into(),
            optional: false,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self::Simple {
            name: name.into(),
            optional: true,
        }
    }

    pub fn map(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Map {
            key: key.into(),
            value: value.into(),
            key_as: None,
            value_as: None,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Simple { optional: true, .. })
    }

    /// Name of the referenced type, if this reference names one.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Self::Simple { name, .. } | Self::Bounced { name } => Some(name),
            Self::Map { .. } | Self::Void => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple { name, optional } => {
                write!(f, "{name}{}", if *optional { "?" } else { "" })
            }
            Self::Map {
                key,
                value,
                key_as,
                value_as,
            } => {
                write!(f, "map<{key}")?;
                if let Some(alias) = key_as {
                    write!(f, " as {alias}")?;
                }
                write!(f, ", {value}")?;
                if let Some(alias) = value_as {
                    write!(f, " as {alias}")?;
                }
                write!(f, ">")
            }
            Self::Bounced { name } => write!(f, "bounced<{name}>"),
            Self::Void => write!(f, "<void>"),
        }
    }
}

/// Kind of a declared type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TypeKind {
    Primitive,
    Struct,
    Contract,
    Trait,
}

/// A struct or contract field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDescription {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub ty: TypeRef,
    /// Declaration index within the owning type.
    pub index: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub default: Option<Expression>,
    /// Serialization alias from an `as` clause (`uint64`, `coins`, `remaining`...).
    #[cfg_attr(feature = "serde", serde(default))]
    pub as_format: Option<String>,
}

/// A named, typed argument.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FunctionArg {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub ty: TypeRef,
}

impl FunctionArg {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Body of a function.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum FunctionBody {
    Statements { statements: Vec<Statement> },
    /// Binding to a function that already exists in the target stdlib.
    Native { func_name: String },
}

/// A free function, member function, extension or getter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FunctionDescription {
    pub name: String,
    /// Owning type for member functions and extensions.
    #[cfg_attr(feature = "serde", serde(default))]
    pub owner: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub args: Vec<FunctionArg>,
    pub returns: TypeRef,
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_getter: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_inline: bool,
    pub body: FunctionBody,
}

impl FunctionDescription {
    /// A function with a statement body, no owner and no flags.
    pub fn new(
        name: impl Into<String>,
        args: Vec<FunctionArg>,
        returns: TypeRef,
        statements: Vec<Statement>,
    ) -> Self {
        Self {
            name: name.into(),
            owner: None,
            args,
            returns,
            is_getter: false,
            is_inline: false,
            body: FunctionBody::Statements { statements },
        }
    }

    /// A binding to an existing target function.
    pub fn native(
        name: impl Into<String>,
        func_name: impl Into<String>,
        args: Vec<FunctionArg>,
        returns: TypeRef,
    ) -> Self {
        Self {
            name: name.into(),
            owner: None,
            args,
            returns,
            is_getter: false,
            is_inline: false,
            body: FunctionBody::Native {
                func_name: func_name.into(),
            },
        }
    }

    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    #[must_use]
    pub fn getter(mut self) -> Self {
        self.is_getter = true;
        self
    }

    #[must_use]
    pub fn inline(mut self) -> Self {
        self.is_inline = true;
        self
    }
}

/// Contract initializer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InitDescription {
    #[cfg_attr(feature = "serde", serde(default))]
    pub args: Vec<FunctionArg>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub statements: Vec<Statement>,
}

/// What kind of incoming message a receiver handles.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "kebab-case"))]
pub enum ReceiverSelector {
    /// Typed message; `arg` names the decoded message inside the handler.
    InternalBinary { type_name: String, arg: String },
    InternalEmpty,
    InternalComment { comment: String },
    /// Bounced message; `arg` is the raw body slice.
    InternalBounce { arg: String },
    /// Anything else; `arg` is the raw body slice.
    InternalFallback { arg: String },
}

/// A receiver declared on a contract.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReceiverDescription {
    pub selector: ReceiverSelector,
    #[cfg_attr(feature = "serde", serde(default))]
    pub statements: Vec<Statement>,
}

impl ReceiverDescription {
    pub fn new(selector: ReceiverSelector, statements: Vec<Statement>) -> Self {
        Self {
            selector,
            statements,
        }
    }
}

/// A fully resolved type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeDescription {
    pub kind: TypeKind,
    pub name: String,
    /// Stable identifier, used to look up contract code in the code dictionary.
    pub uid: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub fields: Vec<FieldDescription>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub receivers: Vec<ReceiverDescription>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub functions: Vec<FunctionDescription>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub init: Option<InitDescription>,
    /// Contracts this contract can deploy.
    #[cfg_attr(feature = "serde", serde(default))]
    pub depends_on: Vec<String>,
    /// Declared interface names, reported by `supported_interfaces`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub interfaces: Vec<String>,
    /// Explicit message prefix from a `message(0x...)` declaration.
    #[cfg_attr(feature = "serde", serde(default))]
    pub prefix: Option<u32>,
}

impl TypeDescription {
    pub fn new(kind: TypeKind, name: impl Into<String>, uid: u32) -> Self {
        Self {
            kind,
            name: name.into(),
            uid,
            fields: Vec::new(),
            receivers: Vec::new(),
            functions: Vec::new(),
            init: None,
            depends_on: Vec::new(),
            interfaces: Vec::new(),
            prefix: None,
        }
    }

    pub fn primitive(name: impl Into<String>) -> Self {
        Self::new(TypeKind::Primitive, name, 0)
    }

    pub fn structure(name: impl Into<String>, uid: u32) -> Self {
        Self::new(TypeKind::Struct, name, uid)
    }

    pub fn contract(name: impl Into<String>, uid: u32) -> Self {
        Self::new(TypeKind::Contract, name, uid)
    }

    /// Append a field; its index is its position.
    #[must_use]
    pub fn with_field(self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.with_field_as(name, ty, None)
    }

    /// Append a field with an `as` serialization alias.
    #[must_use]
    pub fn with_field_as(
        mut self,
        name: impl Into<String>,
        ty: TypeRef,
        as_format: Option<&str>,
    ) -> Self {
        let index = self.fields.len();
        self.fields.push(FieldDescription {
            name: name.into(),
            ty,
            index,
            default: None,
            as_format: as_format.map(ToString::to_string),
        });
        self
    }

    /// Attach a default value to the most recently added field.
    #[must_use]
    pub fn with_default(mut self, default: Expression) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.default = Some(default);
        }
        self
    }

    #[must_use]
    pub fn with_receiver(mut self, receiver: ReceiverDescription) -> Self {
        self.receivers.push(receiver);
        self
    }

    /// Append a member function; its owner is set to this type.
    #[must_use]
    pub fn with_function(mut self, function: FunctionDescription) -> Self {
        let function = function.with_owner(self.name.clone());
        self.functions.push(function);
        self
    }

    #[must_use]
    pub fn with_init(mut self, init: InitDescription) -> Self {
        self.init = Some(init);
        self
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: u32) -> Self {
        self.prefix = Some(prefix);
        self
    }

    pub fn is_contract(&self) -> bool {
        self.kind == TypeKind::Contract
    }

    /// Whether values of this type are aggregates of fields.
    pub fn is_aggregate(&self) -> bool {
        matches!(self.kind, TypeKind::Struct | TypeKind::Contract)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescription> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionDescription> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// The initializer, or an empty one when the contract declares none.
    pub fn init_or_default(&self) -> InitDescription {
        self.init.clone().unwrap_or_default()
    }
}
