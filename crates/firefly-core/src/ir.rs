//! Instruction representation for method bodies
//!
//! Instruction kinds form a closed enum: every traversal over a body is an
//! exhaustive `match`, so adding a kind forces every pass to handle it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Qualified name of the stream type the print intrinsics invoke
pub const PRINT_STREAM_TYPE: &str = "firefly.io.PrintStream";

/// A reference to a type, either built-in or declared by a unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    Void,
    String,
    Int,
    Long,
    Bool,
    Decimal,
    Char,
    Byte,
    /// Placeholder for values whose type is unknown or unresolved
    Dynamic,
    Array(Box<TypeRef>),
    /// A declared type, by qualified name
    Named(String),
}

impl TypeRef {
    pub fn array_of(element: TypeRef) -> Self {
        TypeRef::Array(Box::new(element))
    }

    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Void => write!(f, "Void"),
            TypeRef::String => write!(f, "String"),
            TypeRef::Int => write!(f, "Int"),
            TypeRef::Long => write!(f, "Long"),
            TypeRef::Bool => write!(f, "Boolean"),
            TypeRef::Decimal => write!(f, "Decimal"),
            TypeRef::Char => write!(f, "Char"),
            TypeRef::Byte => write!(f, "Byte"),
            TypeRef::Dynamic => write!(f, "dynamic"),
            TypeRef::Array(element) => write!(f, "{}[]", element),
            TypeRef::Named(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    String(String),
    Bool(bool),
    Int(i64),
    Decimal(f64),
    Char(char),
}

impl Literal {
    pub fn type_ref(&self) -> TypeRef {
        match self {
            Literal::String(_) => TypeRef::String,
            Literal::Bool(_) => TypeRef::Bool,
            Literal::Int(_) => TypeRef::Int,
            Literal::Decimal(_) => TypeRef::Decimal,
            Literal::Char(_) => TypeRef::Char,
        }
    }
}

/// Parameter and return types of a method
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodShape {
    pub return_type: TypeRef,
    pub parameter_types: Vec<TypeRef>,
}

impl MethodShape {
    pub fn new(return_type: TypeRef, parameter_types: Vec<TypeRef>) -> Self {
        Self {
            return_type,
            parameter_types,
        }
    }
}

impl fmt::Display for MethodShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, ty) in self.parameter_types.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", ty)?;
        }
        write!(f, ") -> {}", self.return_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StandardStream {
    Out,
    Err,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvokeKind {
    Virtual,
    Static,
}

/// A method call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    pub kind: InvokeKind,
    /// Receiver of a virtual call; `None` for static calls
    pub receiver: Option<Box<Instruction>>,
    /// Type declaring the invoked method
    pub owner: TypeRef,
    pub name: String,
    pub shape: MethodShape,
    pub arguments: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    Literal(Literal),
    VariableDeclaration {
        name: String,
        ty: TypeRef,
        value: Box<Instruction>,
    },
    VariableAccess {
        name: String,
        ty: TypeRef,
    },
    Invoke(Invocation),
    StandardStream(StandardStream),
}

impl Instruction {
    pub fn string(value: impl Into<String>) -> Self {
        Instruction::Literal(Literal::String(value.into()))
    }

    pub fn access(name: impl Into<String>, ty: TypeRef) -> Self {
        Instruction::VariableAccess {
            name: name.into(),
            ty,
        }
    }

    pub fn declare(name: impl Into<String>, ty: TypeRef, value: Instruction) -> Self {
        Instruction::VariableDeclaration {
            name: name.into(),
            ty,
            value: Box::new(value),
        }
    }

    /// Static type of the value this instruction produces
    pub fn type_ref(&self) -> TypeRef {
        match self {
            Instruction::Literal(literal) => literal.type_ref(),
            Instruction::VariableDeclaration { .. } => TypeRef::Void,
            Instruction::VariableAccess { ty, .. } => ty.clone(),
            Instruction::Invoke(invocation) => invocation.shape.return_type.clone(),
            Instruction::StandardStream(_) => TypeRef::named(PRINT_STREAM_TYPE),
        }
    }

    pub fn as_invocation(&self) -> Option<&Invocation> {
        match self {
            Instruction::Invoke(invocation) => Some(invocation),
            _ => None,
        }
    }
}
