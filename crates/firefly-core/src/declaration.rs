//! Declaration tree produced by translating a unit

use serde::{Deserialize, Serialize};

use crate::ir::{Instruction, MethodShape, TypeRef};
use crate::unit::UnitKind;

/// Anything that can be stored in a resolution table bucket
pub trait Named {
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modifier {
    Public,
    Private,
    Static,
    Final,
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeRef,
    /// Value used when the caller omits the argument
    pub default: Option<Instruction>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDeclaration {
    pub name: String,
    pub modifiers: Vec<Modifier>,
    pub parameters: Vec<Parameter>,
    pub return_type: TypeRef,
    pub body: Vec<Instruction>,
}

impl MethodDeclaration {
    pub fn new(name: impl Into<String>, parameters: Vec<Parameter>, return_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            modifiers: vec![Modifier::Public],
            parameters,
            return_type,
            body: Vec::new(),
        }
    }

    pub fn with_modifiers(mut self, modifiers: Vec<Modifier>) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_body(mut self, body: Vec<Instruction>) -> Self {
        self.body = body;
        self
    }

    pub fn shape(&self) -> MethodShape {
        MethodShape::new(
            self.return_type.clone(),
            self.parameters.iter().map(|p| p.ty.clone()).collect(),
        )
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.contains(&Modifier::Static)
    }
}

impl Named for MethodDeclaration {
    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constructor {
    pub modifiers: Vec<Modifier>,
    pub parameters: Vec<Parameter>,
    pub body: Vec<Instruction>,
}

/// The top-level type a unit declares
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDeclaration {
    pub qualified_name: String,
    pub kind: UnitKind,
    pub modifiers: Vec<Modifier>,
    pub constructors: Vec<Constructor>,
    pub methods: Vec<MethodDeclaration>,
}

impl TypeDeclaration {
    pub fn new(qualified_name: impl Into<String>, kind: UnitKind) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            kind,
            modifiers: vec![Modifier::Public, Modifier::Final],
            constructors: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Last segment of the qualified name
    pub fn simple_name(&self) -> &str {
        self.qualified_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.qualified_name)
    }

    /// First method with the given name, in declaration order
    pub fn method(&self, name: &str) -> Option<&MethodDeclaration> {
        self.methods.iter().find(|m| m.name == name)
    }
}

impl Named for TypeDeclaration {
    fn name(&self) -> &str {
        &self.qualified_name
    }
}
