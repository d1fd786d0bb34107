//! Lookup predicates for the resolution tables

use crate::declaration::{MethodDeclaration, TypeDeclaration};
use crate::ir::TypeRef;

/// Describes what a lookup is looking for
///
/// `name` selects the bucket inside an owner; `matches` picks the first
/// declaration of that bucket, in registration order, that satisfies it.
pub trait Signature<T>: Send + Sync {
    fn name(&self) -> &str;

    fn matches(&self, candidate: &T) -> bool;
}

/// Matches a type by its qualified name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSignature {
    qualified_name: String,
}

impl TypeSignature {
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
        }
    }
}

impl Signature<TypeDeclaration> for TypeSignature {
    fn name(&self) -> &str {
        &self.qualified_name
    }

    fn matches(&self, candidate: &TypeDeclaration) -> bool {
        candidate.qualified_name == self.qualified_name
    }
}

/// Matches a method by name and arity, optionally by parameter types
///
/// A `Dynamic` type on either side matches any type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    name: String,
    arity: usize,
    parameter_types: Option<Vec<TypeRef>>,
    /// Also accept methods with more parameters when the extra ones have defaults
    with_defaults: bool,
}

impl MethodSignature {
    pub fn new(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
            parameter_types: None,
            with_defaults: false,
        }
    }

    /// Match any method that can be called with `arity` arguments
    pub fn accepting(name: impl Into<String>, arity: usize) -> Self {
        Self {
            with_defaults: true,
            ..Self::new(name, arity)
        }
    }

    pub fn with_types(name: impl Into<String>, parameter_types: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            arity: parameter_types.len(),
            parameter_types: Some(parameter_types),
            with_defaults: false,
        }
    }
}

fn compatible(expected: &TypeRef, actual: &TypeRef) -> bool {
    matches!(expected, TypeRef::Dynamic) || matches!(actual, TypeRef::Dynamic) || expected == actual
}

impl Signature<MethodDeclaration> for MethodSignature {
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, candidate: &MethodDeclaration) -> bool {
        if candidate.name != self.name {
            return false;
        }
        let arity_matches = match candidate.parameters.get(self.arity..) {
            Some([]) => true,
            Some(extra) => self.with_defaults && extra.iter().all(|p| p.default.is_some()),
            None => false,
        };
        if !arity_matches {
            return false;
        }
        match &self.parameter_types {
            Some(types) => types
                .iter()
                .zip(&candidate.parameters)
                .all(|(expected, param)| compatible(expected, &param.ty)),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::Parameter;
    use crate::ir::{Instruction, Literal};

    #[test]
    fn test_method_signature_matching() {
        let method = MethodDeclaration::new(
            "greet",
            vec![Parameter::new("text", TypeRef::String)],
            TypeRef::Void,
        );

        assert!(MethodSignature::new("greet", 1).matches(&method));
        assert!(!MethodSignature::new("greet", 0).matches(&method));
        assert!(!MethodSignature::new("hello", 1).matches(&method));
        assert!(MethodSignature::with_types("greet", vec![TypeRef::String]).matches(&method));
        assert!(MethodSignature::with_types("greet", vec![TypeRef::Dynamic]).matches(&method));
        assert!(!MethodSignature::with_types("greet", vec![TypeRef::Int]).matches(&method));
    }

    #[test]
    fn test_accepting_fills_defaults() {
        let mut times = Parameter::new("times", TypeRef::Int);
        times.default = Some(Instruction::Literal(Literal::Int(1)));
        let method = MethodDeclaration::new(
            "greet",
            vec![Parameter::new("text", TypeRef::String), times],
            TypeRef::Void,
        );

        assert!(MethodSignature::accepting("greet", 1).matches(&method));
        assert!(MethodSignature::accepting("greet", 2).matches(&method));
        assert!(!MethodSignature::accepting("greet", 0).matches(&method));
        assert!(!MethodSignature::accepting("greet", 3).matches(&method));
        assert!(!MethodSignature::new("greet", 1).matches(&method));
    }
}
