//! Built-in functions that are always inlined at their call site

use std::sync::atomic::{AtomicU64, Ordering};

use crate::declaration::{MethodDeclaration, Modifier, Parameter};
use crate::ir::{Instruction, Invocation, InvokeKind, MethodShape, StandardStream, TypeRef, PRINT_STREAM_TYPE};

static INSTANTIATIONS: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intrinsic {
    Print,
    Println,
    Eprint,
    Eprintln,
}

impl Intrinsic {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "print" => Some(Intrinsic::Print),
            "println" => Some(Intrinsic::Println),
            "eprint" => Some(Intrinsic::Eprint),
            "eprintln" => Some(Intrinsic::Eprintln),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Intrinsic::Print => "print",
            Intrinsic::Println => "println",
            Intrinsic::Eprint => "eprint",
            Intrinsic::Eprintln => "eprintln",
        }
    }

    pub fn stream(&self) -> StandardStream {
        match self {
            Intrinsic::Print | Intrinsic::Println => StandardStream::Out,
            Intrinsic::Eprint | Intrinsic::Eprintln => StandardStream::Err,
        }
    }

    /// Name of the stream method the intrinsic calls
    fn stream_method(&self) -> &'static str {
        match self {
            Intrinsic::Print | Intrinsic::Eprint => "print",
            Intrinsic::Println | Intrinsic::Eprintln => "println",
        }
    }

    /// Build a fresh declaration of this intrinsic for the given argument types
    ///
    /// Every call gets its own parameter names, so inlining two instances
    /// into the same body never shares a binding.
    pub fn instantiate(&self, argument_types: &[TypeRef]) -> MethodDeclaration {
        let instance = INSTANTIATIONS.fetch_add(1, Ordering::Relaxed) + 1;
        let parameter_name = |index: usize| format!("__p${}${}", instance, index);

        let parameters = argument_types
            .iter()
            .enumerate()
            .map(|(index, ty)| Parameter::new(parameter_name(index), ty.clone()))
            .collect();

        let call = Invocation {
            kind: InvokeKind::Virtual,
            receiver: Some(Box::new(Instruction::StandardStream(self.stream()))),
            owner: TypeRef::named(PRINT_STREAM_TYPE),
            name: self.stream_method().to_string(),
            shape: MethodShape::new(TypeRef::Void, argument_types.to_vec()),
            arguments: argument_types
                .iter()
                .enumerate()
                .map(|(index, ty)| Instruction::access(parameter_name(index), ty.clone()))
                .collect(),
        };

        MethodDeclaration::new(self.stream_method(), parameters, TypeRef::Void)
            .with_modifiers(vec![Modifier::Public, Modifier::Synthetic])
            .with_body(vec![Instruction::Invoke(call)])
    }
}

/// Resolve an intrinsic by name, instantiated for `argument_types`
pub fn resolve(name: &str, argument_types: &[TypeRef]) -> Option<MethodDeclaration> {
    Intrinsic::from_name(name).map(|intrinsic| intrinsic.instantiate(argument_types))
}
