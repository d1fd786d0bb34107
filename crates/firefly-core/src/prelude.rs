//! Globally visible names: built-in types and intrinsic functions
//!
//! These resolve without consulting the resolution tables.

use crate::inliner::intrinsics::Intrinsic;
use crate::ir::TypeRef;

pub const STD_NAMESPACE: &str = "firefly.Std";
pub const PRIMITIVES_NAMESPACE: &str = "firefly.Std.Primitives";

/// Resolve a built-in type by its simple or fully qualified name
pub fn builtin_type(name: &str) -> Option<TypeRef> {
    let simple = name
        .strip_prefix(PRIMITIVES_NAMESPACE)
        .or_else(|| name.strip_prefix(STD_NAMESPACE))
        .map(|rest| rest.trim_start_matches('.'))
        .unwrap_or(name);

    let ty = match simple {
        "String" => TypeRef::String,
        "Int" => TypeRef::Int,
        "Long" => TypeRef::Long,
        "Boolean" | "Bool" => TypeRef::Bool,
        "Decimal" | "Double" => TypeRef::Decimal,
        "Char" | "Character" => TypeRef::Char,
        "Byte" => TypeRef::Byte,
        "Unit" => TypeRef::Void,
        _ => return None,
    };
    Some(ty)
}

pub fn is_intrinsic(name: &str) -> bool {
    Intrinsic::from_name(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_types() {
        assert_eq!(builtin_type("String"), Some(TypeRef::String));
        assert_eq!(builtin_type("firefly.Std.String"), Some(TypeRef::String));
        assert_eq!(builtin_type("firefly.Std.Primitives.Int"), Some(TypeRef::Int));
        assert_eq!(builtin_type("Person"), None);
    }

    #[test]
    fn test_intrinsics() {
        for name in ["print", "println", "eprint", "eprintln"] {
            assert!(is_intrinsic(name));
        }
        assert!(!is_intrinsic("printf"));
    }
}
