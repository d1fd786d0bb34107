//! Inlining and copy propagation

use firefly_core::declaration::{MethodDeclaration, Parameter};
use firefly_core::error::InlineError;
use firefly_core::inliner::{intrinsics, FunctionInliner, StandardFunctionInliner};
use firefly_core::ir::{Instruction, Invocation, InvokeKind, Literal, MethodShape, StandardStream, TypeRef};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn call(name: &str, arguments: Vec<Instruction>) -> Instruction {
    Instruction::Invoke(Invocation {
        kind: InvokeKind::Static,
        receiver: None,
        owner: TypeRef::named("app.Util"),
        name: name.to_string(),
        shape: MethodShape::new(TypeRef::Void, vec![TypeRef::String; arguments.len()]),
        arguments,
    })
}

fn read(name: &str) -> Instruction {
    Instruction::access(name, TypeRef::String)
}

fn target(parameters: &[&str], body: Vec<Instruction>) -> MethodDeclaration {
    MethodDeclaration::new(
        "target",
        parameters
            .iter()
            .map(|name| Parameter::new(*name, TypeRef::String))
            .collect(),
        TypeRef::Void,
    )
    .with_body(body)
}

fn is_binding(instruction: &Instruction) -> bool {
    matches!(instruction, Instruction::VariableDeclaration { .. })
}

#[test]
fn test_single_use_is_substituted() {
    let target = target(&["a"], vec![call("show", vec![read("a")])]);

    let result = StandardFunctionInliner::new()
        .inline(vec![Instruction::string("hi")], &target)
        .unwrap();

    assert_eq!(result, vec![call("show", vec![Instruction::string("hi")])]);
}

#[test]
fn test_double_use_keeps_binding() {
    let target = target(&["a"], vec![call("show", vec![read("a"), read("a")])]);

    let result = StandardFunctionInliner::new()
        .inline(vec![Instruction::string("hi")], &target)
        .unwrap();

    assert_eq!(
        result,
        vec![
            Instruction::declare("a", TypeRef::String, Instruction::string("hi")),
            call("show", vec![read("a"), read("a")]),
        ]
    );
}

#[test]
fn test_unused_binding_is_kept() {
    let target = target(&["a", "b"], vec![call("show", vec![read("b")])]);

    let result = StandardFunctionInliner::new()
        .inline(vec![Instruction::string("unused"), Instruction::string("used")], &target)
        .unwrap();

    assert_eq!(
        result,
        vec![
            Instruction::declare("a", TypeRef::String, Instruction::string("unused")),
            call("show", vec![Instruction::string("used")]),
        ]
    );
}

#[test]
fn test_arity_mismatch_is_rejected() {
    let target = target(&["a", "b"], vec![]);

    let result = StandardFunctionInliner::new().inline(vec![Instruction::string("only")], &target);

    assert_eq!(
        result,
        Err(InlineError::ArityMismatch {
            function: "target".to_string(),
            expected: 2,
            found: 1,
        })
    );
}

#[test]
fn test_reads_inside_nested_calls_are_counted() {
    let target = target(
        &["a", "b"],
        vec![call("outer", vec![call("inner", vec![read("a")]), read("b"), read("b")])],
    );

    let argument = call("compute", vec![]);
    let result = StandardFunctionInliner::new()
        .inline(vec![argument.clone(), Instruction::string("b")], &target)
        .unwrap();

    assert_eq!(
        result,
        vec![
            Instruction::declare("b", TypeRef::String, Instruction::string("b")),
            call("outer", vec![call("inner", vec![argument]), read("b"), read("b")]),
        ]
    );
}

#[test]
fn test_caller_variables_are_not_tracked() {
    // `x` belongs to the caller; only the bindings created by this call are propagated.
    let target = target(&["a"], vec![call("show", vec![read("a"), read("x")])]);

    let result = StandardFunctionInliner::new()
        .inline(vec![Instruction::string("hi")], &target)
        .unwrap();

    assert_eq!(result, vec![call("show", vec![Instruction::string("hi"), read("x")])]);
}

#[test]
fn test_println_with_two_arguments_inlines_to_direct_call() {
    let a = Instruction::string("a");
    let b = Instruction::Literal(Literal::Int(2));
    let println = intrinsics::resolve("println", &[TypeRef::String, TypeRef::Int]).unwrap();

    let result = StandardFunctionInliner::new()
        .inline(vec![a.clone(), b.clone()], &println)
        .unwrap();

    assert_eq!(result.len(), 1);
    assert!(!result.iter().any(is_binding));

    let invocation = result[0].as_invocation().unwrap();
    assert_eq!(invocation.name, "println");
    assert_eq!(
        invocation.receiver.as_deref(),
        Some(&Instruction::StandardStream(StandardStream::Out))
    );
    assert_eq!(invocation.arguments, vec![a, b]);
}

proptest! {
    /// Parameters read exactly once vanish into their read sites; parameters
    /// read more often keep their binding and every read still names it.
    #[test]
    fn prop_bindings_follow_read_counts(reads in proptest::collection::vec(1usize..4, 1..6)) {
        let names: Vec<String> = (0..reads.len()).map(|i| format!("p{}", i)).collect();
        let mut arguments_of_show = Vec::new();
        for (name, count) in names.iter().zip(&reads) {
            for _ in 0..*count {
                arguments_of_show.push(read(name));
            }
        }
        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let target = target(&name_refs, vec![call("show", arguments_of_show)]);
        let arguments: Vec<Instruction> = names
            .iter()
            .map(|name| Instruction::string(format!("value of {}", name)))
            .collect();

        let result = StandardFunctionInliner::new().inline(arguments, &target).unwrap();

        let bindings: Vec<&str> = result
            .iter()
            .filter_map(|instruction| match instruction {
                Instruction::VariableDeclaration { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        let expected: Vec<&str> = names
            .iter()
            .zip(&reads)
            .filter(|(_, count)| **count > 1)
            .map(|(name, _)| name.as_str())
            .collect();
        prop_assert_eq!(bindings, expected);

        let show = result.last().and_then(Instruction::as_invocation).unwrap();
        let mut position = 0;
        for (name, count) in names.iter().zip(&reads) {
            for _ in 0..*count {
                let expected = if *count == 1 {
                    Instruction::string(format!("value of {}", name))
                } else {
                    read(name)
                };
                prop_assert_eq!(&show.arguments[position], &expected);
                position += 1;
            }
        }
    }
}
