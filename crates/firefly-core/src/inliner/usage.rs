//! Instruction traversals used by the inliner

use std::collections::{HashMap, HashSet};

use crate::ir::{Instruction, Invocation};

/// Count reads of each variable in `tracked` across `instructions`
///
/// Variables that are never read do not appear in the result.
pub fn count_reads(instructions: &[Instruction], tracked: &HashSet<String>) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for instruction in instructions {
        count_in(instruction, tracked, &mut counts);
    }
    counts
}

fn count_in(instruction: &Instruction, tracked: &HashSet<String>, counts: &mut HashMap<String, usize>) {
    match instruction {
        Instruction::Literal(_) | Instruction::StandardStream(_) => {}
        Instruction::VariableAccess { name, .. } => {
            if tracked.contains(name) {
                *counts.entry(name.clone()).or_default() += 1;
            }
        }
        Instruction::VariableDeclaration { value, .. } => count_in(value, tracked, counts),
        Instruction::Invoke(invocation) => {
            if let Some(receiver) = &invocation.receiver {
                count_in(receiver, tracked, counts);
            }
            for argument in &invocation.arguments {
                count_in(argument, tracked, counts);
            }
        }
    }
}

/// Replace every read of a variable in `values` with its value
pub fn substitute(instruction: Instruction, values: &HashMap<String, Instruction>) -> Instruction {
    match instruction {
        Instruction::VariableAccess { name, ty } => match values.get(&name) {
            Some(value) => value.clone(),
            None => Instruction::VariableAccess { name, ty },
        },
        Instruction::VariableDeclaration { name, ty, value } => Instruction::VariableDeclaration {
            name,
            ty,
            value: Box::new(substitute(*value, values)),
        },
        Instruction::Invoke(invocation) => Instruction::Invoke(Invocation {
            receiver: invocation
                .receiver
                .map(|receiver| Box::new(substitute(*receiver, values))),
            arguments: invocation
                .arguments
                .into_iter()
                .map(|argument| substitute(argument, values))
                .collect(),
            ..invocation
        }),
        literal @ (Instruction::Literal(_) | Instruction::StandardStream(_)) => literal,
    }
}
