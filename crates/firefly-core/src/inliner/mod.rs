//! Function inlining
//!
//! [`StandardFunctionInliner`] expands a call into bindings of the arguments
//! followed by the callee body, then propagates every argument whose binding
//! is read exactly once straight into its read site.

pub mod intrinsics;
mod usage;

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::declaration::MethodDeclaration;
use crate::error::InlineError;
use crate::ir::Instruction;

pub use intrinsics::Intrinsic;
pub use usage::{count_reads, substitute};

pub trait FunctionInliner: Send + Sync {
    /// Instructions equivalent to calling `target` with `arguments`
    fn inline(
        &self,
        arguments: Vec<Instruction>,
        target: &MethodDeclaration,
    ) -> Result<Vec<Instruction>, InlineError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFunctionInliner;

impl StandardFunctionInliner {
    pub fn new() -> Self {
        Self
    }

    fn optimize(&self, instructions: Vec<Instruction>, bindings: &HashSet<String>) -> Vec<Instruction> {
        let reads = count_reads(&instructions, bindings);

        let mut propagated: HashMap<String, Instruction> = HashMap::new();
        let mut kept = Vec::with_capacity(instructions.len());
        for instruction in instructions {
            match instruction {
                Instruction::VariableDeclaration { name, value, .. }
                    if bindings.contains(&name) && reads.get(&name) == Some(&1) =>
                {
                    propagated.insert(name, *value);
                }
                other => kept.push(other),
            }
        }

        if propagated.is_empty() {
            return kept;
        }

        trace!("Propagating {} single-use binding(s)", propagated.len());
        kept.into_iter()
            .map(|instruction| substitute(instruction, &propagated))
            .collect()
    }
}

impl FunctionInliner for StandardFunctionInliner {
    fn inline(
        &self,
        arguments: Vec<Instruction>,
        target: &MethodDeclaration,
    ) -> Result<Vec<Instruction>, InlineError> {
        if arguments.len() != target.parameters.len() {
            return Err(InlineError::ArityMismatch {
                function: target.name.clone(),
                expected: target.parameters.len(),
                found: arguments.len(),
            });
        }

        let mut bindings = HashSet::with_capacity(arguments.len());
        let mut instructions = Vec::with_capacity(arguments.len() + target.body.len());
        for (parameter, argument) in target.parameters.iter().zip(arguments) {
            bindings.insert(parameter.name.clone());
            instructions.push(Instruction::declare(
                parameter.name.clone(),
                parameter.ty.clone(),
                argument,
            ));
        }
        instructions.extend(target.body.iter().cloned());

        Ok(self.optimize(instructions, &bindings))
    }
}
