//! Core declaration model, whole-program resolution and inlining for the Firefly compiler

pub mod declaration;
pub mod diagnostics;
pub mod error;
pub mod imports;
pub mod inliner;
pub mod ir;
pub mod prelude;
pub mod resolution;
pub mod unit;

pub use declaration::{Constructor, MethodDeclaration, Modifier, Named, Parameter, TypeDeclaration};
pub use diagnostics::{ErrorRecord, ErrorSink, SourceSpan, UnitCompilationError};
pub use error::{CoreError, InlineError, ResolutionError};
pub use inliner::{FunctionInliner, StandardFunctionInliner};
pub use ir::{Instruction, Literal, MethodShape, StandardStream, TypeRef};
pub use resolution::{MethodSignature, ResolutionTable, ResolutionTables, Signature, TypeSignature};
pub use unit::{Artifact, CompilationUnit, CompiledUnit, DeclaredUnit, UnitKind};
