//! Translation of a unit's syntax tree into its declaration tree
//!
//! Translation runs in two phases so that units can refer to each other in
//! any order:
//!
//! - [`AstTranslator::declare`] parses the unit and registers the type and
//!   method skeletons it declares. It never waits on other units.
//! - [`AstTranslator::resolve`] looks up every type and function the unit
//!   refers to, then builds the final declaration tree. Lookups for names
//!   that are not declared yet wait until they are, or until resolution ends.
//!
//! Semantic errors are reported as unit errors and translation continues with
//! a best-effort result.

use std::collections::HashMap;
use std::sync::Arc;

use firefly_core::declaration::{Constructor, MethodDeclaration, Modifier, Parameter, TypeDeclaration};
use firefly_core::diagnostics::{ErrorSink, SourceSpan, UnitCompilationError};
use firefly_core::error::{CoreError, InlineError};
use firefly_core::imports::Imports;
use firefly_core::inliner::{intrinsics, FunctionInliner, StandardFunctionInliner};
use firefly_core::ir::{Instruction, Invocation, InvokeKind, TypeRef};
use firefly_core::prelude::{builtin_type, is_intrinsic};
use firefly_core::resolution::{MethodSignature, ResolutionTables, ResolvedDeclaration, TypeSignature};
use firefly_core::unit::{CompilationUnit, DeclaredUnit, UnitKind};
use tracing::{debug, trace};

use crate::error::ParserError;
use crate::grammar::{FireflyGrammar, Grammar};
use crate::syntax::{Expr, ExprKind, FnDecl, Param, SyntaxUnit};

pub const ENTRYPOINT: &str = "entrypoint";

/// Shared state every translation of a compilation works against
#[derive(Debug, Clone)]
pub struct ParseContext {
    pub tables: ResolutionTables,
    pub errors: ErrorSink,
}

impl ParseContext {
    pub fn new(tables: ResolutionTables, errors: ErrorSink) -> Self {
        Self { tables, errors }
    }
}

/// A unit that finished its declare phase
#[derive(Debug, Clone)]
pub struct DeclaredSyntax {
    pub unit: Arc<CompilationUnit>,
    pub syntax: SyntaxUnit,
    /// Method skeletons registered for the unit, entrypoint first
    pub skeletons: Vec<MethodDeclaration>,
}

pub struct AstTranslator {
    grammar: Arc<dyn Grammar>,
    inliner: Arc<dyn FunctionInliner>,
    context: ParseContext,
}

impl AstTranslator {
    pub fn new(context: ParseContext) -> Self {
        Self {
            grammar: Arc::new(FireflyGrammar),
            inliner: Arc::new(StandardFunctionInliner::new()),
            context,
        }
    }

    pub fn with_grammar(mut self, grammar: Arc<dyn Grammar>) -> Self {
        self.grammar = grammar;
        self
    }

    pub fn with_inliner(mut self, inliner: Arc<dyn FunctionInliner>) -> Self {
        self.inliner = inliner;
        self
    }

    pub fn context(&self) -> &ParseContext {
        &self.context
    }

    /// Parse the unit and register everything it declares
    pub async fn declare(&self, unit: Arc<CompilationUnit>) -> Result<DeclaredSyntax, ParserError> {
        if unit.kind != UnitKind::Unit {
            return Err(CoreError::UnsupportedUnitKind(unit.kind.to_string()).into());
        }

        let source = {
            let unit = unit.clone();
            tokio::task::spawn_blocking(move || unit.read_content()).await??
        };
        let syntax = self.grammar.parse(&source)?;

        let owner = unit.qualified_name();
        let package = unit.package_name();
        let imports = syntax.import_table();

        let skeletons: Vec<MethodDeclaration> = std::iter::once(entrypoint())
            .chain(syntax.functions().map(|function| skeleton(function, &imports, &package)))
            .collect();

        let tables = &self.context.tables;
        tables
            .types
            .register_resolved(ResolvedDeclaration::new(
                owner.clone(),
                Some(unit.clone()),
                TypeDeclaration::new(owner.clone(), unit.kind),
            ))
            .await?;
        for method in &skeletons {
            tables
                .methods
                .register_resolved(ResolvedDeclaration::new(owner.clone(), Some(unit.clone()), method.clone()))
                .await?;
        }

        debug!("Declared {} with {} method(s)", owner, skeletons.len());
        Ok(DeclaredSyntax {
            unit,
            syntax,
            skeletons,
        })
    }

    /// Resolve every reference of a declared unit and build its declaration tree
    pub async fn resolve(&self, declared: DeclaredSyntax) -> Result<DeclaredUnit, ParserError> {
        let DeclaredSyntax {
            unit,
            syntax,
            skeletons,
        } = declared;
        let owner = unit.qualified_name();
        let package = unit.package_name();
        let imports = syntax.import_table();

        let mut references = References::default();
        for function in syntax.functions() {
            for parameter in &function.parameters {
                if let Some(ty) = &parameter.ty {
                    if builtin_type(&ty.name).is_none() && !references.types.contains_key(&ty.name) {
                        let resolved = self.lookup_type(&ty.name, &imports, &package).await?;
                        references.types.insert(ty.name.clone(), resolved);
                    }
                }
            }
        }

        let mut calls = Vec::new();
        for function in syntax.functions() {
            for parameter in &function.parameters {
                collect_calls(parameter.default.iter(), &mut calls);
            }
            collect_calls(function.body.iter(), &mut calls);
        }
        collect_calls(syntax.top_level_statements(), &mut calls);

        for (name, arity) in calls {
            if is_intrinsic(&name) || references.methods.contains_key(&(name.clone(), arity)) {
                continue;
            }
            let found = self
                .context
                .tables
                .methods
                .lookup(&owner, MethodSignature::accepting(name.clone(), arity))
                .await?;
            references.methods.insert((name, arity), found);
        }

        let emitter = Emitter {
            unit: &unit,
            owner: &owner,
            references: &references,
            errors: &self.context.errors,
            inliner: self.inliner.as_ref(),
        };
        let declaration = emitter.type_declaration(&syntax, &skeletons);

        debug!("Resolved {}", owner);
        Ok(DeclaredUnit { unit, declaration })
    }

    async fn lookup_type(
        &self,
        name: &str,
        imports: &Imports,
        package: &str,
    ) -> Result<Option<TypeRef>, ParserError> {
        for candidate in type_candidates(name, imports, package) {
            let found = self
                .context
                .tables
                .types
                .lookup(&candidate, TypeSignature::new(candidate.clone()))
                .await?;
            if let Some(declaration) = found {
                return Ok(Some(TypeRef::Named(declaration.qualified_name)));
            }
        }
        Ok(None)
    }
}

/// Qualified names a type name may refer to, most specific first
fn type_candidates(name: &str, imports: &Imports, package: &str) -> Vec<String> {
    let mut candidates = imports.candidates(name);
    if !name.contains('.') {
        let local = if package.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", package, name)
        };
        if !candidates.contains(&local) {
            candidates.push(local);
        }
    }
    candidates
}

fn entrypoint() -> MethodDeclaration {
    MethodDeclaration::new(
        ENTRYPOINT,
        vec![Parameter::new("args", TypeRef::array_of(TypeRef::String))],
        TypeRef::Void,
    )
    .with_modifiers(vec![Modifier::Public, Modifier::Static])
}

/// Method as far as it can be known without looking anything up
fn skeleton(function: &FnDecl, imports: &Imports, package: &str) -> MethodDeclaration {
    let parameters = function
        .parameters
        .iter()
        .map(|parameter| {
            let ty = match &parameter.ty {
                None => TypeRef::Dynamic,
                Some(ty) => builtin_type(&ty.name).unwrap_or_else(|| {
                    type_candidates(&ty.name, imports, package)
                        .into_iter()
                        .next()
                        .map(TypeRef::Named)
                        .unwrap_or(TypeRef::Dynamic)
                }),
            };
            Parameter {
                name: parameter.name.clone(),
                ty,
                default: parameter.default.as_ref().and_then(literal_value),
            }
        })
        .collect();
    MethodDeclaration::new(function.name.clone(), parameters, TypeRef::Void)
        .with_modifiers(vec![Modifier::Public, Modifier::Static])
}

fn literal_value(expr: &Expr) -> Option<Instruction> {
    match &expr.kind {
        ExprKind::Literal(literal) => Some(Instruction::Literal(literal.clone())),
        _ => None,
    }
}

/// Every `(name, argument count)` called in `exprs`, in order of appearance
fn collect_calls<'a>(exprs: impl Iterator<Item = &'a Expr>, calls: &mut Vec<(String, usize)>) {
    for expr in exprs {
        if let ExprKind::Call { name, arguments } = &expr.kind {
            calls.push((name.clone(), arguments.len()));
            collect_calls(arguments.iter(), calls);
        }
    }
}

/// Results of the lookups a unit needed
#[derive(Debug, Default)]
struct References {
    types: HashMap<String, Option<TypeRef>>,
    methods: HashMap<(String, usize), Option<MethodDeclaration>>,
}

type Variables = [(String, TypeRef)];

/// Builds the declaration tree once every reference has been looked up
struct Emitter<'a> {
    unit: &'a Arc<CompilationUnit>,
    owner: &'a str,
    references: &'a References,
    errors: &'a ErrorSink,
    inliner: &'a dyn FunctionInliner,
}

impl Emitter<'_> {
    fn report(&self, span: SourceSpan, message: String, details: Vec<String>) {
        self.errors
            .unit_error(UnitCompilationError::new(self.unit.clone(), span, message, details));
    }

    /// `skeletons` holds the entrypoint followed by one method per function
    fn type_declaration(&self, syntax: &SyntaxUnit, skeletons: &[MethodDeclaration]) -> TypeDeclaration {
        let mut declaration = TypeDeclaration::new(self.owner, UnitKind::Unit);
        declaration.constructors.push(Constructor {
            modifiers: vec![Modifier::Private],
            parameters: Vec::new(),
            body: Vec::new(),
        });

        let Some((entrypoint, functions)) = skeletons.split_first() else {
            return declaration;
        };
        let arguments: Vec<(String, TypeRef)> = entrypoint
            .parameters
            .iter()
            .map(|p| (p.name.clone(), p.ty.clone()))
            .collect();
        let body = self.statements(syntax.top_level_statements(), &arguments);
        declaration.methods.push(entrypoint.clone().with_body(body));

        for (function, skeleton) in syntax.functions().zip(functions) {
            declaration.methods.push(self.method(function, skeleton));
        }
        declaration
    }

    /// The skeleton's parameter types were guesses; they are replaced with the looked up ones
    fn method(&self, function: &FnDecl, skeleton: &MethodDeclaration) -> MethodDeclaration {
        let parameters: Vec<Parameter> = function
            .parameters
            .iter()
            .map(|parameter| self.parameter(parameter))
            .collect();
        let variables: Vec<(String, TypeRef)> = parameters
            .iter()
            .map(|p| (p.name.clone(), p.ty.clone()))
            .collect();
        let body = self.statements(function.body.iter(), &variables);

        MethodDeclaration {
            parameters,
            body,
            ..skeleton.clone()
        }
    }

    fn parameter(&self, parameter: &Param) -> Parameter {
        let ty = match &parameter.ty {
            None => TypeRef::Dynamic,
            Some(ty) => match builtin_type(&ty.name) {
                Some(builtin) => builtin,
                None => match self.references.types.get(&ty.name) {
                    Some(Some(resolved)) => resolved.clone(),
                    _ => {
                        self.report(
                            ty.span,
                            format!("Could not resolve the type '{}'", ty.name),
                            vec!["The type could not be found during the resolution step.".to_string()],
                        );
                        TypeRef::Dynamic
                    }
                },
            },
        };

        Parameter {
            name: parameter.name.clone(),
            ty,
            default: parameter
                .default
                .as_ref()
                .and_then(|default| self.value(default, &[])),
        }
    }

    fn statements<'e>(&self, exprs: impl Iterator<Item = &'e Expr>, variables: &Variables) -> Vec<Instruction> {
        let mut body = Vec::new();
        for expr in exprs {
            match &expr.kind {
                ExprKind::Call { name, arguments } => {
                    body.extend(self.call(name, arguments, expr.span, variables))
                }
                _ => body.extend(self.value(expr, variables)),
            }
        }
        body
    }

    /// Translate an expression that must produce exactly one value
    fn value(&self, expr: &Expr, variables: &Variables) -> Option<Instruction> {
        match &expr.kind {
            ExprKind::Literal(literal) => Some(Instruction::Literal(literal.clone())),
            ExprKind::Null => {
                self.report(
                    expr.span,
                    "Null literal is not allowed".to_string(),
                    vec!["Firefly does not support 'null' elements.".to_string()],
                );
                None
            }
            ExprKind::Ident(name) => match variables.iter().rev().find(|(n, _)| n == name) {
                Some((name, ty)) => Some(Instruction::access(name.clone(), ty.clone())),
                None => {
                    self.report(
                        expr.span,
                        format!("Could not resolve the variable '{}'", name),
                        vec![format!("No parameter named '{}' is in scope.", name)],
                    );
                    None
                }
            },
            ExprKind::Call { name, arguments } => {
                let mut instructions = self.call(name, arguments, expr.span, variables);
                match instructions.len() {
                    0 => None,
                    1 => instructions.pop(),
                    _ => {
                        self.report(
                            expr.span,
                            format!("The call to '{}' cannot be used as a value", name),
                            vec![format!("It expands to {} instructions.", instructions.len())],
                        );
                        None
                    }
                }
            }
        }
    }

    fn call(&self, name: &str, arguments: &[Expr], span: SourceSpan, variables: &Variables) -> Vec<Instruction> {
        let values: Vec<Instruction> = arguments
            .iter()
            .filter_map(|argument| self.value(argument, variables))
            .collect();

        if is_intrinsic(name) {
            return self.inline(name, values, span);
        }

        let target = match self.references.methods.get(&(name.to_string(), arguments.len())) {
            Some(Some(target)) => target,
            _ => {
                self.report(
                    span,
                    format!("Could not resolve the function '{}'", name),
                    vec![format!(
                        "No function '{}' accepting {} argument(s) is declared in '{}'.",
                        name,
                        arguments.len(),
                        self.owner
                    )],
                );
                return Vec::new();
            }
        };

        // An argument that failed to translate has already been reported.
        if values.len() != arguments.len() {
            return Vec::new();
        }

        let mut values = values;
        let provided = values.len();
        values.extend(
            target
                .parameters
                .iter()
                .skip(provided)
                .filter_map(|parameter| parameter.default.clone()),
        );

        let kind = if target.is_static() {
            InvokeKind::Static
        } else {
            InvokeKind::Virtual
        };
        vec![Instruction::Invoke(Invocation {
            kind,
            receiver: None,
            owner: TypeRef::named(self.owner),
            name: target.name.clone(),
            shape: target.shape(),
            arguments: values,
        })]
    }

    fn inline(&self, name: &str, arguments: Vec<Instruction>, span: SourceSpan) -> Vec<Instruction> {
        let types: Vec<TypeRef> = arguments.iter().map(Instruction::type_ref).collect();
        let Some(target) = intrinsics::resolve(name, &types) else {
            self.report(
                span,
                format!("Could not inline the function '{}'", name),
                vec![InlineError::UnknownIntrinsic(name.to_string()).to_string()],
            );
            return Vec::new();
        };

        match self.inliner.inline(arguments, &target) {
            Ok(instructions) => {
                trace!("Inlined '{}' into {} instruction(s)", name, instructions.len());
                instructions
            }
            Err(err) => {
                self.report(
                    span,
                    format!("Could not inline the function '{}'", name),
                    vec![err.to_string()],
                );
                Vec::new()
            }
        }
    }
}
