//! Syntax tree of one Firefly unit

use firefly_core::diagnostics::SourceSpan;
use firefly_core::imports::{Import, ImportKind, Imports};
use firefly_core::ir::Literal;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyntaxUnit {
    pub imports: Vec<ImportSyntax>,
    pub items: Vec<Item>,
}

impl SyntaxUnit {
    pub fn functions(&self) -> impl Iterator<Item = &FnDecl> {
        self.items.iter().filter_map(|item| match item {
            Item::Function(function) => Some(function),
            Item::Statement(_) => None,
        })
    }

    /// Statements written outside of any function
    pub fn top_level_statements(&self) -> impl Iterator<Item = &Expr> {
        self.items.iter().filter_map(|item| match item {
            Item::Statement(statement) => Some(statement),
            Item::Function(_) => None,
        })
    }

    pub fn import_table(&self) -> Imports {
        Imports::new(self.imports.iter().map(ImportSyntax::to_import).collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportSyntax {
    pub path: String,
    pub names: Vec<String>,
    pub alias: Option<String>,
    pub span: SourceSpan,
}

impl ImportSyntax {
    /// A bracketed name list makes a namespace import, anything else a unit import
    pub fn to_import(&self) -> Import {
        let kind = if self.names.is_empty() {
            ImportKind::Unit
        } else {
            ImportKind::Namespace
        };
        Import {
            path: self.path.clone(),
            names: self.names.clone(),
            alias: self.alias.clone(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Function(FnDecl),
    Statement(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnDecl {
    pub name: String,
    pub parameters: Vec<Param>,
    pub body: Vec<Expr>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Option<TypeName>,
    pub default: Option<Expr>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeName {
    pub name: String,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Call { name: String, arguments: Vec<Expr> },
    Ident(String),
    Literal(Literal),
    Null,
}
