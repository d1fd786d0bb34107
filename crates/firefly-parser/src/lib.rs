//! Grammar and declaration translator for the Firefly language
//!
//! [`FireflyGrammar`] turns unit text into a [`syntax::SyntaxUnit`];
//! [`AstTranslator`] turns that into the unit's declaration tree, resolving
//! names against the compilation's resolution tables.

pub mod error;
pub mod grammar;
pub mod lexer;
pub mod syntax;
pub mod translator;

pub use error::ParserError;
pub use grammar::{FireflyGrammar, Grammar};
pub use translator::{AstTranslator, DeclaredSyntax, ParseContext, ENTRYPOINT};
