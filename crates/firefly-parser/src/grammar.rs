//! Recursive-descent grammar for Firefly units
//!
//! ```text
//! unit      := import* (fnDecl | statement)*
//! import    := 'import' path ('[' ID (',' ID)* ']')? ('as' ID)?
//! path      := ID ('.' ID)*
//! fnDecl    := 'fn' ID '(' (param (',' param)*)? ')' '{' statement* '}'
//! param     := ID (':' type)? ('=' expr)?
//! type      := path | '`' chars '`'
//! statement := expr ';'?
//! expr      := ID '(' (expr (',' expr)*)? ')' | ID | literal
//! ```

use firefly_core::diagnostics::SourceSpan;
use firefly_core::ir::Literal;

use crate::error::ParserError;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::syntax::{Expr, ExprKind, FnDecl, ImportSyntax, Item, Param, SyntaxUnit, TypeName};

/// Turns unit text into a syntax tree
pub trait Grammar: Send + Sync {
    fn parse(&self, source: &str) -> Result<SyntaxUnit, ParserError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FireflyGrammar;

impl Grammar for FireflyGrammar {
    fn parse(&self, source: &str) -> Result<SyntaxUnit, ParserError> {
        let tokens = Lexer::new(source).tokenize()?;
        Parser { tokens, position: 0 }.unit()
    }
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        // `tokenize` always ends with Eof and the parser never moves past it.
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> Option<Token> {
        (self.peek_kind() == kind).then(|| self.advance())
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParserError> {
        match self.eat(&kind) {
            Some(token) => Ok(token),
            None => Err(self.unexpected(&kind.to_string())),
        }
    }

    fn unexpected(&self, expected: &str) -> ParserError {
        let token = self.peek();
        ParserError::UnexpectedToken {
            expected: expected.to_string(),
            found: token.kind.to_string(),
            line: token.span.start_line,
            offset: token.span.start_offset,
        }
    }

    fn ident(&mut self) -> Result<(String, SourceSpan), ParserError> {
        match self.peek_kind() {
            TokenKind::Ident(_) => {
                let token = self.advance();
                match token.kind {
                    TokenKind::Ident(name) => Ok((name, token.span)),
                    _ => Err(self.unexpected("identifier")),
                }
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn unit(mut self) -> Result<SyntaxUnit, ParserError> {
        let mut unit = SyntaxUnit::default();

        while *self.peek_kind() == TokenKind::Import {
            unit.imports.push(self.import()?);
        }

        while *self.peek_kind() != TokenKind::Eof {
            let item = match self.peek_kind() {
                TokenKind::Fn => Item::Function(self.function()?),
                TokenKind::Import => return Err(self.unexpected("function or statement")),
                _ => Item::Statement(self.statement()?),
            };
            unit.items.push(item);
        }

        Ok(unit)
    }

    fn path(&mut self) -> Result<(String, SourceSpan), ParserError> {
        let (mut path, start) = self.ident()?;
        let mut span = start;
        while self.eat(&TokenKind::Dot).is_some() {
            let (segment, segment_span) = self.ident()?;
            path.push('.');
            path.push_str(&segment);
            span = start.to(segment_span);
        }
        Ok((path, span))
    }

    fn import(&mut self) -> Result<ImportSyntax, ParserError> {
        let start = self.expect(TokenKind::Import)?.span;
        let (path, mut span) = self.path()?;
        span = start.to(span);

        let mut names = Vec::new();
        if self.eat(&TokenKind::LBracket).is_some() {
            loop {
                names.push(self.ident()?.0);
                if self.eat(&TokenKind::Comma).is_none() {
                    break;
                }
            }
            span = span.to(self.expect(TokenKind::RBracket)?.span);
        }

        let mut alias = None;
        if self.eat(&TokenKind::As).is_some() {
            let (name, alias_span) = self.ident()?;
            alias = Some(name);
            span = span.to(alias_span);
        }
        self.eat(&TokenKind::Semicolon);

        Ok(ImportSyntax {
            path,
            names,
            alias,
            span,
        })
    }

    fn function(&mut self) -> Result<FnDecl, ParserError> {
        let start = self.expect(TokenKind::Fn)?.span;
        let (name, _) = self.ident()?;

        self.expect(TokenKind::LParen)?;
        let mut parameters = Vec::new();
        if *self.peek_kind() != TokenKind::RParen {
            loop {
                parameters.push(self.parameter()?);
                if self.eat(&TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;

        self.expect(TokenKind::LBrace)?;
        let mut body = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RBrace | TokenKind::Eof) {
            body.push(self.statement()?);
        }
        let end = self.expect(TokenKind::RBrace)?.span;

        Ok(FnDecl {
            name,
            parameters,
            body,
            span: start.to(end),
        })
    }

    fn parameter(&mut self) -> Result<Param, ParserError> {
        let (name, start) = self.ident()?;
        let mut span = start;

        let mut ty = None;
        if self.eat(&TokenKind::Colon).is_some() {
            let type_name = self.type_name()?;
            span = start.to(type_name.span);
            ty = Some(type_name);
        }

        let mut default = None;
        if self.eat(&TokenKind::Equals).is_some() {
            let value = self.expr()?;
            span = start.to(value.span);
            default = Some(value);
        }

        Ok(Param {
            name,
            ty,
            default,
            span,
        })
    }

    fn type_name(&mut self) -> Result<TypeName, ParserError> {
        if let TokenKind::QuotedType(_) = self.peek_kind() {
            let token = self.advance();
            if let TokenKind::QuotedType(name) = token.kind {
                return Ok(TypeName {
                    name,
                    span: token.span,
                });
            }
        }
        let (name, span) = self.path()?;
        Ok(TypeName { name, span })
    }

    fn statement(&mut self) -> Result<Expr, ParserError> {
        let expr = self.expr()?;
        self.eat(&TokenKind::Semicolon);
        Ok(expr)
    }

    fn expr(&mut self) -> Result<Expr, ParserError> {
        let token = self.advance();
        let kind = match token.kind {
            TokenKind::Str(value) => ExprKind::Literal(Literal::String(value)),
            TokenKind::Char(value) => ExprKind::Literal(Literal::Char(value)),
            TokenKind::Int(value) => ExprKind::Literal(Literal::Int(value)),
            TokenKind::Decimal(value) => ExprKind::Literal(Literal::Decimal(value)),
            TokenKind::True => ExprKind::Literal(Literal::Bool(true)),
            TokenKind::False => ExprKind::Literal(Literal::Bool(false)),
            TokenKind::Null => ExprKind::Null,
            TokenKind::Ident(name) => {
                if self.eat(&TokenKind::LParen).is_none() {
                    return Ok(Expr {
                        kind: ExprKind::Ident(name),
                        span: token.span,
                    });
                }

                let mut arguments = Vec::new();
                if *self.peek_kind() != TokenKind::RParen {
                    loop {
                        arguments.push(self.expr()?);
                        if self.eat(&TokenKind::Comma).is_none() {
                            break;
                        }
                    }
                }
                let end = self.expect(TokenKind::RParen)?.span;
                return Ok(Expr {
                    kind: ExprKind::Call { name, arguments },
                    span: token.span.to(end),
                });
            }
            other => {
                return Err(ParserError::UnexpectedToken {
                    expected: "expression".to_string(),
                    found: other.to_string(),
                    line: token.span.start_line,
                    offset: token.span.start_offset,
                })
            }
        };

        Ok(Expr {
            kind,
            span: token.span,
        })
    }
}
