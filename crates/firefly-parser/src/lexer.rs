//! Tokenizer for Firefly source text
//!
//! Offsets are character indices into the whole text; the stop offset of a
//! token is the index of its last character.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use firefly_core::diagnostics::SourceSpan;

use crate::error::ParserError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Str(String),
    Char(char),
    Int(i64),
    Decimal(f64),
    /// A type name written between backticks
    QuotedType(String),

    Import,
    Fn,
    As,
    True,
    False,
    Null,

    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semicolon,
    Dot,
    Equals,

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(name) => write!(f, "identifier '{}'", name),
            TokenKind::Str(_) => write!(f, "string literal"),
            TokenKind::Char(_) => write!(f, "character literal"),
            TokenKind::Int(_) => write!(f, "integer literal"),
            TokenKind::Decimal(_) => write!(f, "decimal literal"),
            TokenKind::QuotedType(name) => write!(f, "type `{}`", name),
            TokenKind::Import => write!(f, "'import'"),
            TokenKind::Fn => write!(f, "'fn'"),
            TokenKind::As => write!(f, "'as'"),
            TokenKind::True => write!(f, "'true'"),
            TokenKind::False => write!(f, "'false'"),
            TokenKind::Null => write!(f, "'null'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::LBrace => write!(f, "'{{'"),
            TokenKind::RBrace => write!(f, "'}}'"),
            TokenKind::LBracket => write!(f, "'['"),
            TokenKind::RBracket => write!(f, "']'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::Semicolon => write!(f, "';'"),
            TokenKind::Dot => write!(f, "'.'"),
            TokenKind::Equals => write!(f, "'='"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: SourceSpan,
}

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    offset: usize,
    line: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            offset: 0,
            line: 1,
        }
    }

    /// Tokenize the whole input; the last token is always `Eof`
    pub fn tokenize(mut self) -> Result<Vec<Token>, ParserError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        self.offset += 1;
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(ch) if ch.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    if ahead.next() != Some('/') {
                        return;
                    }
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => return,
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, ParserError> {
        self.skip_trivia();

        let start_line = self.line;
        let start = self.offset;
        let Some(ch) = self.bump() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                span: SourceSpan::new(start_line, start_line, start, start),
            });
        };

        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            '.' => TokenKind::Dot,
            '=' => TokenKind::Equals,
            '"' => TokenKind::Str(self.string(start_line, start)?),
            '\'' => TokenKind::Char(self.character(start_line, start)?),
            '`' => TokenKind::QuotedType(self.quoted_type(start_line, start)?),
            c if c.is_ascii_digit() => self.number(c, start_line, start)?,
            c if c.is_alphabetic() || c == '_' => self.word(c),
            found => {
                return Err(ParserError::UnexpectedCharacter {
                    found,
                    line: start_line,
                    offset: start,
                })
            }
        };

        Ok(Token {
            kind,
            span: SourceSpan::new(start_line, self.line, start, self.offset - 1),
        })
    }

    fn word(&mut self, first: char) -> TokenKind {
        let mut text = String::from(first);
        while let Some(ch) = self.peek() {
            if !(ch.is_alphanumeric() || ch == '_') {
                break;
            }
            text.push(ch);
            self.bump();
        }

        match text.as_str() {
            "import" => TokenKind::Import,
            "fn" => TokenKind::Fn,
            "as" => TokenKind::As,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            _ => TokenKind::Ident(text),
        }
    }

    fn number(&mut self, first: char, line: u32, offset: usize) -> Result<TokenKind, ParserError> {
        let mut text = String::from(first);
        self.digits(&mut text);

        let mut ahead = self.chars.clone();
        let is_decimal = ahead.next() == Some('.') && ahead.next().is_some_and(|c| c.is_ascii_digit());
        if is_decimal {
            text.push('.');
            self.bump();
            self.digits(&mut text);
            return text
                .parse()
                .map(TokenKind::Decimal)
                .map_err(|_| ParserError::InvalidLiteral {
                    what: "decimal",
                    text,
                    line,
                    offset,
                });
        }

        text.parse()
            .map(TokenKind::Int)
            .map_err(|_| ParserError::InvalidLiteral {
                what: "integer",
                text,
                line,
                offset,
            })
    }

    fn digits(&mut self, text: &mut String) {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.bump();
            } else if ch == '_' {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn escape(&mut self, what: &'static str, line: u32, offset: usize) -> Result<char, ParserError> {
        let escaped = match self.bump() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('0') => '\0',
            Some('\\') => '\\',
            Some('"') => '"',
            Some('\'') => '\'',
            Some(other) => {
                return Err(ParserError::InvalidLiteral {
                    what,
                    text: format!("\\{}", other),
                    line,
                    offset,
                })
            }
            None => return Err(ParserError::Unterminated { what, line, offset }),
        };
        Ok(escaped)
    }

    fn string(&mut self, line: u32, offset: usize) -> Result<String, ParserError> {
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(value),
                Some('\\') => value.push(self.escape("string", line, offset)?),
                Some('\n') | None => {
                    return Err(ParserError::Unterminated {
                        what: "string",
                        line,
                        offset,
                    })
                }
                Some(ch) => value.push(ch),
            }
        }
    }

    fn character(&mut self, line: u32, offset: usize) -> Result<char, ParserError> {
        let value = match self.bump() {
            Some('\\') => self.escape("character", line, offset)?,
            Some('\'') | Some('\n') | None => {
                return Err(ParserError::Unterminated {
                    what: "character",
                    line,
                    offset,
                })
            }
            Some(ch) => ch,
        };
        match self.bump() {
            Some('\'') => Ok(value),
            _ => Err(ParserError::Unterminated {
                what: "character",
                line,
                offset,
            }),
        }
    }

    fn quoted_type(&mut self, line: u32, offset: usize) -> Result<String, ParserError> {
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('`') => return Ok(value.trim().to_string()),
                Some('\n') | None => {
                    return Err(ParserError::Unterminated {
                        what: "type name",
                        line,
                        offset,
                    })
                }
                Some(ch) => value.push(ch),
            }
        }
    }
}
