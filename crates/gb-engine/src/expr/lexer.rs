use logos::Logos;
use std::fmt;
use std::ops::Range;

use crate::error::{ExprError, ExprResult};

/// Token type for conditions.
///
/// Keywords (`and`, `or`, `not`, `true`, `false`) and dice words (`rnd6`)
/// are plain `Word`s; the parser gives them meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Left parenthesis `(`.
    LParen,
    /// Right parenthesis `)`.
    RParen,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `=` or `==`.
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `!`
    Bang,
    /// Non-negative integer literal.
    Integer(i64),
    /// Identifier, keyword, or dice word.
    Word(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Eq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::Le => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::Ge => write!(f, ">="),
            Token::Bang => write!(f, "!"),
            Token::Integer(n) => write!(f, "{n}"),
            Token::Word(w) => write!(f, "{w}"),
        }
    }
}

#[derive(Logos, Debug)]
#[logos(skip r"[ \t\r\n]+")]
enum RawToken {
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("%")]
    Percent,

    #[token("=")]
    #[token("==")]
    Eq,

    #[token("!=")]
    NotEq,

    #[token("<")]
    Lt,

    #[token("<=")]
    Le,

    #[token(">")]
    Gt,

    #[token(">=")]
    Ge,

    #[token("!")]
    Bang,

    #[regex(r"[0-9]+")]
    Integer,

    #[regex(r"[^\s0-9()<>=!+\-*/%][^\s()<>=!+\-*/%]*")]
    Word,
}

/// Lex a condition into `(Token, Span)` pairs, stopping at the first error.
pub fn lex(source: &str) -> ExprResult<Vec<(Token, Range<usize>)>> {
    let mut tokens = Vec::new();
    let mut lexer = RawToken::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let token = match result {
            Ok(RawToken::LParen) => Token::LParen,
            Ok(RawToken::RParen) => Token::RParen,
            Ok(RawToken::Plus) => Token::Plus,
            Ok(RawToken::Minus) => Token::Minus,
            Ok(RawToken::Star) => Token::Star,
            Ok(RawToken::Slash) => Token::Slash,
            Ok(RawToken::Percent) => Token::Percent,
            Ok(RawToken::Eq) => Token::Eq,
            Ok(RawToken::NotEq) => Token::NotEq,
            Ok(RawToken::Lt) => Token::Lt,
            Ok(RawToken::Le) => Token::Le,
            Ok(RawToken::Gt) => Token::Gt,
            Ok(RawToken::Ge) => Token::Ge,
            Ok(RawToken::Bang) => Token::Bang,
            Ok(RawToken::Integer) => {
                let n = lexer.slice().parse().map_err(|_| ExprError::Overflow)?;
                Token::Integer(n)
            }
            Ok(RawToken::Word) => Token::Word(lexer.slice().to_string()),
            Err(()) => {
                return Err(ExprError::UnexpectedChar {
                    found: lexer.slice().to_string(),
                    position: span.start,
                });
            }
        };
        tokens.push((token, span));
    }

    Ok(tokens)
}
