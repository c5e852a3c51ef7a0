//! Condition parser built with chumsky over the logos token stream.
//!
//! Precedence, lowest first: `or`, `and`, `not`, comparison, `+ -`,
//! `* / %`, unary sign, atom.

use std::ops::Range;

use chumsky::input::{Stream, ValueInput};
use chumsky::pratt::{infix, left, prefix};
use chumsky::prelude::*;

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::lexer::{Token, lex};
use crate::dice;
use crate::error::{ExprError, ExprResult};

type Span = SimpleSpan;

/// Deepest operator or parenthesis nesting a condition may have.
pub const MAX_NESTING: usize = 64;

/// Parse a condition into an expression tree.
pub fn parse(source: &str) -> ExprResult<Expr> {
    let tokens = lex(source)?;
    if tokens.is_empty() {
        return Err(ExprError::Empty);
    }
    check_nesting(&tokens)?;
    check_dice(&tokens)?;

    let len = source.len();
    let eoi: Span = (len..len).into();
    let token_iter = tokens
        .into_iter()
        .map(|(tok, span)| (tok, Span::from(span)));
    let stream = Stream::from_iter(token_iter).map(eoi, |(t, s): (_, _)| (t, s));

    condition()
        .then_ignore(end())
        .parse(stream)
        .into_result()
        .map_err(|errors| {
            errors
                .into_iter()
                .next()
                .map_or(ExprError::UnexpectedEnd, to_expr_error)
        })
}

fn to_expr_error(error: Rich<'_, Token>) -> ExprError {
    match error.found() {
        Some(token) => ExprError::UnexpectedToken {
            found: token.to_string(),
            position: error.span().start,
        },
        None => ExprError::UnexpectedEnd,
    }
}

/// Upper bound on the tree depth, computed before parsing so that a
/// pathological line is rejected instead of exhausting the stack.
///
/// Each open group counts its operators plus the deepest group closed
/// inside it; `(` opens a group and `)` folds it into its parent.
fn check_nesting(tokens: &[(Token, Range<usize>)]) -> ExprResult<()> {
    let mut groups: Vec<(usize, usize)> = vec![(0, 0)];

    for (token, _) in tokens {
        match token {
            Token::LParen => groups.push((0, 0)),
            Token::RParen => {
                if groups.len() > 1 {
                    let (ops, deepest) = groups.pop().unwrap_or_default();
                    if let Some(parent) = groups.last_mut() {
                        parent.1 = parent.1.max(ops + deepest + 1);
                    }
                }
            }
            Token::Integer(_) => {}
            Token::Word(word) if !is_operator_word(word) => {}
            _ => {
                if let Some(group) = groups.last_mut() {
                    group.0 += 1;
                }
            }
        }

        let depth = groups.len() - 1 + groups.iter().map(|(ops, deepest)| ops + deepest).sum::<usize>();
        if depth > MAX_NESTING {
            return Err(ExprError::TooDeep(MAX_NESTING));
        }
    }
    Ok(())
}

/// Reject dice words whose side count does not fit an integer.
fn check_dice(tokens: &[(Token, Range<usize>)]) -> ExprResult<()> {
    for (token, _) in tokens {
        if let Token::Word(word) = token {
            dice::parse_dice(word).transpose()?;
        }
    }
    Ok(())
}

/// Words that end a multi-word identifier.
fn is_operator_word(word: &str) -> bool {
    ["and", "or", "not"]
        .iter()
        .any(|kw| word.eq_ignore_ascii_case(kw))
}

fn keyword<'a, I>(word: &'static str) -> impl Parser<'a, I, (), extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = Span>,
{
    select! {
        Token::Word(ref w) if w.eq_ignore_ascii_case(word) => ()
    }
    .labelled(word)
}

fn condition<'a, I>() -> impl Parser<'a, I, Expr, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = Span>,
{
    recursive(|expr| {
        let integer = select! { Token::Integer(n) => Expr::Int(n) }.labelled("integer");

        let name = select! {
            Token::Word(ref w) if !is_operator_word(w) => w.clone()
        }
        .repeated()
        .at_least(1)
        .collect::<Vec<String>>()
        .map(words_to_expr)
        .labelled("identifier");

        let group = expr.delimited_by(just(Token::LParen), just(Token::RParen));

        let atom = choice((integer, name, group));

        let comparison = select! {
            Token::Eq => BinaryOp::Eq,
            Token::NotEq => BinaryOp::NotEq,
            Token::Lt => BinaryOp::Lt,
            Token::Le => BinaryOp::Le,
            Token::Gt => BinaryOp::Gt,
            Token::Ge => BinaryOp::Ge,
        };
        let additive = select! {
            Token::Plus => BinaryOp::Add,
            Token::Minus => BinaryOp::Sub,
        };
        let multiplicative = select! {
            Token::Star => BinaryOp::Mul,
            Token::Slash => BinaryOp::Div,
            Token::Percent => BinaryOp::Rem,
        };
        let negation = keyword("not").or(just(Token::Bang).ignored());

        atom.pratt((
            infix(left(1), keyword("or").to(BinaryOp::Or), |l, op, r, _| binary(op, l, r)),
            infix(left(2), keyword("and").to(BinaryOp::And), |l, op, r, _| binary(op, l, r)),
            prefix(3, negation, |_, rhs, _| Expr::Unary(UnaryOp::Not, Box::new(rhs))),
            infix(left(4), comparison, |l, op, r, _| binary(op, l, r)),
            infix(left(5), additive, |l, op, r, _| binary(op, l, r)),
            infix(left(6), multiplicative, |l, op, r, _| binary(op, l, r)),
            prefix(7, just(Token::Minus), |_, rhs, _| Expr::Unary(UnaryOp::Neg, Box::new(rhs))),
            prefix(7, just(Token::Plus), |_, rhs, _| rhs),
        ))
    })
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary(op, Box::new(lhs), Box::new(rhs))
}

/// A run of words: a keyword, a dice roll, or an attribute/item name.
fn words_to_expr(words: Vec<String>) -> Expr {
    if let [word] = words.as_slice() {
        if word.eq_ignore_ascii_case("true") {
            return Expr::Bool(true);
        }
        if word.eq_ignore_ascii_case("false") {
            return Expr::Bool(false);
        }
        if let Some(Ok(sides)) = dice::parse_dice(word) {
            return Expr::Dice(sides);
        }
    }
    Expr::Ident(words.join(" ").to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(source: &str) -> String {
        parse(source).unwrap().to_string()
    }

    #[test]
    fn precedence() {
        assert_eq!(shape("1 + 2 * 3"), "(1 + (2 * 3))");
        assert_eq!(shape("a or b and c"), "(a or (b and c))");
        assert_eq!(shape("not a = 1"), "(not (a == 1))");
        assert_eq!(shape("-2 * 3"), "((-2) * 3)");
        assert_eq!(shape("(1 + 2) * 3"), "((1 + 2) * 3)");
    }

    #[test]
    fn comparison_binds_tighter_than_logic() {
        assert_eq!(
            shape("str >= 10 and dex < 5"),
            "((str >= 10) and (dex < 5))"
        );
    }

    #[test]
    fn subtraction_is_left_associative() {
        assert_eq!(shape("10 - 3 - 2"), "((10 - 3) - 2)");
    }

    #[test]
    fn multi_word_identifiers() {
        assert_eq!(
            parse("magic key and old map").unwrap(),
            Expr::Binary(
                BinaryOp::And,
                Box::new(Expr::Ident("magic key".to_string())),
                Box::new(Expr::Ident("old map".to_string())),
            )
        );
    }

    #[test]
    fn keywords_and_dice() {
        assert_eq!(parse("TRUE").unwrap(), Expr::Bool(true));
        assert_eq!(parse("RND6").unwrap(), Expr::Dice(6));
        assert_eq!(parse("rnd").unwrap(), Expr::Ident("rnd".to_string()));
        assert_eq!(
            parse("!lamp").unwrap(),
            Expr::Unary(UnaryOp::Not, Box::new(Expr::Ident("lamp".to_string())))
        );
        assert_eq!(
            parse("rnd99999999999999999999 > 1"),
            Err(ExprError::Overflow)
        );
    }

    #[test]
    fn errors() {
        assert_eq!(parse(""), Err(ExprError::Empty));
        assert_eq!(parse("1 +"), Err(ExprError::UnexpectedEnd));
        assert_eq!(parse("(1"), Err(ExprError::UnexpectedEnd));
        assert!(matches!(
            parse("1 2"),
            Err(ExprError::UnexpectedToken { position: 2, .. })
        ));
        assert!(matches!(parse("and"), Err(ExprError::UnexpectedToken { .. })));
    }

    #[test]
    fn moderate_nesting_is_accepted() {
        let source = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        assert_eq!(parse(&source).unwrap(), Expr::Int(1));
        assert!(parse("not not not (a and (b or -(-c)))").is_ok());
    }

    #[test]
    fn runaway_nesting_is_rejected() {
        let parens = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
        assert_eq!(parse(&parens), Err(ExprError::TooDeep(MAX_NESTING)));

        let negations = format!("{}lamp", "not ".repeat(10_000));
        assert_eq!(parse(&negations), Err(ExprError::TooDeep(MAX_NESTING)));

        let signs = format!("{}1", "- ".repeat(10_000));
        assert_eq!(parse(&signs), Err(ExprError::TooDeep(MAX_NESTING)));

        let chain = vec!["1"; 10_000].join(" + ");
        assert_eq!(parse(&chain), Err(ExprError::TooDeep(MAX_NESTING)));
    }
}
