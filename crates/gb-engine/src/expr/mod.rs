//! Expression and condition evaluation.
//!
//! Two grammars share the same identifier lookup:
//!
//! - value expressions (`assign`) are sums of integers, dice and attributes,
//!   see [`evaluate_sum`];
//! - conditions (`if`) are parsed into an [`Expr`] tree with arithmetic,
//!   comparison and `and`/`or`/`not`, see [`evaluate_condition`].

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod sum;

use gb_core::Session;
use rand::Rng;

use crate::error::ExprResult;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use eval::{Value, evaluate};
pub use parser::parse;
pub use sum::evaluate_sum;

/// Read-only view of session state that identifiers resolve against.
pub trait Scope {
    /// Current value of an attribute, if it was ever assigned.
    fn attribute(&self, key: &str) -> Option<i64>;

    /// Whether the named item is in the inventory.
    fn has_item(&self, name: &str) -> bool;
}

impl Scope for Session {
    fn attribute(&self, key: &str) -> Option<i64> {
        Session::attribute(self, key)
    }

    fn has_item(&self, name: &str) -> bool {
        Session::has_item(self, name)
    }
}

/// Parse and evaluate a condition to a boolean.
pub fn evaluate_condition<S, R>(source: &str, scope: &S, rng: &mut R) -> ExprResult<bool>
where
    S: Scope + ?Sized,
    R: Rng + ?Sized,
{
    let expr = parse(source)?;
    Ok(evaluate(&expr, scope, rng)?.truthy())
}
