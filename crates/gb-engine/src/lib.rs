//! Expression evaluator and action interpreter for gamebook chapters.
//!
//! The [`Interpreter`] walks a chapter's compiled actions against a
//! [`gb_core::Session`], mutating it and collecting outward [`Effect`]s.
//! Assignments and conditions are evaluated by the [`expr`] module, a small
//! dedicated grammar over attributes, inventory and dice rolls.

/// Dice rolls.
pub mod dice;
/// Outward effects of a render.
pub mod effect;
/// Error types for the engine.
pub mod error;
/// Expression and condition evaluation.
pub mod expr;
/// Chapter execution.
pub mod interpreter;
/// Attribute placeholder substitution.
pub mod text;

pub use effect::{Effect, Notice, Render};
pub use error::{EngineError, EngineResult, ExprError, ExprResult};
pub use expr::Scope;
pub use interpreter::{DEFAULT_MAX_DEPTH, Interpreter, InterpreterConfig};
