//! Error types for the gamebook engine.

use gb_core::ChapterId;
use thiserror::Error;

/// Result type for expression evaluation.
pub type ExprResult<T> = Result<T, ExprError>;

/// Faults raised while parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    /// The expression contains nothing to evaluate.
    #[error("empty expression")]
    Empty,

    /// A character no token starts with.
    #[error("unexpected character {found:?} at {position}")]
    UnexpectedChar {
        /// The offending text.
        found: String,
        /// Byte offset in the expression.
        position: usize,
    },

    /// A token that does not fit the grammar at this point.
    #[error("unexpected `{found}` at {position}")]
    UnexpectedToken {
        /// The offending token.
        found: String,
        /// Byte offset in the expression.
        position: usize,
    },

    /// Parentheses or prefix operators nested deeper than the parser allows.
    #[error("expression nested deeper than {0} levels")]
    TooDeep(usize),

    /// The expression stopped where more input was required.
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    /// A dice roll with fewer than one side.
    #[error("invalid dice: rnd{0}")]
    InvalidDice(i64),

    /// Division or remainder by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// An integer literal or intermediate result out of range.
    #[error("arithmetic overflow")]
    Overflow,
}

/// Result type for interpreter operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors returned to the caller of an interpreter entry point.
///
/// Faults inside a single action are not errors: they are contained and
/// surface as notices in the render.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Player input matches no registered choice label.
    #[error("invalid choice: {0}")]
    InvalidChoice(String),

    /// Navigation target missing from the chapter table.
    #[error("chapter not found: {0}")]
    UnknownChapter(ChapterId),

    /// `return` with an empty navigation history.
    #[error("nothing to return to")]
    NothingToReturnTo,

    /// Item is not in the inventory.
    #[error("item not in inventory: {0}")]
    ItemNotHeld(String),

    /// Item has no use-chapter.
    #[error("item cannot be used: {0}")]
    ItemNotUsable(String),
}

impl EngineError {
    /// Whether the player's selection was rejected without touching state.
    pub fn is_rejected_choice(&self) -> bool {
        matches!(
            self,
            Self::InvalidChoice(_) | Self::UnknownChapter(_) | Self::NothingToReturnTo
        )
    }
}
