//! Error types for the game runtime.

use gb_engine::EngineError;
use thiserror::Error;

use crate::persist::PersistError;

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors surfaced to the presentation layer.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The chapter table has no start chapter.
    #[error("the chapter table is empty")]
    EmptyTable,

    /// No save slot with this name.
    #[error("no save slot named '{0}'")]
    SlotNotFound(String),

    /// A help-book request while the player is not reading it.
    #[error("the help book is not open")]
    HelpBookClosed,

    /// The interpreter rejected the request.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Save slots could not be read or written.
    #[error("save storage failed: {0}")]
    Persist(#[from] PersistError),
}

impl RuntimeError {
    /// Whether the player's input was rejected without changing state.
    pub fn is_rejected_choice(&self) -> bool {
        matches!(self, RuntimeError::Engine(e) if e.is_rejected_choice())
    }
}
