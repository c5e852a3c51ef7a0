//! Core types for the gamebook engine: chapters, actions, and session state.
//!
//! This crate defines the data model that scripts compile into and that the
//! interpreter executes against. It is independent of the script syntax: a
//! [`ChapterTable`] can be built programmatically or deserialized from JSON.

/// Compiled instructions and their payloads.
pub mod action;
/// Chapter identifiers, navigation targets, and the chapter table.
pub mod chapter;
/// Per-player mutable progress.
pub mod session;

/// Re-export action types.
pub use action::{Action, CurrencyOp, InventoryOp};
/// Re-export chapter types.
pub use chapter::{ChapterId, ChapterTable, DEFAULT_USE_PREFIX, Target};
/// Re-export session types.
pub use session::{Attribute, History, Item, PendingChoice, PlayerId, Session};
