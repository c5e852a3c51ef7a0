//! Multi-player runtime for compiled gamebooks.
//!
//! A [`Game`] owns the immutable chapter table and a [`store::SessionStore`]
//! of live sessions, one per player. Save slots go through a
//! [`persist::SlotStorage`] backend, either JSON files on disk or memory.
//! A [`HelpBook`] is a second compiled book browsed beside the game.

pub mod config;
pub mod error;
pub mod game;
pub mod help;
pub mod persist;
pub mod store;
pub mod view;

pub use config::{DEFAULT_HISTORY_LIMIT, DEFAULT_SAVE_LIMIT, EngineConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use game::Game;
pub use help::HelpBook;
pub use persist::{JsonFileStorage, MemoryStorage, PersistError, SaveRecord, SlotStorage};
pub use store::SessionStore;
pub use view::{AttributesView, InventoryView};
