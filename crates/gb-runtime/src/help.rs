//! A help book browsed beside the game.
//!
//! The help book is an ordinary compiled script. Opening it always starts
//! at its first chapter and closing it forgets the position. It has no save
//! slots, and the player's game session is untouched while reading.

use gb_core::{ChapterTable, PlayerId};
use gb_engine::Render;
use tracing::info;

use crate::config::EngineConfig;
use crate::error::{RuntimeError, RuntimeResult};
use crate::game::Game;
use crate::persist::MemoryStorage;

/// A read-only book with one reading position per player.
pub struct HelpBook {
    book: Game,
}

impl HelpBook {
    /// Create a help book over a compiled chapter table.
    pub fn new(table: ChapterTable, config: EngineConfig) -> RuntimeResult<Self> {
        Ok(Self {
            book: Game::new(table, config, MemoryStorage::new())?,
        })
    }

    pub fn table(&self) -> &ChapterTable {
        self.book.table()
    }

    /// Whether the player is reading the help book.
    pub fn is_open(&self, player: &PlayerId) -> bool {
        self.book.store().contains(player)
    }

    /// Open the book at its first chapter, restarting any earlier reading.
    pub fn open(&self, player: &PlayerId) -> Render {
        info!(%player, "help book opened");
        self.book.start_session(player)
    }

    /// The page the player is reading.
    pub fn current(&self, player: &PlayerId) -> RuntimeResult<Render> {
        self.ensure_open(player)?;
        Ok(self.book.current(player))
    }

    /// Follow one of the page's choices by label.
    pub fn choose(&self, player: &PlayerId, label: &str) -> RuntimeResult<Render> {
        self.ensure_open(player)?;
        self.book.submit_choice(player, label)
    }

    /// Stop reading. Returns whether the book was open.
    pub fn close(&self, player: &PlayerId) -> bool {
        let closed = self.book.end_session(player);
        if closed {
            info!(%player, "help book closed");
        }
        closed
    }

    fn ensure_open(&self, player: &PlayerId) -> RuntimeResult<()> {
        if self.is_open(player) {
            Ok(())
        } else {
            Err(RuntimeError::HelpBookClosed)
        }
    }
}
