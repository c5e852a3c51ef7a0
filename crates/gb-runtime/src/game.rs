//! The game facade used by presentation layers.

use std::time::Duration;

use chrono::Utc;
use gb_core::{ChapterTable, PlayerId, Session};
use gb_engine::{Interpreter, InterpreterConfig, Render};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::{RuntimeError, RuntimeResult};
use crate::persist::SlotStorage;
use crate::store::SessionStore;
use crate::view::{AttributesView, InventoryView};

/// A compiled gamebook serving any number of players.
///
/// Every operation takes the player's id; the first contact creates a
/// session at the start chapter.
pub struct Game {
    table: ChapterTable,
    config: EngineConfig,
    interpreter: InterpreterConfig,
    store: SessionStore,
    storage: Box<dyn SlotStorage>,
}

impl Game {
    /// Create a game over a compiled chapter table.
    pub fn new(
        table: ChapterTable,
        config: EngineConfig,
        storage: impl SlotStorage + 'static,
    ) -> RuntimeResult<Self> {
        let start = table.start().cloned().ok_or(RuntimeError::EmptyTable)?;
        let store = SessionStore::new(start, config.history_limit, config.seed);
        Ok(Self {
            interpreter: config.interpreter(),
            table,
            config,
            store,
            storage: Box::new(storage),
        })
    }

    pub fn table(&self) -> &ChapterTable {
        &self.table
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Live sessions.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    fn engine(&self) -> Interpreter<'_> {
        Interpreter::new(&self.table, &self.interpreter)
    }

    /// Reset the player to the start chapter and render it.
    pub fn start_session(&self, player: &PlayerId) -> Render {
        let (handle, _) = self.store.get(player);
        let mut state = handle.lock();
        state.session = self.store.fresh_session();
        debug!(%player, "session started");
        let state = &mut *state;
        self.engine().render_chapter(&mut state.session, &mut state.rng)
    }

    /// Forget the player's live session. Save slots are kept. Returns
    /// whether a session existed.
    pub fn end_session(&self, player: &PlayerId) -> bool {
        let ended = self.store.remove(player);
        if ended {
            debug!(%player, "session ended");
        }
        ended
    }

    /// What the player currently sees. A new player gets the start chapter
    /// rendered; an existing one gets the current choices without
    /// re-running the chapter.
    pub fn current(&self, player: &PlayerId) -> Render {
        let (handle, created) = self.store.get(player);
        let mut state = handle.lock();
        let state = &mut *state;
        if created {
            self.engine().render_chapter(&mut state.session, &mut state.rng)
        } else {
            resume_view(&state.session)
        }
    }

    /// Select one of the current choices by label.
    pub fn submit_choice(&self, player: &PlayerId, label: &str) -> RuntimeResult<Render> {
        let (handle, _) = self.store.get(player);
        let mut state = handle.lock();
        let state = &mut *state;
        Ok(self
            .engine()
            .submit_choice(&mut state.session, label, &mut state.rng)?)
    }

    /// Go to the use-chapter of a held item.
    pub fn use_item(&self, player: &PlayerId, item: &str) -> RuntimeResult<Render> {
        let (handle, _) = self.store.get(player);
        let mut state = handle.lock();
        let state = &mut *state;
        Ok(self
            .engine()
            .use_item(&mut state.session, item, &mut state.rng)?)
    }

    /// Snapshot the live session into a new slot. Returns the slot name.
    pub fn request_save(&self, player: &PlayerId) -> RuntimeResult<String> {
        let (handle, _) = self.store.get(player);
        let state = handle.lock();
        let mut record = self.storage.load_record(player)?;
        let name = record.insert_slot(Utc::now(), state.session.clone(), self.config.save_limit);
        self.storage.store_record(player, &record)?;
        info!(%player, slot = %name, "game saved");
        Ok(name)
    }

    /// Replace the live session with a saved snapshot.
    pub fn request_load(&self, player: &PlayerId, slot: &str) -> RuntimeResult<Render> {
        let (handle, _) = self.store.get(player);
        let mut state = handle.lock();
        let record = self.storage.load_record(player)?;
        let snapshot = record
            .slot(slot)
            .cloned()
            .ok_or_else(|| RuntimeError::SlotNotFound(slot.trim().to_string()))?;
        state.session = snapshot;
        info!(%player, slot = slot.trim(), chapter = %state.session.chapter, "game loaded");
        Ok(resume_view(&state.session))
    }

    /// Names of the player's save slots, oldest first.
    pub fn list_saves(&self, player: &PlayerId) -> RuntimeResult<Vec<String>> {
        Ok(self.storage.load_record(player)?.names())
    }

    /// Held items and currency. Usable items get a `Use <item>` choice.
    pub fn view_inventory(&self, player: &PlayerId) -> InventoryView {
        let (handle, _) = self.store.get(player);
        let mut state = handle.lock();
        let use_choices = self.engine().offer_item_uses(&mut state.session);
        InventoryView::of(&state.session, use_choices)
    }

    /// Attributes and currency.
    pub fn view_attributes(&self, player: &PlayerId) -> AttributesView {
        let (handle, _) = self.store.get(player);
        let state = handle.lock();
        AttributesView::of(&state.session)
    }

    /// Drop sessions idle for longer than `max_idle`.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let evicted = self.store.evict_idle(max_idle);
        if evicted > 0 {
            info!(evicted, "idle sessions dropped");
        }
        evicted
    }
}

fn resume_view(session: &Session) -> Render {
    Render {
        chapter: session.chapter.clone(),
        effects: Vec::new(),
        choices: session.choice_labels(),
    }
}
