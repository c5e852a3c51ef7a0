//! In-process store of live sessions.
//!
//! Each player has exactly one live [`Session`], guarded by its own mutex so
//! that events for one player are handled one at a time while different
//! players proceed independently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::{Duration, Instant};

use gb_core::{ChapterId, PlayerId, Session};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// A player's live session and dice source.
#[derive(Debug)]
pub struct PlayerState {
    pub session: Session,
    pub rng: StdRng,
}

/// Shared handle to one player's state.
#[derive(Debug)]
pub struct PlayerHandle {
    state: Mutex<PlayerState>,
    touched: Mutex<Instant>,
}

impl PlayerHandle {
    fn new(state: PlayerState) -> Self {
        Self {
            state: Mutex::new(state),
            touched: Mutex::new(Instant::now()),
        }
    }

    /// Lock the player's state for one event, marking it as recently used.
    pub fn lock(&self) -> MutexGuard<'_, PlayerState> {
        *self.touched.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn idle_for(&self) -> Duration {
        self.touched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }
}

/// Live sessions by player id.
#[derive(Debug)]
pub struct SessionStore {
    players: RwLock<HashMap<PlayerId, Arc<PlayerHandle>>>,
    start: ChapterId,
    history_limit: usize,
    seed: Option<u64>,
}

impl SessionStore {
    /// Create an empty store whose sessions begin at `start`.
    pub fn new(start: ChapterId, history_limit: usize, seed: Option<u64>) -> Self {
        Self {
            players: RwLock::new(HashMap::new()),
            start,
            history_limit,
            seed,
        }
    }

    /// The player's handle, creating a fresh session on first contact.
    /// The flag is `true` when the session was just created.
    pub fn get(&self, player: &PlayerId) -> (Arc<PlayerHandle>, bool) {
        {
            let players = self.players.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(handle) = players.get(player) {
                return (Arc::clone(handle), false);
            }
        }

        let mut players = self.players.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = players.get(player) {
            return (Arc::clone(handle), false);
        }
        let handle = Arc::new(PlayerHandle::new(self.fresh_state(player)));
        players.insert(player.clone(), Arc::clone(&handle));
        (handle, true)
    }

    /// A brand-new session positioned at the start chapter.
    pub fn fresh_session(&self) -> Session {
        Session::new(self.start.clone(), self.history_limit)
    }

    /// Drop sessions unused for longer than `max_idle`. Returns how many
    /// were dropped. A handle still held by a caller is kept, so an event in
    /// progress never loses its session.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut players = self.players.write().unwrap_or_else(PoisonError::into_inner);
        let before = players.len();
        players.retain(|_, handle| Arc::strong_count(handle) > 1 || handle.idle_for() <= max_idle);
        before - players.len()
    }

    /// Drop a player's live session. Returns whether one existed.
    pub fn remove(&self, player: &PlayerId) -> bool {
        self.players
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(player)
            .is_some()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.players
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the player has a live session.
    pub fn contains(&self, player: &PlayerId) -> bool {
        self.players
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(player)
    }

    fn fresh_state(&self, player: &PlayerId) -> PlayerState {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ player_hash(player)),
            None => StdRng::from_os_rng(),
        };
        PlayerState {
            session: self.fresh_session(),
            rng,
        }
    }
}

/// FNV-1a over the player id, stable across runs and platforms.
fn player_hash(player: &PlayerId) -> u64 {
    player
        .as_str()
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn store(seed: Option<u64>) -> SessionStore {
        SessionStore::new(ChapterId::new("start"), 10, seed)
    }

    #[test]
    fn get_creates_once() {
        let store = store(None);
        let player = PlayerId::from("p1");
        let (first, created) = store.get(&player);
        assert!(created);
        let (second, created) = store.get(&player);
        assert!(!created);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn handles_share_one_session() {
        let store = store(None);
        let player = PlayerId::from("p1");
        let (a, _) = store.get(&player);
        a.lock().session.currency = 7;
        let (b, _) = store.get(&player);
        assert_eq!(b.lock().session.currency, 7);
    }

    #[test]
    fn players_are_isolated() {
        let store = store(None);
        let (a, _) = store.get(&PlayerId::from("a"));
        let (b, _) = store.get(&PlayerId::from("b"));
        a.lock().session.add_item("lamp", false);
        assert!(!b.lock().session.has_item("lamp"));
    }

    #[test]
    fn seeded_rng_is_reproducible_per_player() {
        let roll = |player: &str| {
            let store = store(Some(9));
            let (handle, _) = store.get(&PlayerId::from(player));
            let mut state = handle.lock();
            (0..8).map(|_| state.rng.random_range(1..=6)).collect::<Vec<i64>>()
        };
        assert_eq!(roll("x"), roll("x"));
    }

    #[test]
    fn evict_idle_drops_stale_sessions() {
        let store = store(None);
        store.get(&PlayerId::from("a"));
        std::thread::sleep(Duration::from_millis(20));
        store.get(&PlayerId::from("b")).0.lock();
        assert_eq!(store.evict_idle(Duration::from_millis(10)), 1);
        assert!(!store.contains(&PlayerId::from("a")));
        assert!(store.contains(&PlayerId::from("b")));
    }

    #[test]
    fn evict_idle_keeps_handles_in_use() {
        let store = store(None);
        let player = PlayerId::from("a");
        let (held, _) = store.get(&player);
        std::thread::sleep(Duration::from_millis(20));

        assert_eq!(store.evict_idle(Duration::from_millis(10)), 0);
        held.lock().session.currency = 3;
        let (again, created) = store.get(&player);
        assert!(!created);
        assert_eq!(again.lock().session.currency, 3);

        drop((held, again));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(store.evict_idle(Duration::from_millis(10)), 1);
    }

    #[test]
    fn remove_forgets_session() {
        let store = store(None);
        let player = PlayerId::from("a");
        store.get(&player).0.lock().session.currency = 4;
        assert!(store.remove(&player));
        assert!(!store.remove(&player));
        let (handle, created) = store.get(&player);
        assert!(created);
        assert_eq!(handle.lock().session.currency, 0);
    }

    #[test]
    fn player_hash_is_stable() {
        assert_eq!(player_hash(&PlayerId::from("")), 0xcbf2_9ce4_8422_2325);
        assert_ne!(
            player_hash(&PlayerId::from("a")),
            player_hash(&PlayerId::from("b"))
        );
    }
}
