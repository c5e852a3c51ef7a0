//! Save-slot persistence.
//!
//! Each player owns one record mapping slot names to full session snapshots.
//! Slot names are UTC timestamps, so the record's ordering is chronological
//! and the first slot is always the oldest.

use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use gb_core::{PlayerId, Session};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current save record version.
pub const SAVE_VERSION: u32 = 1;

/// Format of slot names.
const SLOT_NAME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// All save slots of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRecord {
    /// Save format version for compatibility checking.
    pub version: u32,
    /// Slot name to snapshot, oldest first.
    pub slots: BTreeMap<String, Session>,
}

impl Default for SaveRecord {
    fn default() -> Self {
        Self {
            version: SAVE_VERSION,
            slots: BTreeMap::new(),
        }
    }
}

impl SaveRecord {
    /// Store a snapshot under a name derived from `at`, evicting the oldest
    /// slots beyond `limit`. Returns the slot name used, which is never the
    /// one evicted.
    ///
    /// Saves within the same second get a zero-padded sequence suffix
    /// (`#002`, `#003`, ...) one past the highest already stored for that
    /// second, so names keep sorting chronologically after eviction.
    pub fn insert_slot(&mut self, at: DateTime<Utc>, session: Session, limit: usize) -> String {
        let base = at.format(SLOT_NAME_FORMAT).to_string();
        let mut name = match self.last_sequence(&base) {
            Some(seq) => format!("{base} #{:03}", seq + 1),
            None => base.clone(),
        };
        let mut seq = 2;
        while self.slots.contains_key(&name) {
            name = format!("{base} #{seq:03}");
            seq += 1;
        }

        self.slots.insert(name.clone(), session);
        while self.slots.len() > limit.max(1) {
            let Some(oldest) = self.slots.keys().find(|key| **key != name).cloned() else {
                break;
            };
            self.slots.remove(&oldest);
        }
        name
    }

    /// Highest sequence stored for the second `base`; the bare name counts
    /// as 1.
    fn last_sequence(&self, base: &str) -> Option<u32> {
        self.slots
            .range::<str, _>((std::ops::Bound::Included(base), std::ops::Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(base))
            .map(|(key, _)| {
                key.strip_prefix(base)
                    .and_then(|rest| rest.strip_prefix(" #"))
                    .and_then(|n| n.parse().ok())
                    .unwrap_or(1)
            })
            .max()
    }

    /// Snapshot stored under `name`.
    pub fn slot(&self, name: &str) -> Option<&Session> {
        self.slots.get(name.trim())
    }

    /// Slot names, oldest first.
    pub fn names(&self) -> Vec<String> {
        self.slots.keys().cloned().collect()
    }
}

/// Durable storage for save records, one record per player.
pub trait SlotStorage: Send + Sync {
    /// Read a player's record. A player who never saved has an empty record.
    fn load_record(&self, player: &PlayerId) -> Result<SaveRecord, PersistError>;

    /// Replace a player's record.
    fn store_record(&self, player: &PlayerId, record: &SaveRecord) -> Result<(), PersistError>;
}

/// Stores each player's record as `<dir>/<player>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding a player's record. Bytes outside `[A-Za-z0-9_-]` are
    /// percent-encoded so distinct ids never share a file.
    pub fn path_for(&self, player: &PlayerId) -> PathBuf {
        let mut name = String::new();
        for byte in player.as_str().bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
                name.push(char::from(byte));
            } else {
                name.push_str(&format!("%{byte:02X}"));
            }
        }
        if name.is_empty() {
            name.push('%');
        }
        self.dir.join(format!("{name}.json"))
    }
}

impl SlotStorage for JsonFileStorage {
    fn load_record(&self, player: &PlayerId) -> Result<SaveRecord, PersistError> {
        let json = match std::fs::read_to_string(self.path_for(player)) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(SaveRecord::default()),
            Err(e) => return Err(e.into()),
        };
        let record: SaveRecord = serde_json::from_str(&json)?;
        if record.version > SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: record.version,
            });
        }
        Ok(record)
    }

    fn store_record(&self, player: &PlayerId, record: &SaveRecord) -> Result<(), PersistError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(player);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// Keeps records in memory; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: Mutex<HashMap<PlayerId, SaveRecord>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotStorage for MemoryStorage {
    fn load_record(&self, player: &PlayerId) -> Result<SaveRecord, PersistError> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(player).cloned().unwrap_or_default())
    }

    fn store_record(&self, player: &PlayerId, record: &SaveRecord) -> Result<(), PersistError> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records.insert(player.clone(), record.clone());
        Ok(())
    }
}
