//! Configuration for a game runtime.

use std::path::PathBuf;

use gb_core::DEFAULT_USE_PREFIX;
use gb_engine::{DEFAULT_MAX_DEPTH, InterpreterConfig};

/// Default navigation history capacity.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;
/// Default number of save slots kept per player.
pub const DEFAULT_SAVE_LIMIT: usize = 5;

/// Configuration for a [`Game`](crate::Game).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Capacity of each session's `return` history.
    pub history_limit: usize,
    /// Save slots kept per player; the oldest is evicted past this.
    pub save_limit: usize,
    /// Bound on nesting and chained navigation within one render.
    pub max_depth: usize,
    /// Chapter id prefix of item use-chapters.
    pub use_prefix: String,
    /// Directory images are resolved against, if asset checks are wanted.
    pub asset_root: Option<PathBuf>,
    /// RNG seed for reproducible dice. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            save_limit: DEFAULT_SAVE_LIMIT,
            max_depth: DEFAULT_MAX_DEPTH,
            use_prefix: DEFAULT_USE_PREFIX.to_string(),
            asset_root: None,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Set the navigation history capacity.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Set the number of save slots (at least 1).
    pub fn with_save_limit(mut self, limit: usize) -> Self {
        self.save_limit = limit.max(1);
        self
    }

    /// Set the depth bound for nested actions and chained navigation.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the use-chapter prefix.
    pub fn with_use_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.use_prefix = prefix.into().to_lowercase();
        self
    }

    /// Check image references against files under `root`.
    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = Some(root.into());
        self
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// The interpreter settings derived from this configuration.
    pub fn interpreter(&self) -> InterpreterConfig {
        let config = InterpreterConfig::default()
            .with_max_depth(self.max_depth)
            .with_use_prefix(self.use_prefix.clone());
        match &self.asset_root {
            Some(root) => config.with_asset_root(root.clone()),
            None => config,
        }
    }
}
