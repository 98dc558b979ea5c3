//! Recent and favorite codes.
//!
//! Both lists are small, bounded, deduplicated and ordered most recent first.
//! They are restored from the key-value store when the history is created and
//! written back wholesale after every change. Write failures are logged and
//! dropped: losing recents is an inconvenience, not an error.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::NavigatorConfig;
use crate::storage::KeyValueStore;

/// Storage key for recent selections.
pub const RECENT_KEY: &str = "recent-codes";
/// Storage key for favorites.
pub const FAVORITE_KEY: &str = "favorite-codes";

/// Bounded, deduplicated, most-recent-first list of codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSet {
    codes: Vec<String>,
    capacity: usize,
}

impl CodeSet {
    /// Empty set holding at most `capacity` codes (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            codes: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Build from stored codes: first occurrence wins, excess is dropped.
    pub fn from_codes<I, S>(capacity: usize, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new(capacity);
        for code in codes {
            if set.codes.len() == set.capacity {
                break;
            }
            let code = code.into();
            if !set.contains(&code) {
                set.codes.push(code);
            }
        }
        set
    }

    /// Move `code` to the front, inserting it if absent and evicting the
    /// oldest entry when full. Returns true if the list changed.
    pub fn touch(&mut self, code: &str) -> bool {
        if self.codes.first().is_some_and(|first| first == code) {
            return false;
        }
        if let Some(pos) = self.codes.iter().position(|c| c == code) {
            let existing = self.codes.remove(pos);
            self.codes.insert(0, existing);
        } else {
            self.codes.insert(0, code.to_string());
            self.codes.truncate(self.capacity);
        }
        true
    }

    pub fn remove(&mut self, code: &str) -> bool {
        let before = self.codes.len();
        self.codes.retain(|c| c != code);
        self.codes.len() != before
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.iter().any(|c| c == code)
    }

    pub fn clear(&mut self) {
        self.codes.clear();
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Persisted recents and favorites for one user session.
pub struct SelectionHistory {
    storage: Arc<dyn KeyValueStore>,
    recent: CodeSet,
    favorites: CodeSet,
}

impl SelectionHistory {
    /// Restore both lists from `storage`.
    pub fn load(storage: Arc<dyn KeyValueStore>, config: &NavigatorConfig) -> Self {
        let recent = read_set(storage.as_ref(), RECENT_KEY, config.recent_capacity);
        let favorites = read_set(storage.as_ref(), FAVORITE_KEY, config.favorite_capacity);
        debug!(
            recent = recent.len(),
            favorites = favorites.len(),
            "restored selection history"
        );
        Self {
            storage,
            recent,
            favorites,
        }
    }

    /// Record a committed selection.
    pub fn record_recent(&mut self, code: &str) {
        if self.recent.touch(code) {
            write_set(self.storage.as_ref(), RECENT_KEY, &self.recent);
        }
    }

    /// Add `code` to favorites, or remove it if already there.
    ///
    /// Returns whether `code` is a favorite afterwards.
    pub fn toggle_favorite(&mut self, code: &str) -> bool {
        let now_favorite = if self.favorites.remove(code) {
            false
        } else {
            self.favorites.touch(code);
            true
        };
        write_set(self.storage.as_ref(), FAVORITE_KEY, &self.favorites);
        now_favorite
    }

    pub fn is_favorite(&self, code: &str) -> bool {
        self.favorites.contains(code)
    }

    pub fn clear_recent(&mut self) {
        if !self.recent.is_empty() {
            self.recent.clear();
            write_set(self.storage.as_ref(), RECENT_KEY, &self.recent);
        }
    }

    pub fn recent(&self) -> &[String] {
        self.recent.codes()
    }

    pub fn favorites(&self) -> &[String] {
        self.favorites.codes()
    }
}

fn read_set(storage: &dyn KeyValueStore, key: &str, capacity: usize) -> CodeSet {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return CodeSet::new(capacity),
        Err(e) => {
            warn!("Failed to read {}: {}, starting empty", key, e);
            return CodeSet::new(capacity);
        }
    };
    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(codes) => CodeSet::from_codes(capacity, codes),
        Err(e) => {
            warn!("Ignoring corrupt {} value: {}", key, e);
            CodeSet::new(capacity)
        }
    }
}

fn write_set(storage: &dyn KeyValueStore, key: &str, set: &CodeSet) {
    let value = match serde_json::to_string(set.codes()) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to serialize {}: {}", key, e);
            return;
        }
    };
    if let Err(e) = storage.set(key, &value) {
        warn!("Failed to save {}: {}", key, e);
    }
}
