//! In-memory TTL cache for remote lookups.
//!
//! Entries expire lazily: an expired entry is dropped on the next access to
//! its key. Values are cloned out so callers never hold references into the
//! map.

use std::collections::HashMap;
use std::time::{Duration, Instant};

pub struct TtlCache<V> {
    ttl: Duration,
    entries: HashMap<String, (V, Instant)>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn with_ttl_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    pub fn get(&mut self, key: &str) -> Option<V> {
        match self.entries.get(key) {
            Some((value, stored)) if stored.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&mut self, key: impl Into<String>, value: V) {
        self.entries.insert(key.into(), (value, Instant::now()));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries, including any not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
