//! Persistence for the device identity.

use std::collections::HashMap;

/// Key under which the assigned device identity is stored.
pub const IDENTITY_KEY: &str = "device-id";

/// Small key-value persistence for the device identity.
///
/// Implementations absorb their own failures; a storage error reads as an
/// absent value and an incomplete write as a short count, which the client
/// treats the same as a fresh device.
pub trait IdentityStore {
    /// True when `key` holds a value.
    fn has(&self, key: &str) -> bool {
        self.get(key, usize::MAX).is_some()
    }

    /// Read the value at `key`, truncated to `max_len` bytes.
    fn get(&self, key: &str, max_len: usize) -> Option<Vec<u8>>;

    /// Write `value` at `key`, returning how many bytes were persisted.
    fn put(&mut self, key: &str, value: &[u8]) -> usize;

    /// Drop the value at `key`, if any.
    fn remove(&mut self, key: &str);
}

/// In-memory store. Devices persist to flash; tests and the bench runner
/// lose nothing by forgetting on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl IdentityStore for MemoryStore {
    fn get(&self, key: &str, max_len: usize) -> Option<Vec<u8>> {
        self.entries
            .get(key)
            .map(|value| value[..value.len().min(max_len)].to_vec())
    }

    fn put(&mut self, key: &str, value: &[u8]) -> usize {
        self.entries.insert(key.to_string(), value.to_vec());
        value.len()
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}
