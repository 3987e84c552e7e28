//! Shared key-value store used as a cache backend.

use crate::{Error, Result};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};

/// KeyValueStore is a string-keyed store shared by every request handled by
/// the process, such as an in-memory zone or an external cache.
///
/// Reads never fail: an unreachable or empty store behaves like a missing key.
pub trait KeyValueStore: Debug + Send + Sync + 'static {
    /// Get the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: String) -> Result<()>;
}

/// MemoryStore keeps values in a process-wide map.
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create a new empty `MemoryStore`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.read().expect("lock poisoned").get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        self.inner
            .write()
            .expect("lock poisoned")
            .insert(key.to_string(), value);
        Ok(())
    }
}

/// NoopKeyValueStore holds nothing and rejects writes.
///
/// This is used when no store is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopKeyValueStore;

impl KeyValueStore for NoopKeyValueStore {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: String) -> Result<()> {
        Err(Error::unexpected(
            "key-value store not supported: no store configured",
        ))
    }
}
