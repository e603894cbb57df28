//! Session-scoped key-value storage.
//!
//! The console persists a handful of string values (session token, serialized
//! identity, UI preferences) that survive only for the lifetime of one
//! session. There is no schema versioning: callers treat an unreadable value
//! the same as a missing one.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Well-known keys.
pub mod keys {
    /// Opaque session token; its presence alone means "authenticated".
    pub const AUTH_TOKEN: &str = "auth_token";
    /// JSON-serialized current identity.
    pub const CURRENT_USER: &str = "current_user";
    /// `"light"` or `"dark"`.
    pub const THEME: &str = "theme";
    /// Destination to resume after a successful login.
    pub const RETURN_URL: &str = "returnUrl";
}

/// String key-value store abstraction.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str);

    /// Read and remove `key` in one call.
    fn take(&self, key: &str) -> Option<String> {
        let value = self.get(key);
        if value.is_some() {
            self.remove(key);
        }
        value
    }
}

impl<S> KeyValueStore for Arc<S>
where
    S: KeyValueStore + ?Sized,
{
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key)
    }
}

/// In-memory store (one per session / per test).
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    inner: RwLock<HashMap<String, String>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the store, e.g. to simulate a session left behind by a
    /// previous page load.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            inner: RwLock::new(map),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.remove(key);
    }
}
