//! Persistence
//!
//! Every write is best effort: failures are logged and reads of a broken key
//! behave as if nothing was stored.

use std::collections::HashMap;

use crate::{StateDelta, ViewState};

const STATE_KEY: &str = "state";
const TAB_NAV_KEY: &str = "tabnav-visible";
const ICON_OFFSET_KEY: &str = "settings-icon-offset";
const INTRO_KEY: &str = "intro-seen";
const ADAPTATION_KEY: &str = "adaptation";

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage unavailable")]
    Unavailable,

    #[error("quota exceeded writing {0}")]
    QuotaExceeded(String),

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Key/value store (localStorage in a browser)
pub trait StorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-memory backend with an optional byte quota
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes once keys plus values exceed `bytes`
    pub fn with_quota(bytes: usize) -> Self {
        Self { items: HashMap::new(), quota: Some(bytes) }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn used_without(&self, key: &str) -> usize {
        self.items
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl StorageBackend for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            if self.used_without(key) + key.len() + value.len() > quota {
                return Err(StorageError::QuotaExceeded(key.to_string()));
            }
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.items.remove(key);
        Ok(())
    }
}

/// Typed, prefixed access to the persisted keys
#[derive(Debug, Clone)]
pub struct PersistentStore<B> {
    backend: B,
    prefix: String,
}

impl<B: StorageBackend> PersistentStore<B> {
    pub fn new(backend: B, prefix: &str) -> Self {
        Self { backend, prefix: prefix.to_string() }
    }

    /// Full key for a suffix
    pub fn key(&self, suffix: &str) -> String {
        format!("{}-{}", self.prefix, suffix)
    }

    fn read(&self, suffix: &str) -> Option<String> {
        let key = self.key(suffix);
        match self.backend.get(&key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", key, e);
                None
            }
        }
    }

    fn write(&mut self, suffix: &str, value: &str) -> bool {
        let key = self.key(suffix);
        match self.backend.set(&key, value) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to persist {}: {}", key, e);
                false
            }
        }
    }

    fn delete(&mut self, suffix: &str) {
        let key = self.key(suffix);
        if let Err(e) = self.backend.remove(&key) {
            tracing::warn!("Failed to remove {}: {}", key, e);
        }
    }

    /// Stored view state, parsed as a sparse delta
    pub fn load_state(&self) -> Option<StateDelta> {
        let raw = self.read(STATE_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(delta) => Some(delta),
            Err(e) => {
                tracing::warn!("Discarding unreadable stored state: {}", e);
                None
            }
        }
    }

    pub fn save_state(&mut self, state: &ViewState) -> bool {
        match serde_json::to_string(state) {
            Ok(json) => self.write(STATE_KEY, &json),
            Err(e) => {
                tracing::warn!("Failed to serialize state: {}", StorageError::from(e));
                false
            }
        }
    }

    pub fn clear_state(&mut self) {
        self.delete(STATE_KEY);
    }

    pub fn tab_nav_visible(&self) -> Option<bool> {
        self.read(TAB_NAV_KEY).and_then(|v| v.parse().ok())
    }

    pub fn set_tab_nav_visible(&mut self, visible: bool) -> bool {
        self.write(TAB_NAV_KEY, if visible { "true" } else { "false" })
    }

    pub fn settings_icon_offset(&self) -> Option<f64> {
        self.read(ICON_OFFSET_KEY)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }

    pub fn set_settings_icon_offset(&mut self, offset: f64) -> bool {
        self.write(ICON_OFFSET_KEY, &offset.to_string())
    }

    pub fn intro_seen(&self) -> bool {
        self.read(INTRO_KEY).is_some_and(|v| v == "true")
    }

    pub fn mark_intro_seen(&mut self) -> bool {
        self.write(INTRO_KEY, "true")
    }

    pub fn adaptation_id(&self) -> Option<String> {
        self.read(ADAPTATION_KEY).filter(|v| !v.is_empty())
    }

    pub fn set_adaptation_id(&mut self, id: Option<&str>) {
        match id {
            Some(id) => {
                self.write(ADAPTATION_KEY, id);
            }
            None => self.delete(ADAPTATION_KEY),
        }
    }

    /// Forget everything this site stored
    pub fn clear_all(&mut self) {
        for suffix in [STATE_KEY, TAB_NAV_KEY, ICON_OFFSET_KEY, INTRO_KEY, ADAPTATION_KEY] {
            self.delete(suffix);
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
