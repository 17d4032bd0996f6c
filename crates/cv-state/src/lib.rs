//! CustomViews State
//!
//! Everything that decides what a visitor sees, independent of the DOM:
//! - `config` / `adaptation`: the site owner's configuration and overlays
//! - `placeholder`: the placeholder registry and `[[name]]` substitution
//! - `engine`: layered merge (config, adaptation, persisted, URL) with validation
//! - `url_codec`: the compact `t-show` / `t-peek` / `t-hide` / `tabs` / `ph` encoding
//! - `storage`: best-effort persistence behind a pluggable backend

pub mod config;
pub mod state;
pub mod placeholder;
pub mod adaptation;
pub mod engine;
pub mod url_codec;
pub mod storage;

pub use config::{Config, ToggleConfig, TabGroupConfig, TabConfig, PlaceholderConfig, ShareExclusions, DEFAULT_STORAGE_KEY};
pub use state::{ViewState, StateDelta, ToggleVisibility, PagePresence};
pub use placeholder::{PlaceholderDefinition, PlaceholderRegistry, PlaceholderSource};
pub use adaptation::{Adaptation, AdaptationCatalog, AdaptationDefaults, CLEAR_ADAPTATION};
pub use engine::StateEngine;
pub use url_codec::{MANAGED_PARAMS, compute_shareable_state};
pub use storage::{StorageBackend, MemoryStorage, PersistentStore, StorageError};

/// State crate error
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, StateError>;
