//! CustomViews Session
//!
//! The per-page context object. A host creates one `Session` per page load,
//! feeds it the page's `Document`, and forwards visitor edits and DOM
//! mutations to it. The session owns the state engine and the persistent
//! store; everything else it uses is a pure function from the other crates.
//!
//! # Example
//! ```rust,ignore
//! use cv_session::{Session, SessionOptions};
//! use cv_state::{Config, MemoryStorage};
//!
//! let options = SessionOptions::new(Config::from_json_or_default(json));
//! let mut session = Session::start(options, MemoryStorage::new(), &doc);
//! session.set_pinned_tab("os", "linux");
//! let link = session.share_url(&doc)?;
//! ```

mod session;
mod focus;
mod action;
mod scan;
mod notice;
pub mod assets;

pub use session::{Session, SessionOptions};
pub use focus::{FocusMode, FocusPlan, focus_link, plan_focus, read_focus_param};
pub use action::{PageAction, ShareMode, page_action, clear_page_action};
pub use scan::{page_presence, scroll_offset, SCROLL_OFFSET_ATTR};
pub use notice::Notice;
pub use assets::{Asset, AssetCatalog, AssetType};

/// Session error
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("state error: {0}")]
    State(#[from] cv_state::StateError),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
