//! CustomViews Anchors
//!
//! Turns a reference to a live element into a short URL-safe string and back,
//! tolerating markup that moved between capture and resolution.
//!
//! - `descriptor` captures tag, position, text fingerprint and nearby ids
//! - `codec` packs descriptor lists as id lists or Base64 JSON
//! - `resolver` scores candidates to find the element again

pub mod descriptor;
pub mod codec;
pub mod resolver;

pub use descriptor::{AnchorDescriptor, ANY_TAG, SNIPPET_LEN, create_descriptor, normalize_text, text_hash};
pub use codec::{serialize, deserialize};
pub use resolver::{resolve, resolve_all, Resolution};

/// Errors raised while decoding a descriptor blob
///
/// Never escapes `deserialize`, which falls back to the bare-id parser.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("string is not Base64 shaped")]
    NotBase64,

    #[error("invalid Base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("decoded blob is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("decoded blob is not a descriptor list: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CodecError>;
