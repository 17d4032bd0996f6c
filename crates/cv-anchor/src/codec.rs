//! Descriptor list codec
//!
//! Two wire forms share one URL parameter:
//! - `intro,pricing` when every descriptor has an id
//! - Base64 of a minified JSON array otherwise
//!
//! Decoding tries them in a fixed order and never fails; anything that does
//! not decode as a blob is read as a list of bare ids.

use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;

use crate::{AnchorDescriptor, CodecError};

static BASE64_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9+/]*={0,2}$").expect("valid regex"));

static ID_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ +,]+").expect("valid regex"));

/// Encode descriptors for a URL parameter
pub fn serialize(descriptors: &[AnchorDescriptor]) -> String {
    if descriptors.iter().all(|d| d.id().is_some()) {
        return descriptors
            .iter()
            .filter_map(AnchorDescriptor::id)
            .collect::<Vec<_>>()
            .join(",");
    }

    match serde_json::to_string(descriptors) {
        Ok(json) => STANDARD.encode(json.as_bytes()),
        Err(e) => {
            // Plain structs with string/number fields; cannot happen in practice
            tracing::error!("Failed to serialize anchor descriptors: {}", e);
            String::new()
        }
    }
}

/// Decode a URL parameter back into descriptors
pub fn deserialize(s: &str) -> Vec<AnchorDescriptor> {
    // URLSearchParams turns '+' into ' ', so a space means an id list
    if !s.contains(' ') {
        match decode_blob(s) {
            Ok(descriptors) => return descriptors,
            Err(e) => tracing::debug!("Anchor blob rejected ({}), reading as id list", e),
        }
    }
    parse_id_list(s)
}

fn decode_blob(s: &str) -> crate::Result<Vec<AnchorDescriptor>> {
    if !BASE64_SHAPE.is_match(s) {
        return Err(CodecError::NotBase64);
    }
    let bytes = STANDARD.decode(s)?;
    let json = String::from_utf8(bytes)?;
    Ok(serde_json::from_str(&json)?)
}

fn parse_id_list(s: &str) -> Vec<AnchorDescriptor> {
    ID_SEPARATORS
        .split(s.trim())
        .filter(|id| !id.is_empty())
        .map(AnchorDescriptor::from_id)
        .collect()
}
