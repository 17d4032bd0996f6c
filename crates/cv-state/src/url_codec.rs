//! URL state codec
//!
//! The five managed query parameters:
//!
//! | param    | content                                  |
//! |----------|------------------------------------------|
//! | `t-show` | toggle ids, comma separated              |
//! | `t-peek` | toggle ids, comma separated              |
//! | `t-hide` | toggle ids, comma separated              |
//! | `tabs`   | `group:tab` pairs, comma separated       |
//! | `ph`     | `name:value` pairs, comma separated      |
//!
//! Every piece is percent-encoded on its own before joining, so a literal
//! `,` or `:` inside a value travels as `%2C` / `%3A`. Decoding reads the raw
//! parameter text, splits on the structural separators and only then decodes
//! each piece. Decoding the whole parameter first would turn escaped commas
//! back into separators.

use std::collections::BTreeMap;

use regex::Regex;
use url::Url;

use crate::{Config, PagePresence, PlaceholderRegistry, PlaceholderSource, StateDelta, ViewState};

pub const PARAM_SHOW: &str = "t-show";
pub const PARAM_PEEK: &str = "t-peek";
pub const PARAM_HIDE: &str = "t-hide";
pub const PARAM_TABS: &str = "tabs";
pub const PARAM_PLACEHOLDERS: &str = "ph";

/// Query keys owned by this codec
pub const MANAGED_PARAMS: [&str; 5] = [PARAM_SHOW, PARAM_PEEK, PARAM_HIDE, PARAM_TABS, PARAM_PLACEHOLDERS];

// ============================================================================
// Percent coding
// ============================================================================

/// Percent-encode like `encodeURIComponent`
pub fn encode_component(s: &str) -> String {
    let mut result = String::with_capacity(s.len() * 3);
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9'
            | b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')' => {
                result.push(byte as char);
            }
            _ => result.push_str(&format!("%{:02X}", byte)),
        }
    }
    result
}

/// Percent-decode like `decodeURIComponent` (`+` stays `+`)
///
/// Malformed escapes are kept literally; invalid UTF-8 is replaced.
pub fn decode_component(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = &bytes[i + 1..i + 3];
            if hex.iter().all(u8::is_ascii_hexdigit) {
                let byte = hex.iter().fold(0u8, |acc, &b| acc * 16 + hex_value(b));
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        _ => b - b'A' + 10,
    }
}

/// Form-style decoding (`URLSearchParams`): `+` is a space
pub fn decode_form_component(s: &str) -> String {
    decode_component(&s.replace('+', " "))
}

// ============================================================================
// Raw parameter access
// ============================================================================

/// Raw (still encoded) value of a query parameter
///
/// `query` may start with `?`. Only the first occurrence is returned.
pub fn raw_param<'q>(query: &'q str, name: &str) -> Option<&'q str> {
    let pattern = format!(r"(?:^|[?&]){}=([^&#]*)", regex::escape(name));
    let re = Regex::new(&pattern).ok()?;
    re.captures(query).and_then(|c| c.get(1)).map(|m| m.as_str())
}

fn decode_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter(|piece| !piece.is_empty())
        .map(decode_component)
        .collect()
}

fn decode_pairs(raw: &str) -> BTreeMap<String, String> {
    raw.split(',')
        .filter(|piece| !piece.is_empty())
        .filter_map(|piece| match piece.split_once(':') {
            Some((k, v)) => Some((decode_component(k), decode_component(v))),
            None => {
                tracing::debug!("Skipping malformed pair {:?}", piece);
                None
            }
        })
        .collect()
}

fn encode_list<'a>(ids: impl IntoIterator<Item = &'a String>) -> String {
    ids.into_iter().map(|id| encode_component(id)).collect::<Vec<_>>().join(",")
}

fn encode_pairs(pairs: &BTreeMap<String, String>) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}:{}", encode_component(k), encode_component(v)))
        .collect::<Vec<_>>()
        .join(",")
}

// ============================================================================
// Encode / decode
// ============================================================================

/// Managed parameters for a delta, already encoded
///
/// Empty lists and maps are left out.
pub fn encode(delta: &StateDelta) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    let lists = [
        (PARAM_SHOW, &delta.shown_toggles),
        (PARAM_PEEK, &delta.peek_toggles),
        (PARAM_HIDE, &delta.hidden_toggles),
    ];
    for (name, ids) in lists {
        if let Some(ids) = ids.as_ref().filter(|ids| !ids.is_empty()) {
            params.push((name, encode_list(ids)));
        }
    }
    let maps = [(PARAM_TABS, &delta.tabs), (PARAM_PLACEHOLDERS, &delta.placeholders)];
    for (name, pairs) in maps {
        if let Some(pairs) = pairs.as_ref().filter(|p| !p.is_empty()) {
            params.push((name, encode_pairs(pairs)));
        }
    }
    params
}

/// `k=v&k=v` form of `encode`
pub fn encode_query(delta: &StateDelta) -> String {
    encode(delta)
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Read the managed parameters out of a raw query string
pub fn decode(query: &str) -> StateDelta {
    StateDelta {
        shown_toggles: raw_param(query, PARAM_SHOW).map(decode_list),
        peek_toggles: raw_param(query, PARAM_PEEK).map(decode_list),
        hidden_toggles: raw_param(query, PARAM_HIDE).map(decode_list),
        tabs: raw_param(query, PARAM_TABS).map(decode_pairs),
        placeholders: raw_param(query, PARAM_PLACEHOLDERS).map(decode_pairs),
    }
}

/// Decode the managed parameters of a full URL
pub fn decode_url(url: &str) -> crate::Result<StateDelta> {
    let parsed = Url::parse(url)?;
    Ok(decode(parsed.query().unwrap_or_default()))
}

/// Drop managed parameters from a raw query, keeping the rest verbatim
pub fn strip_managed(query: &str) -> Vec<&str> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let key = pair.split_once('=').map_or(*pair, |(k, _)| k);
            !MANAGED_PARAMS.contains(&key)
        })
        .collect()
}

/// Rewrite `url` so its managed parameters describe `delta`
///
/// Other parameters and the fragment are kept; the query is assembled by
/// hand so already-encoded values are not encoded twice.
pub fn apply_to_url(url: &str, delta: &StateDelta) -> crate::Result<String> {
    let mut parsed = Url::parse(url)?;
    let existing = parsed.query().unwrap_or_default().to_string();
    let mut pairs: Vec<String> = strip_managed(&existing).into_iter().map(str::to_string).collect();
    pairs.extend(encode(delta).into_iter().map(|(k, v)| format!("{}={}", k, v)));

    if pairs.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.set_query(Some(&pairs.join("&")));
    }
    Ok(parsed.to_string())
}

// ============================================================================
// Shareable projection
// ============================================================================

/// The part of `state` that belongs in a link to the current page
///
/// - only toggles, tab groups and placeholders present on the page
/// - every page toggle that is neither shown nor peeked is listed as hidden,
///   so the recipient's own defaults cannot bring it back
/// - tab-derived placeholders are left out; `tabs` already implies them
pub fn compute_shareable_state(
    state: &ViewState,
    config: &Config,
    registry: &PlaceholderRegistry,
    presence: &PagePresence,
) -> StateDelta {
    let mut shown = Vec::new();
    let mut peek = Vec::new();
    let mut hidden = Vec::new();
    let page_toggles: std::collections::BTreeSet<&str> = presence
        .toggles
        .iter()
        .filter_map(|id| config.find_toggle(id))
        .map(|t| t.toggle_id.as_str())
        .collect();
    for id in page_toggles {
        let bucket = if state.shown_toggles.contains(id) {
            &mut shown
        } else if state.peek_toggles.contains(id) {
            &mut peek
        } else {
            &mut hidden
        };
        bucket.push(id.to_string());
    }

    let tabs: BTreeMap<String, String> = state
        .tabs
        .iter()
        .filter(|(group, _)| presence.tab_groups.contains(*group))
        .map(|(g, t)| (g.clone(), t.clone()))
        .collect();

    let placeholders: BTreeMap<String, String> = state
        .placeholders
        .iter()
        .filter(|(name, _)| presence.placeholders.contains(*name))
        .filter(|(name, _)| {
            registry
                .get(name)
                .is_some_and(|d| d.source != PlaceholderSource::TabGroup)
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let non_empty_list = |v: Vec<String>| if v.is_empty() { None } else { Some(v) };
    let non_empty_map = |m: BTreeMap<String, String>| if m.is_empty() { None } else { Some(m) };
    StateDelta {
        shown_toggles: non_empty_list(shown),
        peek_toggles: non_empty_list(peek),
        hidden_toggles: non_empty_list(hidden),
        tabs: non_empty_map(tabs),
        placeholders: non_empty_map(placeholders),
    }
}
