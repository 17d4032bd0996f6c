//! Anchor descriptor capture

use cv_dom::{Document, NodeId};
use serde::{Deserialize, Serialize};

/// Tag sentinel for descriptors that may only be matched by id
pub const ANY_TAG: &str = "ANY";

/// Number of normalized characters kept as the text snippet
pub const SNIPPET_LEN: usize = 32;

/// Reference to one element, captured so it can be found again later
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorDescriptor {
    /// Lowercased tag name, or `ANY`
    pub tag: String,
    /// Position among same-tag elements inside the scope at capture time
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub text_snippet: String,
    #[serde(default)]
    pub text_hash: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    /// Id of the nearest ancestor with an id; narrows the search scope
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl AnchorDescriptor {
    /// Id-only descriptor (no structural fallback)
    pub fn from_id(id: &str) -> Self {
        Self {
            tag: ANY_TAG.to_string(),
            index: 0,
            text_snippet: String::new(),
            text_hash: 0,
            element_id: Some(id.to_string()),
            parent_id: None,
        }
    }

    /// Whether this descriptor can only be matched by id
    pub fn is_id_only(&self) -> bool {
        self.tag == ANY_TAG
    }

    /// The element id, if present and non-empty
    pub fn id(&self) -> Option<&str> {
        self.element_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Collapse whitespace runs to single spaces and trim
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cheap rolling hash (`h = h * 31 + c`, wrapping at 32 bits)
pub fn text_hash(normalized: &str) -> u32 {
    normalized
        .chars()
        .fold(0u32, |h, c| h.wrapping_shl(5).wrapping_sub(h).wrapping_add(c as u32))
}

/// Capture a descriptor for a live element
///
/// The scope is the nearest ancestor with an id, or `<body>` when there is
/// none; `index` counts same-tag elements inside that scope.
pub fn create_descriptor(doc: &Document, element: NodeId) -> AnchorDescriptor {
    let tree = doc.tree();
    let tag = tree.tag_name(element).unwrap_or_default().to_string();
    let text = normalize_text(&tree.text_content(element));

    let scope_elem = tree.nearest_ancestor_with_id(element);
    let parent_id = scope_elem.and_then(|s| tree.element_id(s)).map(str::to_string);
    let scope = scope_elem.unwrap_or_else(|| doc.body());

    let index = tree
        .elements_by_tag(scope, &tag)
        .iter()
        .position(|&e| e == element)
        .unwrap_or(0);

    AnchorDescriptor {
        text_snippet: text.chars().take(SNIPPET_LEN).collect(),
        text_hash: text_hash(&text),
        element_id: tree.element_id(element).map(str::to_string),
        tag,
        index,
        parent_id,
    }
}
