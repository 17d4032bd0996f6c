//! View state types

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// How a toggle section is displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleVisibility {
    #[default]
    Show,
    /// Truncated, expandable by the visitor
    Peek,
    Hide,
}

/// Applied visitor choices
///
/// `shown_toggles` and `peek_toggles` are disjoint; a configured toggle in
/// neither set is hidden.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewState {
    pub shown_toggles: BTreeSet<String>,
    pub peek_toggles: BTreeSet<String>,
    pub tabs: BTreeMap<String, String>,
    pub placeholders: BTreeMap<String, String>,
}

impl ViewState {
    /// Current visibility of a toggle id (exact match)
    pub fn visibility(&self, toggle_id: &str) -> ToggleVisibility {
        if self.shown_toggles.contains(toggle_id) {
            ToggleVisibility::Show
        } else if self.peek_toggles.contains(toggle_id) {
            ToggleVisibility::Peek
        } else {
            ToggleVisibility::Hide
        }
    }

    /// Move a toggle into exactly one of the visibility buckets
    pub fn set_visibility(&mut self, toggle_id: &str, visibility: ToggleVisibility) {
        self.shown_toggles.remove(toggle_id);
        self.peek_toggles.remove(toggle_id);
        match visibility {
            ToggleVisibility::Show => {
                self.shown_toggles.insert(toggle_id.to_string());
            }
            ToggleVisibility::Peek => {
                self.peek_toggles.insert(toggle_id.to_string());
            }
            ToggleVisibility::Hide => {}
        }
    }

    /// Active tab of a group
    pub fn active_tab(&self, group_id: &str) -> Option<&str> {
        self.tabs.get(group_id).map(String::as_str)
    }

    /// Current value of a placeholder
    pub fn placeholder(&self, name: &str) -> Option<&str> {
        self.placeholders.get(name).map(String::as_str)
    }
}

/// Sparse change set: only fields that are `Some` are applied
///
/// Used for URL deltas, persisted blobs (which may predate newer fields) and
/// the shareable projection of the current state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StateDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shown_toggles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peek_toggles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden_toggles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tabs: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholders: Option<BTreeMap<String, String>>,
}

impl StateDelta {
    /// No field present
    pub fn is_empty(&self) -> bool {
        self.shown_toggles.is_none()
            && self.peek_toggles.is_none()
            && self.hidden_toggles.is_none()
            && self.tabs.is_none()
            && self.placeholders.is_none()
    }

    /// Whether the delta mentions any toggle list
    pub fn has_toggles(&self) -> bool {
        self.shown_toggles.is_some() || self.peek_toggles.is_some() || self.hidden_toggles.is_some()
    }
}

impl From<&ViewState> for StateDelta {
    fn from(state: &ViewState) -> Self {
        Self {
            shown_toggles: Some(state.shown_toggles.iter().cloned().collect()),
            peek_toggles: Some(state.peek_toggles.iter().cloned().collect()),
            hidden_toggles: None,
            tabs: Some(state.tabs.clone()),
            placeholders: Some(state.placeholders.clone()),
        }
    }
}

/// Toggles, tab groups and placeholders detected on the current page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PagePresence {
    pub toggles: BTreeSet<String>,
    pub tab_groups: BTreeSet<String>,
    pub placeholders: BTreeSet<String>,
}
