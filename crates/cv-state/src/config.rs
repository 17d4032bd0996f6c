//! Site configuration
//!
//! Loaded from the site's JSON config file. Every field except the ids is
//! optional; a missing or malformed file degrades to an empty config.

use serde::{Deserialize, Serialize};

use crate::ToggleVisibility;

/// Storage prefix used when the config does not name one
pub const DEFAULT_STORAGE_KEY: &str = "customviews";

/// Site configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub toggles: Vec<ToggleConfig>,
    pub tab_groups: Vec<TabGroupConfig>,
    pub placeholders: Vec<PlaceholderConfig>,
    pub share_exclusions: ShareExclusions,
    pub storage_key: Option<String>,
    pub assets_json_path: Option<String>,
    pub base_url: Option<String>,
}

/// A page section the visitor can show, peek or hide
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleConfig {
    pub toggle_id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default: ToggleVisibility,
    /// Only offered in settings when present on the current page
    #[serde(default)]
    pub is_local: bool,
}

/// Mutually exclusive content panes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabGroupConfig {
    pub group_id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub default: Option<String>,
    /// Placeholder whose value follows the active tab
    #[serde(default)]
    pub placeholder_id: Option<String>,
    #[serde(default)]
    pub tabs: Vec<TabConfig>,
    #[serde(default)]
    pub is_local: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabConfig {
    pub tab_id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub placeholder_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceholderConfig {
    pub name: String,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub settings_label: Option<String>,
    #[serde(default)]
    pub settings_hint: Option<String>,
    #[serde(default)]
    pub hidden_from_settings: bool,
    #[serde(default)]
    pub is_local: bool,
}

/// Elements never offered for share/focus selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareExclusions {
    pub tags: Vec<String>,
    pub ids: Vec<String>,
}

impl Config {
    /// Parse a config file
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        tracing::debug!(
            "Loaded config: {} toggles, {} tab groups, {} placeholders",
            config.toggles.len(),
            config.tab_groups.len(),
            config.placeholders.len()
        );
        Ok(config)
    }

    /// Parse a config file, falling back to an empty config
    pub fn from_json_or_default(json: &str) -> Self {
        Self::from_json(json).unwrap_or_else(|e| {
            tracing::warn!("Invalid config, continuing with defaults: {}", e);
            Self::default()
        })
    }

    /// Prefix for every persisted key
    pub fn storage_key(&self) -> &str {
        self.storage_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .unwrap_or(DEFAULT_STORAGE_KEY)
    }

    /// Find a toggle by id, ignoring case
    pub fn find_toggle(&self, toggle_id: &str) -> Option<&ToggleConfig> {
        let wanted = toggle_id.to_lowercase();
        self.toggles
            .iter()
            .find(|t| t.toggle_id.to_lowercase() == wanted)
    }

    /// Find a tab group by id
    pub fn find_tab_group(&self, group_id: &str) -> Option<&TabGroupConfig> {
        self.tab_groups.iter().find(|g| g.group_id == group_id)
    }
}

impl TabGroupConfig {
    /// Configured default tab if it exists, else the first tab
    pub fn default_tab(&self) -> Option<&TabConfig> {
        self.default
            .as_deref()
            .and_then(|id| self.find_tab(id))
            .or_else(|| self.tabs.first())
    }

    /// Find a tab of this group
    pub fn find_tab(&self, tab_id: &str) -> Option<&TabConfig> {
        self.tabs.iter().find(|t| t.tab_id == tab_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "toggles": [
            {"toggleId": "Advanced", "label": "Advanced", "default": "peek"},
            {"toggleId": "beta"}
        ],
        "tabGroups": [
            {"groupId": "os", "default": "mac", "placeholderId": "shell",
             "tabs": [{"tabId": "linux", "placeholderValue": "bash"},
                      {"tabId": "mac", "placeholderValue": "zsh"}]}
        ],
        "placeholders": [{"name": "user", "defaultValue": "you"}],
        "shareExclusions": {"tags": ["nav"]},
        "storageKey": "docs"
    }"#;

    #[test]
    fn test_parse_sample() {
        let config = Config::from_json(SAMPLE).unwrap();
        assert_eq!(config.toggles[0].default, ToggleVisibility::Peek);
        assert_eq!(config.toggles[1].default, ToggleVisibility::Show);
        assert_eq!(config.tab_groups[0].default_tab().unwrap().tab_id, "mac");
        assert_eq!(config.share_exclusions.tags, vec!["nav"]);
        assert!(config.share_exclusions.ids.is_empty());
        assert_eq!(config.storage_key(), "docs");
    }

    #[test]
    fn test_find_toggle_ignores_case() {
        let config = Config::from_json(SAMPLE).unwrap();
        assert_eq!(config.find_toggle("advanced").unwrap().toggle_id, "Advanced");
        assert!(config.find_toggle("missing").is_none());
    }

    #[test]
    fn test_default_tab_falls_back_to_first() {
        let mut config = Config::from_json(SAMPLE).unwrap();
        config.tab_groups[0].default = Some("windows".to_string());
        assert_eq!(config.tab_groups[0].default_tab().unwrap().tab_id, "linux");
    }

    #[test]
    fn test_malformed_config_degrades() {
        let config = Config::from_json_or_default("{\"toggles\": 5");
        assert_eq!(config, Config::default());
        assert_eq!(config.storage_key(), DEFAULT_STORAGE_KEY);
    }

    #[test]
    fn test_unknown_toggle_default_is_rejected() {
        assert!(Config::from_json(r#"{"toggles":[{"toggleId":"a","default":"sometimes"}]}"#).is_err());
    }
}
