//! Placeholder registry
//!
//! Names that may carry a visitor value. Definitions come from the config's
//! `placeholders` list or from a tab group's `placeholderId`; a config
//! definition always wins over a tab-derived one with the same name.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::Config;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[\s*([^\[\]\s]+)\s*\]\]").expect("valid regex"));

/// Where a definition came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderSource {
    Config,
    TabGroup,
}

/// A named text slot (`[[name]]`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderDefinition {
    pub name: String,
    pub settings_label: Option<String>,
    pub settings_hint: Option<String>,
    pub default_value: Option<String>,
    pub hidden_from_settings: bool,
    /// Only offered in settings when detected on the current page
    pub is_local: bool,
    pub source: PlaceholderSource,
    /// Tab group whose active tab drives the value
    pub owner_tab_group_id: Option<String>,
}

impl PlaceholderDefinition {
    /// Definition with no settings metadata
    pub fn new(name: &str, source: PlaceholderSource) -> Self {
        Self {
            name: name.to_string(),
            settings_label: None,
            settings_hint: None,
            default_value: None,
            hidden_from_settings: false,
            is_local: false,
            source,
            owner_tab_group_id: None,
        }
    }
}

/// Registry of known placeholder names
#[derive(Debug, Clone, Default)]
pub struct PlaceholderRegistry {
    defs: BTreeMap<String, PlaceholderDefinition>,
}

impl PlaceholderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry for a config: config placeholders first, then the
    /// placeholders linked to tab groups
    pub fn from_config(config: &Config) -> Self {
        let mut registry = Self::new();
        for p in &config.placeholders {
            registry.register(PlaceholderDefinition {
                name: p.name.clone(),
                settings_label: p.settings_label.clone(),
                settings_hint: p.settings_hint.clone(),
                default_value: p.default_value.clone(),
                hidden_from_settings: p.hidden_from_settings,
                is_local: p.is_local,
                source: PlaceholderSource::Config,
                owner_tab_group_id: None,
            });
        }
        for group in &config.tab_groups {
            let Some(name) = &group.placeholder_id else {
                continue;
            };
            registry.register(PlaceholderDefinition {
                name: name.clone(),
                settings_label: group.label.clone(),
                settings_hint: None,
                default_value: group.default_tab().and_then(|t| t.placeholder_value.clone()),
                hidden_from_settings: false,
                is_local: group.is_local,
                source: PlaceholderSource::TabGroup,
                owner_tab_group_id: Some(group.group_id.clone()),
            });
        }
        registry
    }

    /// Register a definition; duplicates are logged, never fatal
    ///
    /// Returns true when the definition was stored.
    pub fn register(&mut self, def: PlaceholderDefinition) -> bool {
        let Some(existing) = self.defs.get(&def.name) else {
            self.defs.insert(def.name.clone(), def);
            return true;
        };

        let replace = existing.source == PlaceholderSource::TabGroup
            && def.source == PlaceholderSource::Config;
        tracing::warn!(
            "Placeholder {:?} registered twice ({:?} vs {:?}); keeping the {:?} definition",
            def.name,
            existing.source,
            def.source,
            if replace { def.source } else { existing.source }
        );
        if replace {
            self.defs.insert(def.name.clone(), def);
        }
        replace
    }

    pub fn get(&self, name: &str) -> Option<&PlaceholderDefinition> {
        self.defs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlaceholderDefinition> {
        self.defs.values()
    }

    /// Whether a name is defined by the config itself
    pub fn is_config_sourced(&self, name: &str) -> bool {
        self.get(name).is_some_and(|d| d.source == PlaceholderSource::Config)
    }

    /// Tab-derived placeholder driven by the given group, if any
    pub fn for_tab_group(&self, group_id: &str) -> Option<&PlaceholderDefinition> {
        self.defs.values().find(|d| {
            d.source == PlaceholderSource::TabGroup
                && d.owner_tab_group_id.as_deref() == Some(group_id)
        })
    }

    /// Drop unregistered keys, logging one warning per key
    pub fn filter_values(&self, values: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        values
            .iter()
            .filter(|(name, _)| {
                let known = self.contains(name);
                if !known {
                    tracing::warn!("Ignoring unknown placeholder {:?}", name);
                }
                known
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Definitions the settings panel should offer on a page
    pub fn settings_entries<'a>(&'a self, present: &'a BTreeSet<String>) -> impl Iterator<Item = &'a PlaceholderDefinition> + 'a {
        self.defs
            .values()
            .filter(move |d| !d.hidden_from_settings && (!d.is_local || present.contains(&d.name)))
    }

    /// Replace `[[name]]` tokens with their value or default
    ///
    /// Unregistered names, and registered names with neither value nor
    /// default, are left as written.
    pub fn substitute(&self, text: &str, values: &BTreeMap<String, String>) -> String {
        TOKEN
            .replace_all(text, |caps: &Captures<'_>| {
                let name = &caps[1];
                let value = self.get(name).and_then(|def| {
                    values
                        .get(name)
                        .filter(|v| !v.is_empty())
                        .or(def.default_value.as_ref())
                });
                match value {
                    Some(v) => v.clone(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

/// Placeholder names referenced in a text
pub fn find_tokens(text: &str) -> impl Iterator<Item = &str> {
    TOKEN.captures_iter(text).filter_map(|c| c.get(1)).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::from_json(r#"{
            "tabGroups": [
                {"groupId": "os", "placeholderId": "shell",
                 "tabs": [{"tabId": "linux", "placeholderValue": "bash"}]},
                {"groupId": "lang", "placeholderId": "ext",
                 "tabs": [{"tabId": "rust", "placeholderValue": ".rs"}]}
            ],
            "placeholders": [
                {"name": "ext", "settingsLabel": "Extension"},
                {"name": "user", "defaultValue": "you", "isLocal": true}
            ]
        }"#).unwrap()
    }

    #[test]
    fn test_config_source_wins() {
        let registry = PlaceholderRegistry::from_config(&config());
        assert_eq!(registry.len(), 3);
        assert!(registry.is_config_sourced("ext"));
        assert_eq!(registry.get("shell").unwrap().source, PlaceholderSource::TabGroup);
        assert_eq!(registry.get("shell").unwrap().default_value.as_deref(), Some("bash"));
        assert!(registry.for_tab_group("lang").is_none());
        assert_eq!(registry.for_tab_group("os").unwrap().name, "shell");
    }

    #[test]
    fn test_config_replaces_tabgroup_definition() {
        let mut registry = PlaceholderRegistry::new();
        assert!(registry.register(PlaceholderDefinition::new("x", PlaceholderSource::TabGroup)));
        assert!(registry.register(PlaceholderDefinition::new("x", PlaceholderSource::Config)));
        assert!(!registry.register(PlaceholderDefinition::new("x", PlaceholderSource::TabGroup)));
        assert!(!registry.register(PlaceholderDefinition::new("x", PlaceholderSource::Config)));
        assert!(registry.is_config_sourced("x"));
    }

    #[test]
    fn test_filter_values_drops_unknown() {
        let mut registry = PlaceholderRegistry::new();
        registry.register(PlaceholderDefinition::new("shown", PlaceholderSource::Config));
        let input = [
            ("unknownKey".to_string(), "v".to_string()),
            ("shown".to_string(), "1".to_string()),
        ]
        .into();
        let out = registry.filter_values(&input);
        assert_eq!(out, BTreeMap::from([("shown".to_string(), "1".to_string())]));
    }

    #[test]
    fn test_substitute() {
        let registry = PlaceholderRegistry::from_config(&config());
        let values = [("shell".to_string(), "zsh".to_string())].into();
        assert_eq!(
            registry.substitute("Run [[shell]] as [[ user ]] in [[ext]] [[nope]]", &values),
            "Run zsh as you in [[ext]] [[nope]]"
        );
    }

    #[test]
    fn test_find_tokens() {
        let names: Vec<_> = find_tokens("[[a]] text [[ b ]] [[c d]] [[]]").collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_settings_entries_respect_locality() {
        let registry = PlaceholderRegistry::from_config(&config());
        let none = BTreeSet::new();
        let names: Vec<_> = registry.settings_entries(&none).map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["ext", "shell"]);

        let present = ["user".to_string()].into();
        assert_eq!(registry.settings_entries(&present).count(), 3);
    }
}
