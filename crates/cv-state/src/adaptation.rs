//! Adaptations
//!
//! A named overlay (theme plus default choices) a site can ship for one
//! audience or tenant. Selected through `?adapt=<id>`, a meta tag, or the
//! visitor's stored choice.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ToggleVisibility;

/// `?adapt=clear` forgets the stored adaptation
pub const CLEAR_ADAPTATION: &str = "clear";

/// Default choices layered over the config defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdaptationDefaults {
    pub toggles: BTreeMap<String, ToggleVisibility>,
    pub placeholders: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Adaptation {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Opaque to the core; handed to the styling layer as-is
    #[serde(default)]
    pub theme: serde_json::Value,
    #[serde(default)]
    pub defaults: AdaptationDefaults,
}

impl Adaptation {
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Adaptations known to the site, by id
#[derive(Debug, Clone, Default)]
pub struct AdaptationCatalog {
    by_id: BTreeMap<String, Adaptation>,
}

impl AdaptationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON array of adaptations
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let list: Vec<Adaptation> = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for adaptation in list {
            catalog.insert(adaptation);
        }
        Ok(catalog)
    }

    /// Parse a JSON array of adaptations, falling back to none
    pub fn from_json_or_default(json: &str) -> Self {
        Self::from_json(json).unwrap_or_else(|e| {
            tracing::warn!("Invalid adaptation list, ignoring: {}", e);
            Self::default()
        })
    }

    /// Add an adaptation, replacing one with the same id
    pub fn insert(&mut self, adaptation: Adaptation) {
        if self.by_id.contains_key(&adaptation.id) {
            tracing::warn!("Adaptation {:?} defined twice; keeping the last one", adaptation.id);
        }
        self.by_id.insert(adaptation.id.clone(), adaptation);
    }

    pub fn get(&self, id: &str) -> Option<&Adaptation> {
        self.by_id.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.by_id.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
