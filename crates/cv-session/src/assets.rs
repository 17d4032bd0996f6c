//! Site assets
//!
//! Reusable snippets referenced from the page by key. The JSON format is
//! loose (`src` for images, `content` plus `isHTML` for text); the kind of
//! each entry is decided once, on ingestion.

use std::collections::BTreeMap;

use serde::Deserialize;

/// What an asset renders as
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetType {
    Image {
        src: String,
        alt: Option<String>,
    },
    Text(String),
    Html(String),
}

/// One asset with its presentation hints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub kind: AssetType,
    pub class_name: Option<String>,
    pub style: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAsset {
    src: Option<String>,
    alt: Option<String>,
    content: Option<String>,
    #[serde(rename = "isHTML", default)]
    is_html: bool,
    class_name: Option<String>,
    style: Option<String>,
}

impl RawAsset {
    fn classify(self) -> Option<Asset> {
        let kind = match (self.src, self.content) {
            (Some(src), _) => AssetType::Image { src, alt: self.alt },
            (None, Some(content)) if self.is_html => AssetType::Html(content),
            (None, Some(content)) => AssetType::Text(content),
            (None, None) => return None,
        };
        Some(Asset { kind, class_name: self.class_name, style: self.style })
    }
}

/// Assets by key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetCatalog {
    assets: BTreeMap<String, Asset>,
}

impl AssetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an assets file; entries with neither `src` nor `content` are
    /// skipped with a warning
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let raw: BTreeMap<String, RawAsset> = serde_json::from_str(json)?;
        let mut assets = BTreeMap::new();
        for (key, entry) in raw {
            match entry.classify() {
                Some(asset) => {
                    assets.insert(key, asset);
                }
                None => tracing::warn!("Skipping asset {:?}: no src or content", key),
            }
        }
        tracing::debug!("Loaded {} assets", assets.len());
        Ok(Self { assets })
    }

    pub fn from_json_or_default(json: &str) -> Self {
        Self::from_json(json).unwrap_or_else(|e| {
            tracing::warn!("Invalid assets file, continuing without assets: {}", e);
            Self::default()
        })
    }

    pub fn get(&self, key: &str) -> Option<&Asset> {
        self.assets.get(key)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
