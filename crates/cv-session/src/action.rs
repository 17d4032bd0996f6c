//! One-shot page actions
//!
//! Links can ask the page to open the settings panel or start share mode,
//! either as a query parameter (`?cv-open`) or as the fragment (`#cv-open`).
//! The trigger is removed once handled so a reload does not fire it again.

use url::Url;

/// Which selection share mode starts in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareMode {
    /// Let the visitor pick
    Choose,
    Show,
    Hide,
    Highlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAction {
    OpenSettings,
    Share(ShareMode),
}

const TRIGGERS: [(&str, PageAction); 5] = [
    ("cv-open", PageAction::OpenSettings),
    ("cv-share", PageAction::Share(ShareMode::Choose)),
    ("cv-share-show", PageAction::Share(ShareMode::Show)),
    ("cv-share-hide", PageAction::Share(ShareMode::Hide)),
    ("cv-share-highlight", PageAction::Share(ShareMode::Highlight)),
];

fn trigger(name: &str) -> Option<PageAction> {
    TRIGGERS.iter().find(|(n, _)| *n == name).map(|(_, a)| *a)
}

fn is_trigger_pair(pair: &str) -> bool {
    let key = pair.split_once('=').map_or(pair, |(k, _)| k);
    trigger(key).is_some()
}

/// The action a URL asks for; the query is checked before the fragment
pub fn page_action(url: &str) -> Option<PageAction> {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!("Not checking page actions on {:?}: {}", url, e);
            return None;
        }
    };
    let from_query = parsed.query_pairs().find_map(|(key, _)| trigger(&key));
    from_query.or_else(|| parsed.fragment().and_then(trigger))
}

/// `url` without any action trigger
pub fn clear_page_action(url: &str) -> crate::Result<String> {
    let mut parsed = Url::parse(url)?;

    let query = parsed.query().unwrap_or_default().to_string();
    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| !pair.is_empty() && !is_trigger_pair(pair))
        .collect();
    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.set_query(Some(&kept.join("&")));
    }

    if parsed.fragment().is_some_and(|f| trigger(f).is_some()) {
        parsed.set_fragment(None);
    }
    Ok(parsed.to_string())
}
