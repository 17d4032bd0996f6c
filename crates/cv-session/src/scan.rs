//! Page scans

use cv_dom::{DOMRect, Document, NodeData, NodeId};
use cv_focus::SHARE_IGNORE_ATTR;
use cv_state::PagePresence;
use cv_state::placeholder::find_tokens;

/// Elements whose height is subtracted when scrolling to a section
/// (sticky headers and the like)
pub const SCROLL_OFFSET_ATTR: &str = "data-cv-scroll-offset";

const TOGGLE_TAG: &str = "cv-toggle";
const TOGGLE_ATTR: &str = "toggle-id";
const TABGROUP_TAG: &str = "cv-tabgroup";
const TABGROUP_ATTR: &str = "group-id";

/// Toggles, tab groups and placeholder tokens present on the page
///
/// Subtrees marked `data-cv-share-ignore` are skipped. A `toggle-id` may
/// list several ids separated by spaces or commas.
pub fn page_presence(doc: &Document) -> PagePresence {
    let tree = doc.tree();
    let mut presence = PagePresence::default();
    let mut stack = vec![NodeId::ROOT];

    while let Some(id) = stack.pop() {
        let Some(node) = tree.get(id) else {
            continue;
        };
        match &node.data {
            NodeData::Element(elem) => {
                if elem.has_attr(SHARE_IGNORE_ATTR) {
                    continue;
                }
                match elem.tag.as_str() {
                    TOGGLE_TAG => {
                        let ids = elem.get_attr(TOGGLE_ATTR).unwrap_or_default();
                        presence.toggles.extend(
                            ids.split(|c: char| c == ',' || c.is_whitespace())
                                .filter(|s| !s.is_empty())
                                .map(str::to_string),
                        );
                    }
                    TABGROUP_TAG => {
                        if let Some(group) = elem.get_attr(TABGROUP_ATTR).filter(|g| !g.is_empty()) {
                            presence.tab_groups.insert(group.to_string());
                        }
                    }
                    _ => {}
                }
            }
            NodeData::Text(text) => {
                presence.placeholders.extend(find_tokens(text).map(str::to_string));
                continue;
            }
            NodeData::Document => {}
            NodeData::Comment(_) => continue,
        }
        let children: Vec<NodeId> = tree.children(id).map(|(c, _)| c).collect();
        stack.extend(children.into_iter().rev());
    }

    tracing::debug!(
        "Page scan: {} toggles, {} tab groups, {} placeholders",
        presence.toggles.len(),
        presence.tab_groups.len(),
        presence.placeholders.len()
    );
    presence
}

/// Combined height of the page's scroll obstructions
pub fn scroll_offset(doc: &Document, get_rect: impl Fn(NodeId) -> Option<DOMRect>) -> f64 {
    let tree = doc.tree();
    tree.descendants(NodeId::ROOT)
        .into_iter()
        .filter(|&n| tree.has_attr(n, SCROLL_OFFSET_ATTR))
        .filter_map(get_rect)
        .map(|r| r.height.max(0.0))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> std::collections::BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_presence_scan() {
        let mut doc = Document::default();
        let body = doc.body();
        doc.append_element(body, "cv-toggle", &[("toggle-id", "advanced, beta")]);
        let group = doc.append_element(body, "cv-tabgroup", &[("group-id", "os")]);
        let p = doc.append_element(group, "p", &[]);
        doc.append_text(p, "Run [[shell]] as [[ user ]]");

        let ignored = doc.append_element(body, "aside", &[(SHARE_IGNORE_ATTR, "")]);
        doc.append_element(ignored, "cv-toggle", &[("toggle-id", "secret")]);
        doc.append_text(ignored, "[[hidden]]");
        doc.append_element(body, "cv-tabgroup", &[]);

        let presence = page_presence(&doc);
        assert_eq!(presence.toggles, set(&["advanced", "beta"]));
        assert_eq!(presence.tab_groups, set(&["os"]));
        assert_eq!(presence.placeholders, set(&["shell", "user"]));
    }

    #[test]
    fn test_scroll_offset_sums_heights() {
        let mut doc = Document::default();
        let body = doc.body();
        let header = doc.append_element(body, "header", &[(SCROLL_OFFSET_ATTR, "")]);
        let banner = doc.append_element(body, "div", &[(SCROLL_OFFSET_ATTR, "")]);
        doc.append_element(body, "main", &[]);

        let offset = scroll_offset(&doc, |n| match n {
            n if n == header => Some(DOMRect::from_xywh(0.0, 0.0, 800.0, 64.0)),
            n if n == banner => Some(DOMRect::from_xywh(0.0, 64.0, 800.0, 30.0)),
            _ => Some(DOMRect::from_xywh(0.0, 0.0, 800.0, 500.0)),
        });
        assert_eq!(offset, 94.0);
    }
}
