//! Focus links
//!
//! `cv-show`, `cv-hide` and `cv-highlight` carry anchor descriptors for the
//! sections a link is about. They live outside the managed state parameters
//! and are form-encoded, since a descriptor blob may contain `+`, `/` and `=`.

use std::collections::{BTreeMap, BTreeSet};

use cv_anchor::AnchorDescriptor;
use cv_dom::{DOMRect, Document, DomTree, NodeId};
use cv_focus::{DividerGroup, calculate_divider_groups, calculate_merged_rects, determine_hidden_elements, group_by_parent};
use url::Url;
use url::form_urlencoded::byte_serialize;

/// What a focus link does with its sections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusMode {
    /// Show only these sections
    Show,
    /// Hide these sections
    Hide,
    /// Draw a box around these sections
    Highlight,
}

impl FocusMode {
    /// In the order links are checked
    pub const ALL: [FocusMode; 3] = [FocusMode::Show, FocusMode::Hide, FocusMode::Highlight];

    pub fn param(self) -> &'static str {
        match self {
            FocusMode::Show => "cv-show",
            FocusMode::Hide => "cv-hide",
            FocusMode::Highlight => "cv-highlight",
        }
    }

    fn from_param(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.param() == name)
    }
}

/// `base` with a focus parameter for `elements`
///
/// Any focus parameter already on `base` is replaced; everything else in the
/// query is kept verbatim. No elements means no focus parameter.
pub fn focus_link(doc: &Document, mode: FocusMode, elements: &[NodeId], base: &str) -> crate::Result<String> {
    let mut url = Url::parse(base)?;

    let query = url.query().unwrap_or_default().to_string();
    let mut pairs: Vec<String> = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let key = pair.split_once('=').map_or(*pair, |(k, _)| k);
            FocusMode::from_param(key).is_none()
        })
        .map(str::to_string)
        .collect();

    if !elements.is_empty() {
        let descriptors: Vec<AnchorDescriptor> = elements
            .iter()
            .map(|&e| cv_anchor::create_descriptor(doc, e))
            .collect();
        let value: String = byte_serialize(cv_anchor::serialize(&descriptors).as_bytes()).collect();
        pairs.push(format!("{}={}", mode.param(), value));
    }

    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.set_query(Some(&pairs.join("&")));
    }
    Ok(url.to_string())
}

/// The first focus parameter on `url` with its decoded descriptors
pub fn read_focus_param(url: &str) -> Option<(FocusMode, Vec<AnchorDescriptor>)> {
    let parsed = Url::parse(url).ok()?;
    for mode in FocusMode::ALL {
        let value = parsed
            .query_pairs()
            .find(|(key, _)| key == mode.param())
            .map(|(_, value)| value.into_owned());
        if let Some(value) = value {
            let descriptors = cv_anchor::deserialize(&value);
            if !descriptors.is_empty() {
                return Some((mode, descriptors));
            }
        }
    }
    None
}

/// What to do to the page for a focus link
#[derive(Debug, Clone, PartialEq)]
pub struct FocusPlan {
    pub mode: FocusMode,
    /// Resolved sections, deduplicated, in link order
    pub targets: Vec<NodeId>,
    pub hidden: BTreeSet<NodeId>,
    /// Collapsed runs of hidden siblings, by parent
    pub dividers: BTreeMap<NodeId, Vec<DividerGroup>>,
    /// Descriptors that matched nothing
    pub missing: usize,
}

impl FocusPlan {
    /// Overlay boxes for highlight mode (empty in the other modes)
    pub fn highlight_rects(
        &self,
        tree: &DomTree,
        get_rect: impl Fn(NodeId) -> Option<DOMRect>,
        get_scroll: impl Fn() -> (f64, f64),
    ) -> Vec<DOMRect> {
        if self.mode != FocusMode::Highlight {
            return Vec::new();
        }
        let groups = group_by_parent(tree, &self.targets);
        calculate_merged_rects(tree, &groups, get_rect, get_scroll)
    }

    /// Reveal one divider's run; returns the nodes to un-hide
    pub fn expand_divider(&mut self, tree: &DomTree, parent: NodeId, index: usize) -> Vec<NodeId> {
        let Some(groups) = self.dividers.get_mut(&parent) else {
            return Vec::new();
        };
        if index >= groups.len() {
            return Vec::new();
        }
        let group = groups.remove(index);
        if groups.is_empty() {
            self.dividers.remove(&parent);
        }
        let nodes = group.nodes(tree);
        for node in &nodes {
            self.hidden.remove(node);
        }
        nodes
    }
}

/// Resolve `descriptors` and plan the page for `mode`
///
/// `None` when nothing resolves; the caller then leaves the page alone.
pub fn plan_focus(
    doc: &Document,
    mode: FocusMode,
    descriptors: &[AnchorDescriptor],
    is_excluded: impl Fn(NodeId) -> bool,
) -> Option<FocusPlan> {
    let tree = doc.tree();
    let resolution = cv_anchor::resolve_all(doc, doc.body(), descriptors);
    if resolution.is_empty() {
        tracing::warn!("No focus target could be resolved; leaving the page as is");
        return None;
    }
    let targets = resolution.elements;

    let hidden: BTreeSet<NodeId> = match mode {
        FocusMode::Show => determine_hidden_elements(tree, &targets, doc.body(), &is_excluded),
        FocusMode::Hide => targets.iter().copied().filter(|&t| !is_excluded(t)).collect(),
        FocusMode::Highlight => BTreeSet::new(),
    };

    let parents: BTreeSet<NodeId> = hidden.iter().filter_map(|&n| tree.parent(n)).collect();
    let dividers = parents
        .into_iter()
        .map(|parent| {
            let children = tree.element_children(parent);
            (parent, calculate_divider_groups(&children, |n| hidden.contains(&n)))
        })
        .collect();

    tracing::debug!(
        "Focus plan ({:?}): {} targets, {} hidden, {} missing",
        mode,
        targets.len(),
        hidden.len(),
        resolution.missing.len()
    );
    Some(FocusPlan { mode, targets, hidden, dividers, missing: resolution.missing.len() })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// body > main#docs > [h2, p, p, p, pre]
    fn page() -> (Document, Vec<NodeId>) {
        let mut doc = Document::new("https://docs.example/guide");
        let main = doc.append_element(doc.body(), "main", &[("id", "docs")]);
        let nodes = [("h2", "Install"), ("p", "one"), ("p", "two"), ("p", "three"), ("pre", "cargo")]
            .iter()
            .map(|(tag, text)| {
                let el = doc.append_element(main, tag, &[]);
                doc.append_text(el, text);
                el
            })
            .collect();
        (doc, nodes)
    }

    #[test]
    fn test_link_round_trip() {
        let (doc, n) = page();
        let link = focus_link(&doc, FocusMode::Show, &[n[1], n[3]], "https://docs.example/guide?t-show=a%2Cb").unwrap();
        assert!(link.contains("t-show=a%2Cb&cv-show="));

        let (mode, descriptors) = read_focus_param(&link).unwrap();
        assert_eq!(mode, FocusMode::Show);
        assert_eq!(descriptors.len(), 2);
        let plan = plan_focus(&doc, mode, &descriptors, |_| false).unwrap();
        assert_eq!(plan.targets, vec![n[1], n[3]]);
        assert_eq!(plan.missing, 0);
    }

    #[test]
    fn test_new_link_replaces_old_focus_param() {
        let (doc, n) = page();
        let first = focus_link(&doc, FocusMode::Hide, &[n[0]], "https://docs.example/guide").unwrap();
        let second = focus_link(&doc, FocusMode::Highlight, &[n[4]], &first).unwrap();
        assert!(!second.contains("cv-hide"));
        assert_eq!(read_focus_param(&second).unwrap().0, FocusMode::Highlight);

        let cleared = focus_link(&doc, FocusMode::Show, &[], &second).unwrap();
        assert_eq!(cleared, "https://docs.example/guide");
    }

    #[test]
    fn test_id_links() {
        let (mut doc, n) = page();
        doc.tree_mut().set_attr(n[4], "id", "build");
        let link = focus_link(&doc, FocusMode::Hide, &[n[4]], "https://docs.example/guide").unwrap();
        assert!(link.ends_with("?cv-hide=build"));

        let (_, descriptors) = read_focus_param(&link).unwrap();
        let plan = plan_focus(&doc, FocusMode::Hide, &descriptors, |_| false).unwrap();
        assert_eq!(plan.hidden, BTreeSet::from([n[4]]));
    }

    #[test]
    fn test_show_plan_dividers_and_expand() {
        let (doc, n) = page();
        let descriptors: Vec<_> = [n[2]].iter().map(|&e| cv_anchor::create_descriptor(&doc, e)).collect();
        let mut plan = plan_focus(&doc, FocusMode::Show, &descriptors, |_| false).unwrap();
        assert_eq!(plan.hidden, BTreeSet::from([n[0], n[1], n[3], n[4]]));

        let main = doc.tree().parent(n[0]).unwrap();
        let groups = &plan.dividers[&main];
        assert_eq!(groups.len(), 2);
        assert_eq!((groups[0].start_node, groups[0].count), (n[0], 2));
        assert_eq!((groups[1].start_node, groups[1].count), (n[3], 2));

        assert_eq!(plan.expand_divider(doc.tree(), main, 0), vec![n[0], n[1]]);
        assert_eq!(plan.hidden, BTreeSet::from([n[3], n[4]]));
        assert_eq!(plan.dividers[&main].len(), 1);
        assert!(plan.expand_divider(doc.tree(), main, 5).is_empty());
    }

    #[test]
    fn test_highlight_rects_only_in_highlight_mode() {
        let (doc, n) = page();
        let descriptors: Vec<_> = [n[1], n[2]].iter().map(|&e| cv_anchor::create_descriptor(&doc, e)).collect();
        let rect = |_: NodeId| Some(DOMRect::from_xywh(0.0, 0.0, 10.0, 10.0));

        let plan = plan_focus(&doc, FocusMode::Highlight, &descriptors, |_| false).unwrap();
        assert!(plan.hidden.is_empty());
        assert_eq!(plan.highlight_rects(doc.tree(), rect, || (0.0, 0.0)).len(), 1);

        let plan = plan_focus(&doc, FocusMode::Show, &descriptors, |_| false).unwrap();
        assert!(plan.highlight_rects(doc.tree(), rect, || (0.0, 0.0)).is_empty());
    }

    #[test]
    fn test_nothing_resolves() {
        let (doc, _) = page();
        let descriptors = vec![AnchorDescriptor::from_id("gone")];
        assert!(plan_focus(&doc, FocusMode::Show, &descriptors, |_| false).is_none());
        assert!(read_focus_param("https://docs.example/guide?cv-show=").is_none());
    }
}
