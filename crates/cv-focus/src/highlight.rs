//! Highlight rectangles
//!
//! Targets that sit next to each other under one parent share a single
//! overlay box. Adjacency follows the parent's real element order, so a
//! non-target sibling between two targets splits the box.

use std::collections::{BTreeMap, BTreeSet};

use cv_dom::{DOMRect, DomTree, NodeId};

/// Space between a highlighted element and its box
pub const HIGHLIGHT_PADDING: f64 = 10.0;

/// Targets bucketed by parent, each bucket in document order
pub fn group_by_parent(tree: &DomTree, targets: &[NodeId]) -> BTreeMap<NodeId, Vec<NodeId>> {
    let mut groups: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
    for &target in targets {
        let Some(parent) = tree.parent(target) else {
            continue;
        };
        groups.entry(parent).or_default().push(target);
    }
    for (parent, members) in groups.iter_mut() {
        let order = tree.element_children(*parent);
        members.sort_by_key(|m| order.iter().position(|c| c == m));
        members.dedup();
    }
    groups
}

/// Padded document-space boxes for the targets
///
/// `get_rect` returns viewport rects (`None` or empty for unrendered
/// elements, which neither contribute nor split a run); `get_scroll` returns
/// the scroll offset added to move them into document space.
pub fn calculate_merged_rects(
    tree: &DomTree,
    groups_by_parent: &BTreeMap<NodeId, Vec<NodeId>>,
    get_rect: impl Fn(NodeId) -> Option<DOMRect>,
    get_scroll: impl Fn() -> (f64, f64),
) -> Vec<DOMRect> {
    let (scroll_x, scroll_y) = get_scroll();
    let finish = |r: DOMRect| r.translate(scroll_x, scroll_y).inflate(HIGHLIGHT_PADDING);

    let mut rects = Vec::new();
    for (&parent, members) in groups_by_parent {
        let members: BTreeSet<NodeId> = members.iter().copied().collect();
        let mut current: Option<DOMRect> = None;

        for child in tree.element_children(parent) {
            if !members.contains(&child) {
                rects.extend(current.take().map(finish));
                continue;
            }
            let Some(rect) = get_rect(child).filter(|r| !r.is_empty()) else {
                continue;
            };
            current = Some(match current {
                Some(acc) => acc.union(&rect),
                None => rect,
            });
        }
        rects.extend(current.map(finish));
    }
    rects
}

#[cfg(test)]
mod tests {
    use super::*;
    use cv_dom::Document;

    /// body > div > p*5, each 100x20 stacked vertically
    fn page() -> (Document, Vec<NodeId>) {
        let mut doc = Document::default();
        let div = doc.append_element(doc.body(), "div", &[]);
        let ps = (0..5).map(|_| doc.append_element(div, "p", &[])).collect();
        (doc, ps)
    }

    fn rect_of(ps: &[NodeId]) -> impl Fn(NodeId) -> Option<DOMRect> + '_ {
        move |n| {
            let i = ps.iter().position(|&p| p == n)?;
            Some(DOMRect::from_xywh(0.0, i as f64 * 20.0, 100.0, 20.0))
        }
    }

    #[test]
    fn test_adjacent_targets_merge() {
        let (doc, ps) = page();
        let groups = group_by_parent(doc.tree(), &[ps[2], ps[1]]);
        let rects = calculate_merged_rects(doc.tree(), &groups, rect_of(&ps), || (0.0, 0.0));
        assert_eq!(rects, vec![DOMRect::from_xywh(-10.0, 10.0, 120.0, 60.0)]);
    }

    #[test]
    fn test_gap_splits_rects() {
        let (doc, ps) = page();
        let groups = group_by_parent(doc.tree(), &[ps[0], ps[2]]);
        let rects = calculate_merged_rects(doc.tree(), &groups, rect_of(&ps), || (0.0, 0.0));
        assert_eq!(rects, vec![
            DOMRect::from_xywh(-10.0, -10.0, 120.0, 40.0),
            DOMRect::from_xywh(-10.0, 30.0, 120.0, 40.0),
        ]);
    }

    #[test]
    fn test_scroll_moves_into_document_space() {
        let (doc, ps) = page();
        let groups = group_by_parent(doc.tree(), &[ps[4]]);
        let rects = calculate_merged_rects(doc.tree(), &groups, rect_of(&ps), || (5.0, 300.0));
        assert_eq!(rects, vec![DOMRect::from_xywh(-5.0, 370.0, 120.0, 40.0)]);
    }

    #[test]
    fn test_unrendered_target_does_not_split() {
        let (doc, ps) = page();
        let groups = group_by_parent(doc.tree(), &[ps[0], ps[1], ps[2]]);
        let rects = calculate_merged_rects(
            doc.tree(),
            &groups,
            |n| if n == ps[1] { Some(DOMRect::default()) } else { rect_of(&ps)(n) },
            || (0.0, 0.0),
        );
        assert_eq!(rects.len(), 1);
        assert_eq!(rects[0].height, 80.0);
    }

    #[test]
    fn test_separate_parents_separate_rects() {
        let mut doc = Document::default();
        let a = doc.append_element(doc.body(), "div", &[]);
        let b = doc.append_element(doc.body(), "div", &[]);
        let pa = doc.append_element(a, "p", &[]);
        let pb = doc.append_element(b, "p", &[]);
        let groups = group_by_parent(doc.tree(), &[pb, pa]);
        assert_eq!(groups.len(), 2);
        let rects = calculate_merged_rects(
            doc.tree(),
            &groups,
            |_| Some(DOMRect::from_xywh(0.0, 0.0, 10.0, 10.0)),
            || (0.0, 0.0),
        );
        assert_eq!(rects.len(), 2);
    }
}
