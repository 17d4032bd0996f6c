//! Collapsible dividers
//!
//! Consecutive hidden siblings collapse into one "N sections hidden" divider.

use cv_dom::{DomTree, NodeId};

/// One run of hidden siblings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DividerGroup {
    /// Where the divider goes: the first visible sibling after the run, or
    /// `start_node` when the run ends the list
    pub insert_before: NodeId,
    /// First hidden node of the run
    pub start_node: NodeId,
    pub count: usize,
}

impl DividerGroup {
    /// Whether the run reaches the end of its parent
    pub fn is_trailing(&self) -> bool {
        self.insert_before == self.start_node
    }

    /// The hidden nodes of this run: `count` element siblings from
    /// `start_node`, which is what expanding the divider reveals
    pub fn nodes(&self, tree: &DomTree) -> Vec<NodeId> {
        std::iter::successors(Some(self.start_node), |&n| tree.next_element_sibling(n))
            .take(self.count)
            .collect()
    }
}

/// Group maximal runs of hidden nodes in a flat child list
///
/// A run that reaches the end of the list still yields a group, anchored at
/// its own first node (`is_trailing`). `[H,H,V,H,V,V,H]` gives three groups:
/// two inner ones and the trailing one.
pub fn calculate_divider_groups(
    children: &[NodeId],
    is_hidden: impl Fn(NodeId) -> bool,
) -> Vec<DividerGroup> {
    let mut groups = Vec::new();
    let mut run: Option<(NodeId, usize)> = None;

    for &child in children {
        if is_hidden(child) {
            run.get_or_insert((child, 0)).1 += 1;
        } else if let Some((start_node, count)) = run.take() {
            groups.push(DividerGroup { insert_before: child, start_node, count });
        }
    }
    if let Some((start_node, count)) = run {
        groups.push(DividerGroup { insert_before: start_node, start_node, count });
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use cv_dom::Document;

    fn list(pattern: &str) -> (Document, Vec<NodeId>, Vec<NodeId>) {
        let mut doc = Document::default();
        let body = doc.body();
        let mut hidden = Vec::new();
        let children = pattern
            .chars()
            .map(|c| {
                let el = doc.append_element(body, "section", &[]);
                if c == 'H' {
                    hidden.push(el);
                }
                el
            })
            .collect();
        (doc, children, hidden)
    }

    #[test]
    fn test_groups_for_mixed_runs() {
        let (_, c, hidden) = list("HHVHVVH");
        let groups = calculate_divider_groups(&c, |n| hidden.contains(&n));

        let inner: Vec<_> = groups.iter().filter(|g| !g.is_trailing()).collect();
        assert_eq!(inner.len(), 2);
        assert_eq!(*inner[0], DividerGroup { insert_before: c[2], start_node: c[0], count: 2 });
        assert_eq!(*inner[1], DividerGroup { insert_before: c[4], start_node: c[3], count: 1 });

        // The run ending the list is anchored at itself
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[2], DividerGroup { insert_before: c[6], start_node: c[6], count: 1 });
    }

    #[test]
    fn test_no_hidden_no_groups() {
        let (_, c, _) = list("VVV");
        assert!(calculate_divider_groups(&c, |_| false).is_empty());
        assert!(calculate_divider_groups(&[], |_| true).is_empty());
    }

    #[test]
    fn test_all_hidden_is_one_trailing_group() {
        let (_, c, _) = list("HHHH");
        let groups = calculate_divider_groups(&c, |_| true);
        assert_eq!(groups, vec![DividerGroup { insert_before: c[0], start_node: c[0], count: 4 }]);
    }

    #[test]
    fn test_expanding_reveals_only_its_run() {
        let (doc, c, hidden) = list("VHHVHH");
        let groups = calculate_divider_groups(&c, |n| hidden.contains(&n));
        assert_eq!(groups[0].nodes(doc.tree()), vec![c[1], c[2]]);
        assert_eq!(groups[1].nodes(doc.tree()), vec![c[4], c[5]]);
    }
}
