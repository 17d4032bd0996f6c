//! Hidden-set computation
//!
//! Keeps every target and its ancestor chain up to the root, and hides the
//! element siblings along that chain. Descendants of a target are never
//! touched, even when another target sits inside it.

use std::collections::BTreeSet;

use cv_dom::{DomTree, NodeId};

/// Elements carrying this attribute are never hidden or offered for sharing
pub const SHARE_IGNORE_ATTR: &str = "data-cv-share-ignore";

/// Elements the planner must leave alone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionRules {
    /// Lowercase tag names
    tags: Vec<String>,
    ids: Vec<String>,
}

impl ExclusionRules {
    pub fn new<S: AsRef<str>>(tags: &[S], ids: &[S]) -> Self {
        Self {
            tags: tags.iter().map(|t| t.as_ref().to_ascii_lowercase()).collect(),
            ids: ids.iter().map(|i| i.as_ref().to_string()).collect(),
        }
    }

    /// Excluded by tag, by id, or by `data-cv-share-ignore` on itself or an
    /// ancestor
    pub fn is_excluded(&self, tree: &DomTree, node: NodeId) -> bool {
        if let Some(tag) = tree.tag_name(node) {
            if self.tags.iter().any(|t| t == tag) {
                return true;
            }
        }
        if let Some(id) = tree.element_id(node) {
            if self.ids.iter().any(|i| i == id) {
                return true;
            }
        }
        std::iter::once(node)
            .chain(tree.ancestors(node))
            .any(|n| tree.has_attr(n, SHARE_IGNORE_ATTR))
    }
}

/// Siblings to hide so that only `targets` remain visible under `root`
///
/// Targets outside `root` are ignored. An empty target list hides nothing.
pub fn determine_hidden_elements(
    tree: &DomTree,
    targets: &[NodeId],
    root: NodeId,
    is_excluded: impl Fn(NodeId) -> bool,
) -> BTreeSet<NodeId> {
    let targets: BTreeSet<NodeId> = targets
        .iter()
        .copied()
        .filter(|&t| {
            let inside = tree.contains(root, t);
            if !inside {
                tracing::debug!("Ignoring focus target {:?} outside the root", t);
            }
            inside
        })
        .collect();
    if targets.is_empty() {
        return BTreeSet::new();
    }

    let mut keep = BTreeSet::new();
    for &target in &targets {
        keep.insert(target);
        if target == root {
            continue;
        }
        for ancestor in tree.ancestors(target) {
            keep.insert(ancestor);
            if ancestor == root {
                break;
            }
        }
    }

    let under_target = |node: NodeId| {
        tree.ancestors(node)
            .take_while(|&a| a != root)
            .any(|a| targets.contains(&a))
    };

    let mut hidden = BTreeSet::new();
    for &parent in &keep {
        // Parent dominance
        if targets.contains(&parent) || (parent != root && under_target(parent)) {
            continue;
        }
        for child in tree.element_children(parent) {
            if !keep.contains(&child) && !is_excluded(child) {
                hidden.insert(child);
            }
        }
    }
    hidden
}

#[cfg(test)]
mod tests {
    use super::*;
    use cv_dom::Document;

    /// body > [header, main > [h1, p, p, section > [p, p]], footer]
    struct Page {
        doc: Document,
        header: NodeId,
        main: NodeId,
        h1: NodeId,
        p1: NodeId,
        p2: NodeId,
        section: NodeId,
        sp1: NodeId,
        sp2: NodeId,
        footer: NodeId,
    }

    fn page() -> Page {
        let mut doc = Document::default();
        let body = doc.body();
        let header = doc.append_element(body, "header", &[]);
        let main = doc.append_element(body, "main", &[]);
        let h1 = doc.append_element(main, "h1", &[]);
        let p1 = doc.append_element(main, "p", &[]);
        doc.append_text(main, "loose text");
        let p2 = doc.append_element(main, "p", &[]);
        let section = doc.append_element(main, "section", &[]);
        let sp1 = doc.append_element(section, "p", &[]);
        let sp2 = doc.append_element(section, "p", &[]);
        let footer = doc.append_element(body, "footer", &[]);
        Page { doc, header, main, h1, p1, p2, section, sp1, sp2, footer }
    }

    fn set(ids: &[NodeId]) -> BTreeSet<NodeId> {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_hides_siblings_along_chain() {
        let p = page();
        let tree = p.doc.tree();
        let hidden = determine_hidden_elements(tree, &[p.sp1], p.doc.body(), |_| false);
        assert_eq!(hidden, set(&[p.header, p.footer, p.h1, p.p1, p.p2, p.sp2]));
        assert!(!hidden.contains(&p.main));
        assert!(!hidden.contains(&p.section));
    }

    #[test]
    fn test_parent_dominance() {
        let p = page();
        let tree = p.doc.tree();
        // section and one of its children: the other child stays visible
        let hidden = determine_hidden_elements(tree, &[p.section, p.sp1], p.doc.body(), |_| false);
        assert_eq!(hidden, set(&[p.header, p.footer, p.h1, p.p1, p.p2]));
        assert!(!hidden.contains(&p.sp2));
    }

    #[test]
    fn test_target_is_root() {
        let p = page();
        let hidden = determine_hidden_elements(p.doc.tree(), &[p.main], p.main, |_| false);
        assert!(hidden.is_empty());
    }

    #[test]
    fn test_excluded_siblings_stay() {
        let p = page();
        let tree = p.doc.tree();
        let hidden = determine_hidden_elements(tree, &[p.p1], p.doc.body(), |n| {
            n == p.header || n == p.section
        });
        assert_eq!(hidden, set(&[p.footer, p.h1, p.p2]));
    }

    #[test]
    fn test_no_targets_hides_nothing() {
        let p = page();
        let outside = p.doc.head();
        assert!(determine_hidden_elements(p.doc.tree(), &[], p.doc.body(), |_| false).is_empty());
        assert!(determine_hidden_elements(p.doc.tree(), &[outside], p.doc.body(), |_| false).is_empty());
    }

    #[test]
    fn test_exclusion_rules() {
        let mut p = page();
        p.doc.tree_mut().set_attr(p.footer, "id", "site-footer");
        p.doc.tree_mut().set_attr(p.section, SHARE_IGNORE_ATTR, "");
        let rules = ExclusionRules::new(&["HEADER"], &["site-footer"]);
        let tree = p.doc.tree();
        assert!(rules.is_excluded(tree, p.header));
        assert!(rules.is_excluded(tree, p.footer));
        assert!(rules.is_excluded(tree, p.section));
        assert!(rules.is_excluded(tree, p.sp2));
        assert!(!rules.is_excluded(tree, p.p1));
        assert!(!rules.is_excluded(tree, p.main));
    }
}
