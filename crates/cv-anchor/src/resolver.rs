//! Descriptor resolution
//!
//! Finds the live element a descriptor was captured from. Ids win outright;
//! otherwise candidates with the same tag are scored on text fingerprint and
//! position so that reordered or partially edited markup still resolves.

use cv_dom::{Document, NodeId};

use crate::{AnchorDescriptor, normalize_text, text_hash};

const SCORE_HASH: u32 = 50;
const SCORE_SNIPPET: u32 = 30;
const SCORE_INDEX: u32 = 10;
/// Hash and index both matched; nothing can beat it
const SCORE_PERFECT: u32 = SCORE_HASH + SCORE_INDEX;
/// A candidate must score strictly above this to be accepted
const SCORE_THRESHOLD: u32 = 30;

/// Resolve one descriptor to zero or more elements
///
/// More than one element is only returned for duplicated ids. An empty result
/// means the content moved or was removed; callers report it, never fail.
pub fn resolve(doc: &Document, root: NodeId, descriptor: &AnchorDescriptor) -> Vec<NodeId> {
    let tree = doc.tree();

    if let Some(id) = descriptor.id() {
        let found = doc.get_elements_by_id(id);
        if !found.is_empty() {
            return found;
        }
        if descriptor.is_id_only() {
            tracing::debug!("No element with id {:?}", id);
            return Vec::new();
        }
    } else if descriptor.is_id_only() {
        return Vec::new();
    }

    let scope = descriptor
        .parent_id
        .as_deref()
        .and_then(|pid| doc.get_element_by_id(pid))
        .unwrap_or(root);

    let candidates = tree.elements_by_tag(scope, &descriptor.tag);
    let fingerprint = |elem: NodeId| normalize_text(&tree.text_content(elem));

    // Fast path: structure unchanged since capture
    if let Some(&elem) = candidates.get(descriptor.index) {
        if text_hash(&fingerprint(elem)) == descriptor.text_hash {
            return vec![elem];
        }
    }

    let mut best: Option<(NodeId, u32)> = None;
    for (index, &elem) in candidates.iter().enumerate() {
        let text = fingerprint(elem);
        let mut score = 0;
        if text_hash(&text) == descriptor.text_hash {
            score += SCORE_HASH;
        } else if text.starts_with(&descriptor.text_snippet) {
            score += SCORE_SNIPPET;
        }
        if index == descriptor.index {
            score += SCORE_INDEX;
        }

        if best.is_none_or(|(_, s)| score > s) {
            best = Some((elem, score));
        }
        if score >= SCORE_PERFECT {
            break;
        }
    }

    match best {
        Some((elem, score)) if score > SCORE_THRESHOLD => vec![elem],
        _ => {
            tracing::debug!(
                "Anchor <{}>#{} ({:?}) not found",
                descriptor.tag,
                descriptor.index,
                descriptor.text_snippet
            );
            Vec::new()
        }
    }
}

/// Outcome of resolving a whole descriptor list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Matched elements, deduplicated, in descriptor order
    pub elements: Vec<NodeId>,
    /// Descriptors that matched nothing
    pub missing: Vec<AnchorDescriptor>,
}

impl Resolution {
    /// Nothing was asked for, or nothing matched
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Some descriptors could not be matched
    pub fn is_partial(&self) -> bool {
        !self.missing.is_empty()
    }
}

/// Resolve every descriptor against `root`
pub fn resolve_all(doc: &Document, root: NodeId, descriptors: &[AnchorDescriptor]) -> Resolution {
    let mut out = Resolution::default();
    for descriptor in descriptors {
        let found = resolve(doc, root, descriptor);
        if found.is_empty() {
            out.missing.push(descriptor.clone());
            continue;
        }
        for elem in found {
            if !out.elements.contains(&elem) {
                out.elements.push(elem);
            }
        }
    }
    if out.is_partial() {
        tracing::warn!(
            "{} of {} anchors could not be resolved",
            out.missing.len(),
            descriptors.len()
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_descriptor;

    /// body > div#main > p*n with the given texts
    fn page(texts: &[&str]) -> (Document, NodeId, Vec<NodeId>) {
        let mut doc = Document::default();
        let main = doc.append_element(doc.body(), "div", &[("id", "main")]);
        let ps = texts
            .iter()
            .map(|t| {
                let p = doc.append_element(main, "p", &[]);
                doc.append_text(p, t);
                p
            })
            .collect();
        (doc, main, ps)
    }

    #[test]
    fn test_resolve_unchanged_dom_returns_element() {
        let (doc, _, ps) = page(&["alpha", "beta", "gamma"]);
        for &p in &ps {
            let d = create_descriptor(&doc, p);
            assert_eq!(resolve(&doc, doc.body(), &d), vec![p]);
        }
    }

    #[test]
    fn test_resolve_prefers_id() {
        let mut doc = Document::default();
        let a = doc.append_element(doc.body(), "h2", &[("id", "install")]);
        let d = create_descriptor(&doc, a);
        // Move it somewhere else entirely
        let aside = doc.append_element(doc.body(), "aside", &[]);
        doc.tree_mut().append_child(aside, a);
        assert_eq!(resolve(&doc, doc.body(), &d), vec![a]);
    }

    #[test]
    fn test_duplicate_ids_return_all() {
        let mut doc = Document::default();
        let a = doc.append_element(doc.body(), "div", &[("id", "dup")]);
        let b = doc.append_element(doc.body(), "div", &[("id", "dup")]);
        let d = AnchorDescriptor::from_id("dup");
        assert_eq!(resolve(&doc, doc.body(), &d), vec![a, b]);
    }

    #[test]
    fn test_id_only_has_no_fallback() {
        let (doc, _, _) = page(&["alpha"]);
        assert!(resolve(&doc, doc.body(), &AnchorDescriptor::from_id("gone")).is_empty());
    }

    #[test]
    fn test_missing_id_falls_back_to_structure() {
        let (mut doc, _, ps) = page(&["alpha", "beta"]);
        doc.tree_mut().set_attr(ps[1], "id", "beta");
        let d = create_descriptor(&doc, ps[1]);
        doc.tree_mut().remove_attr(ps[1], "id");
        assert_eq!(resolve(&doc, doc.body(), &d), vec![ps[1]]);
    }

    #[test]
    fn test_drift_hash_beats_stale_index() {
        let (mut doc, main, ps) = page(&["alpha", "beta", "gamma"]);
        let d = create_descriptor(&doc, ps[2]);
        assert_eq!(d.index, 2);

        doc.tree_mut().remove_child(main, ps[0]);
        assert_eq!(resolve(&doc, doc.body(), &d), vec![ps[2]]);
    }

    #[test]
    fn test_edited_text_matches_on_snippet_and_index() {
        let (mut doc, _, ps) = page(&["Install the package", "Configure"]);
        let d = create_descriptor(&doc, ps[0]);
        let text = doc.tree().children(ps[0]).next().unwrap().0;
        doc.tree_mut().set_text(text, "Install the package with cargo");
        // snippet (30) + index (10) = 40 > 30
        assert_eq!(resolve(&doc, doc.body(), &d), vec![ps[0]]);
    }

    #[test]
    fn test_snippet_alone_is_not_enough() {
        let (mut doc, main, ps) = page(&["zero", "one", "Install the package"]);
        let d = create_descriptor(&doc, ps[2]);
        let text = doc.tree().children(ps[2]).next().unwrap().0;
        doc.tree_mut().set_text(text, "Install the package, then run it");
        // Move it to index 0 so neither hash nor index matches
        doc.tree_mut().insert_before(main, ps[2], Some(ps[0]));
        assert!(resolve(&doc, doc.body(), &d).is_empty());
    }

    #[test]
    fn test_rewritten_content_is_a_miss() {
        let (mut doc, _, ps) = page(&["alpha", "beta"]);
        let d = create_descriptor(&doc, ps[1]);
        let text = doc.tree().children(ps[1]).next().unwrap().0;
        doc.tree_mut().set_text(text, "completely different");
        // index only (10) <= 30
        assert!(resolve(&doc, doc.body(), &d).is_empty());
    }

    #[test]
    fn test_unknown_parent_scope_uses_root() {
        let (mut doc, main, ps) = page(&["alpha", "beta"]);
        let mut d = create_descriptor(&doc, ps[1]);
        d.parent_id = Some("renamed".to_string());
        let body = doc.body();
        let extra = doc.tree_mut().create_element("p");
        doc.tree_mut().insert_before(body, extra, Some(main));
        // Index within body no longer lines up, the hash still does
        assert_eq!(resolve(&doc, doc.body(), &d), vec![ps[1]]);
    }

    #[test]
    fn test_fast_path_false_positive_with_identical_text() {
        // Two siblings with the same text: the fast path accepts whatever sits
        // at the recorded index without comparing other candidates.
        let (mut doc, main, ps) = page(&["same", "same"]);
        let d = create_descriptor(&doc, ps[1]);
        doc.tree_mut().remove_child(main, ps[0]);
        let clone = doc.append_element(main, "p", &[]);
        doc.append_text(clone, "same");
        assert_eq!(resolve(&doc, doc.body(), &d), vec![clone]);
    }

    #[test]
    fn test_resolve_all_reports_missing() {
        let (doc, _, ps) = page(&["alpha", "beta"]);
        let ds = vec![
            create_descriptor(&doc, ps[0]),
            AnchorDescriptor::from_id("nope"),
            create_descriptor(&doc, ps[0]),
        ];
        let res = resolve_all(&doc, doc.body(), &ds);
        assert_eq!(res.elements, vec![ps[0]]);
        assert_eq!(res.missing, vec![AnchorDescriptor::from_id("nope")]);
        assert!(res.is_partial());
    }
}
