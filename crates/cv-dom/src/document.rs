//! Document - High-level document API

use crate::{DomTree, NodeId};

/// HTML Document
#[derive(Debug, Clone)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Document URL
    url: String,
    html_element: NodeId,
    head_element: NodeId,
    body_element: NodeId,
}

impl Document {
    /// Create a new document with `<html><head/><body/></html>`
    pub fn new(url: &str) -> Self {
        let mut tree = DomTree::new();

        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        tree.append_child(tree.root(), html);
        tree.append_child(html, head);
        tree.append_child(html, body);
        // Skeleton construction is not a page change
        tree.take_mutations();

        Self {
            tree,
            url: url.to_string(),
            html_element: html,
            head_element: head,
            body_element: body,
        }
    }

    /// Get document URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Navigate in place (history.replaceState)
    pub fn set_url(&mut self, url: &str) {
        self.url = url.to_string();
    }

    /// Get <html> element
    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    /// Get <head> element
    pub fn head(&self) -> NodeId {
        self.head_element
    }

    /// Get <body> element
    pub fn body(&self) -> NodeId {
        self.body_element
    }

    /// First element with the given id
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree.elements_with_id(id).into_iter().next()
    }

    /// Every element with the given id (ids are not always unique in the wild)
    pub fn get_elements_by_id(&self, id: &str) -> Vec<NodeId> {
        self.tree.elements_with_id(id)
    }

    /// Content of `<meta name=... content=...>` in the head
    pub fn meta_content(&self, name: &str) -> Option<&str> {
        self.tree
            .elements_by_tag(self.head_element, "meta")
            .into_iter()
            .find(|&m| self.tree.get_attr(m, "name") == Some(name))
            .and_then(|m| self.tree.get_attr(m, "content"))
    }

    /// Create an element with attributes and append it to `parent`
    pub fn append_element(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let elem = self.tree.create_element(tag);
        for (name, value) in attrs {
            self.tree.set_attr(elem, name, value);
        }
        self.tree.append_child(parent, elem);
        elem
    }

    /// Create a text node and append it to `parent`
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let node = self.tree.create_text(text);
        self.tree.append_child(parent, node);
        node
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Access the DOM tree mutably
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}
