use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use super::headline::Headline;
use super::span::SourceSpan;

/// Identity of a node within an edit session.
///
/// Assigned once at construction; a cloned node keeps the id of its
/// original, so clones must not be inserted back into the same tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub Uuid);

impl NodeId {
    pub fn new() -> Self {
        NodeId(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Document,
    Heading,
}

/// A node in the outline tree: either the document root or a heading with
/// its body and nested headings.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Heading depth 1..=6. Always 0 for the document root.
    pub depth: usize,
    /// Content lines (excluding property lines)
    pub content: Vec<String>,
    /// `KEY: [value]` properties, emitted in key order
    pub properties: BTreeMap<String, String>,
    /// Nested headings, in document order
    pub children: Vec<Node>,

    // --- Source tracking ---
    /// The heading line exactly as it appeared in the source
    pub raw_heading: Option<String>,
    /// Parsed heading fields (None for the document root)
    pub headline: Option<Headline>,
    /// Inclusive 1-based line range in the original text; stale after edits
    pub source_lines: Option<SourceSpan>,
    /// Whether the heading must be rebuilt from `headline` on output
    pub dirty: bool,
}

impl Node {
    /// An empty document root
    pub fn document() -> Self {
        Node {
            id: NodeId::new(),
            kind: NodeKind::Document,
            depth: 0,
            content: Vec::new(),
            properties: BTreeMap::new(),
            children: Vec::new(),
            raw_heading: None,
            headline: None,
            source_lines: None,
            dirty: false,
        }
    }

    /// A heading parsed from source text; starts clean.
    pub fn parsed_heading(depth: usize, raw: String, headline: Headline) -> Self {
        Node {
            id: NodeId::new(),
            kind: NodeKind::Heading,
            depth,
            content: Vec::new(),
            properties: BTreeMap::new(),
            children: Vec::new(),
            raw_heading: Some(raw),
            headline: Some(headline),
            source_lines: None,
            dirty: false,
        }
    }

    /// A heading with no source line; always dirty.
    pub fn new_heading(depth: usize, headline: Headline) -> Self {
        Node {
            id: NodeId::new(),
            kind: NodeKind::Heading,
            depth,
            content: Vec::new(),
            properties: BTreeMap::new(),
            children: Vec::new(),
            raw_heading: None,
            headline: Some(headline),
            source_lines: None,
            dirty: true,
        }
    }

    pub fn is_document(&self) -> bool {
        self.kind == NodeKind::Document
    }

    pub fn is_heading(&self) -> bool {
        self.kind == NodeKind::Heading
    }

    /// Mark this node as dirty (heading will be rebuilt from its fields)
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn state(&self) -> Option<&str> {
        self.headline.as_ref().and_then(|h| h.state.as_deref())
    }

    pub fn free_text(&self) -> Option<&str> {
        self.headline.as_ref().map(|h| h.free_text.as_str())
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Number of headings in this subtree, excluding `self`.
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| 1 + c.descendant_count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_root_has_no_heading_fields() {
        let root = Node::document();
        assert!(root.is_document());
        assert_eq!(root.depth, 0);
        assert!(root.headline.is_none());
        assert!(root.raw_heading.is_none());
        assert!(!root.dirty);
    }

    #[test]
    fn test_new_heading_is_dirty() {
        let node = Node::new_heading(2, Headline::new("Plan trip"));
        assert!(node.is_heading());
        assert!(node.dirty);
        assert_eq!(node.free_text(), Some("Plan trip"));
    }

    #[test]
    fn test_ids_are_distinct() {
        let a = Node::document();
        let b = Node::document();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_descendant_count() {
        let mut root = Node::document();
        let mut parent = Node::new_heading(1, Headline::new("A"));
        parent.children.push(Node::new_heading(2, Headline::new("B")));
        root.children.push(parent);
        root.children.push(Node::new_heading(1, Headline::new("C")));
        assert_eq!(root.descendant_count(), 3);
    }
}
