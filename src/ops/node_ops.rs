use crate::model::headline::{Headline, Timestamp};
use crate::model::node::{Node, NodeId};
use crate::ops::transition::TransitionHooks;
use crate::parse::headline_parser::{MAX_DEPTH, is_valid_tag};
use crate::parse::property::{is_valid_property_key, is_valid_property_value};
use crate::parse::tree_serializer::{format_heading, reads_back};

/// Error type for node operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeError {
    #[error("operation needs a heading, not the document root")]
    NotAHeading,
    #[error("node not found: {0}")]
    NotFound(NodeId),
    #[error("invalid position: {0}")]
    InvalidPosition(String),
    #[error("depth would leave the range 1..={max}: {depth}", max = MAX_DEPTH)]
    InvalidDepth { depth: isize },
    #[error("cannot move a node into its own subtree")]
    CycleDetected,
    #[error("invalid property key: {0:?} (expected [A-Z_]+)")]
    InvalidPropertyKey(String),
    #[error("invalid value for property {key}: {value:?}")]
    InvalidPropertyValue { key: String, value: String },
    #[error("invalid tag: {0:?} (expected [A-Za-z0-9_-]+)")]
    InvalidTag(String),
    #[error("heading would not read back with the same fields: {0:?}")]
    Unreadable(String),
}

/// Where to put a child inside its parent's child list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertPosition {
    /// After the last child
    Append,
    /// 1-based slot; `len + 1` is the same as `Append`
    At(usize),
    /// Right after the sibling with this id
    After(NodeId),
}

// ---------------------------------------------------------------------------
// State and field edits
// ---------------------------------------------------------------------------

/// Set (or clear) the workflow state and run the transition hooks.
///
/// Setting the state a node already has is a no-op: the node stays clean
/// and no hook fires.
pub fn set_state(
    node: &mut Node,
    new_state: Option<&str>,
    hooks: &TransitionHooks,
) -> Result<(), NodeError> {
    let old_state = node.state().map(str::to_string);
    if !edit_headline(node, |h| h.state = new_state.map(str::to_string))? {
        return Ok(());
    }
    hooks.fire(node, old_state.as_deref(), new_state)
}

/// Set a property, or remove it when `value` is `None`.
pub fn set_property(node: &mut Node, key: &str, value: Option<&str>) -> Result<(), NodeError> {
    if !node.is_heading() {
        return Err(NodeError::NotAHeading);
    }
    if !is_valid_property_key(key) {
        return Err(NodeError::InvalidPropertyKey(key.to_string()));
    }
    match value {
        Some(value) => {
            if !is_valid_property_value(value) {
                return Err(NodeError::InvalidPropertyValue {
                    key: key.to_string(),
                    value: value.to_string(),
                });
            }
            if node.property(key) != Some(value) {
                node.properties.insert(key.to_string(), value.to_string());
                node.mark_dirty();
            }
        }
        None => {
            if node.properties.remove(key).is_some() {
                node.mark_dirty();
            }
        }
    }
    Ok(())
}

pub fn set_priority(node: &mut Node, priority: Option<char>) -> Result<(), NodeError> {
    edit_headline(node, |h| h.priority = priority).map(drop)
}

/// Replace the free text. Text that would read back as a date, tag block
/// or state is rejected.
pub fn set_free_text(node: &mut Node, text: &str) -> Result<(), NodeError> {
    let text = text.trim();
    edit_headline(node, |h| h.free_text = text.to_string()).map(drop)
}

pub fn add_tag(node: &mut Node, tag: &str) -> Result<(), NodeError> {
    let tag = tag.trim_matches(':');
    if !is_valid_tag(tag) {
        return Err(NodeError::InvalidTag(tag.to_string()));
    }
    edit_headline(node, |h| {
        h.tags.insert(tag.to_string());
    })
    .map(drop)
}

pub fn remove_tag(node: &mut Node, tag: &str) -> Result<(), NodeError> {
    let tag = tag.trim_matches(':');
    edit_headline(node, |h| {
        h.tags.shift_remove(tag);
    })
    .map(drop)
}

/// Replace the tracked date; clears any range end.
pub fn set_tracked(node: &mut Node, tracked: Option<Timestamp>) -> Result<(), NodeError> {
    edit_headline(node, |h| {
        h.tracked = tracked;
        h.tracked_end = None;
    })
    .map(drop)
}

pub fn set_untracked(node: &mut Node, untracked: Option<Timestamp>) -> Result<(), NodeError> {
    edit_headline(node, |h| h.untracked = untracked).map(drop)
}

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

/// Build a new heading node. It has no source line, so it is always dirty.
pub fn create_node(
    depth: usize,
    free_text: &str,
    state: Option<&str>,
    priority: Option<char>,
    tags: &[&str],
    content: Vec<String>,
) -> Result<Node, NodeError> {
    if !(1..=MAX_DEPTH).contains(&depth) {
        return Err(NodeError::InvalidDepth {
            depth: depth as isize,
        });
    }
    if let Some(bad) = tags.iter().find(|t| !is_valid_tag(t)) {
        return Err(NodeError::InvalidTag(bad.to_string()));
    }
    let mut headline = Headline::new(free_text.trim());
    headline.state = state.map(str::to_string);
    headline.priority = priority;
    headline.tags = tags.iter().map(|t| t.to_string()).collect();
    if !reads_back(depth, &Headline::default(), &headline) {
        return Err(NodeError::Unreadable(format_heading(depth, &headline)));
    }
    let mut node = Node::new_heading(depth, headline);
    node.content = content;
    Ok(node)
}

/// Insert `child` under `parent`. The child is taken by value, so a node
/// that is still part of a tree can never end up inside its own subtree.
pub fn insert_child(
    parent: &mut Node,
    child: Node,
    position: InsertPosition,
) -> Result<(), NodeError> {
    let idx = insert_index(&parent.children, &position)?;
    parent.children.insert(idx, child);
    parent.mark_dirty();
    Ok(())
}

/// Remove a direct child (and its subtree) by identity.
/// Returns the removed subtree, or `None` if `child` is not a direct child.
pub fn remove_child(parent: &mut Node, child: NodeId) -> Option<Node> {
    let idx = parent.children.iter().position(|c| c.id == child)?;
    let removed = parent.children.remove(idx);
    parent.mark_dirty();
    Some(removed)
}

/// Shift the depth of `node` and all its descendants by `delta`.
///
/// Nothing is changed if any resulting depth would leave `1..=6`.
pub fn adjust_depth(node: &mut Node, delta: isize) -> Result<(), NodeError> {
    if !node.is_heading() {
        return Err(NodeError::NotAHeading);
    }
    check_depth_shift(node, delta)?;
    shift_depth(node, delta);
    Ok(())
}

/// Move a heading (with its subtree) under another node of the same tree.
///
/// The moved subtree's depths are shifted so it sits one level below its
/// new parent. Moving a node under itself or one of its descendants fails
/// with `CycleDetected`.
pub fn move_subtree(
    root: &mut Node,
    node_id: NodeId,
    new_parent_id: NodeId,
    position: InsertPosition,
) -> Result<(), NodeError> {
    if node_id == root.id {
        return Err(NodeError::NotAHeading);
    }
    let node = find_node(root, node_id).ok_or(NodeError::NotFound(node_id))?;
    if node.id == new_parent_id || find_node(node, new_parent_id).is_some() {
        return Err(NodeError::CycleDetected);
    }
    let new_parent = find_node(root, new_parent_id).ok_or(NodeError::NotFound(new_parent_id))?;
    let delta = (new_parent.depth + 1) as isize - node.depth as isize;
    check_depth_shift(node, delta)?;

    let old_parent = find_parent_mut(root, node_id).ok_or(NodeError::NotFound(node_id))?;
    let old_parent_id = old_parent.id;
    let old_idx = old_parent
        .children
        .iter()
        .position(|c| c.id == node_id)
        .ok_or(NodeError::NotFound(node_id))?;
    let mut moving = old_parent.children.remove(old_idx);

    let target = find_node_mut(root, new_parent_id).ok_or(NodeError::NotFound(new_parent_id));
    let idx = target.and_then(|t| insert_index(&t.children, &position));
    let idx = match idx {
        Ok(idx) => idx,
        Err(e) => {
            // Put the subtree back where it was
            if let Some(old_parent) = find_node_mut(root, old_parent_id) {
                old_parent.children.insert(old_idx, moving);
            }
            return Err(e);
        }
    };

    shift_depth(&mut moving, delta);
    if let Some(target) = find_node_mut(root, new_parent_id) {
        target.children.insert(idx, moving);
        target.mark_dirty();
    }
    if let Some(old_parent) = find_node_mut(root, old_parent_id) {
        old_parent.mark_dirty();
    }
    tracing::debug!(node = %node_id, parent = %new_parent_id, delta, "moved subtree");
    Ok(())
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Find a node by id anywhere in the tree (including `root` itself).
pub fn find_node(root: &Node, id: NodeId) -> Option<&Node> {
    if root.id == id {
        return Some(root);
    }
    root.children.iter().find_map(|c| find_node(c, id))
}

pub fn find_node_mut(root: &mut Node, id: NodeId) -> Option<&mut Node> {
    if root.id == id {
        return Some(root);
    }
    root.children.iter_mut().find_map(|c| find_node_mut(c, id))
}

/// Find the parent of `target`. `None` for the root itself or an id that
/// is not in the tree.
pub fn find_parent(root: &Node, target: NodeId) -> Option<&Node> {
    for child in &root.children {
        if child.id == target {
            return Some(root);
        }
        if let Some(parent) = find_parent(child, target) {
            return Some(parent);
        }
    }
    None
}

pub fn find_parent_mut(root: &mut Node, target: NodeId) -> Option<&mut Node> {
    if root.children.iter().any(|c| c.id == target) {
        return Some(root);
    }
    root.children
        .iter_mut()
        .find_map(|c| find_parent_mut(c, target))
}

/// First descendant of `scope` (document order) whose free text equals `text`.
pub fn find_heading_by_text<'a>(scope: &'a Node, text: &str) -> Option<&'a Node> {
    for child in &scope.children {
        if child.free_text() == Some(text) {
            return Some(child);
        }
        if let Some(found) = find_heading_by_text(child, text) {
            return Some(found);
        }
    }
    None
}

pub fn find_heading_by_text_mut<'a>(scope: &'a mut Node, text: &str) -> Option<&'a mut Node> {
    for child in scope.children.iter_mut() {
        if child.free_text() == Some(text) {
            return Some(child);
        }
        if let Some(found) = find_heading_by_text_mut(child, text) {
            return Some(found);
        }
    }
    None
}

/// The innermost heading whose source range covers `line` (1-based).
/// Only meaningful before the tree is edited.
pub fn node_at_line(root: &Node, line: usize) -> Option<&Node> {
    let child = root
        .children
        .iter()
        .find(|c| c.source_lines.is_some_and(|span| span.contains(line)))?;
    Some(node_at_line(child, line).unwrap_or(child))
}

/// Visit every heading below `root` in document order.
pub fn for_each_heading(root: &Node, f: &mut dyn FnMut(&Node)) {
    for child in &root.children {
        f(child);
        for_each_heading(child, f);
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Apply `edit` to a copy of the headline and keep the result only if the
/// rebuilt heading line would parse back to it. Returns whether anything
/// changed.
fn edit_headline(node: &mut Node, edit: impl FnOnce(&mut Headline)) -> Result<bool, NodeError> {
    let current = node.headline.as_ref().ok_or(NodeError::NotAHeading)?;
    let mut updated = current.clone();
    edit(&mut updated);
    if updated == *current {
        return Ok(false);
    }
    if !reads_back(node.depth, current, &updated) {
        return Err(NodeError::Unreadable(format_heading(node.depth, &updated)));
    }
    node.headline = Some(updated);
    node.mark_dirty();
    Ok(true)
}

fn insert_index(children: &[Node], position: &InsertPosition) -> Result<usize, NodeError> {
    match position {
        InsertPosition::Append => Ok(children.len()),
        InsertPosition::At(n) => {
            if *n == 0 || *n > children.len() + 1 {
                Err(NodeError::InvalidPosition(format!(
                    "{} (expected 1..={})",
                    n,
                    children.len() + 1
                )))
            } else {
                Ok(n - 1)
            }
        }
        InsertPosition::After(sibling) => children
            .iter()
            .position(|c| c.id == *sibling)
            .map(|idx| idx + 1)
            .ok_or(NodeError::NotFound(*sibling)),
    }
}

/// Smallest and largest heading depth in a subtree
fn depth_bounds(node: &Node) -> (usize, usize) {
    node.children.iter().fold((node.depth, node.depth), |(lo, hi), c| {
        let (clo, chi) = depth_bounds(c);
        (lo.min(clo), hi.max(chi))
    })
}

fn check_depth_shift(node: &Node, delta: isize) -> Result<(), NodeError> {
    let (lo, hi) = depth_bounds(node);
    let new_lo = lo as isize + delta;
    let new_hi = hi as isize + delta;
    if new_lo < 1 {
        return Err(NodeError::InvalidDepth { depth: new_lo });
    }
    if new_hi > MAX_DEPTH as isize {
        return Err(NodeError::InvalidDepth { depth: new_hi });
    }
    Ok(())
}

fn shift_depth(node: &mut Node, delta: isize) {
    node.depth = (node.depth as isize + delta) as usize;
    node.mark_dirty();
    for child in &mut node.children {
        shift_depth(child, delta);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
