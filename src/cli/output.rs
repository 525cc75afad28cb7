use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::node::Node;
use crate::ops::diff::{Edit, EditOp};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct NodeJson {
    pub depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<char>,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracked: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracked_end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub untracked: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    /// First and last source line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<[usize; 2]>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeJson>,
}

#[derive(Serialize)]
pub struct DocumentJson {
    pub file: String,
    pub headings: usize,
    pub children: Vec<NodeJson>,
}

#[derive(Serialize)]
pub struct WriteJson {
    pub file: String,
    pub heading: String,
    pub edits: Vec<Edit>,
    pub written: bool,
}

#[derive(Serialize)]
pub struct CheckJson {
    pub file: String,
    pub headings: usize,
    pub round_trip: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub edits: Vec<Edit>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Convert a heading (and its children down to `max_depth`) to JSON
pub fn node_to_json(node: &Node, max_depth: Option<usize>) -> NodeJson {
    let headline = node.headline.clone().unwrap_or_default();
    NodeJson {
        depth: node.depth,
        state: headline.state,
        priority: headline.priority,
        text: headline.free_text,
        tracked: headline.tracked.map(|t| t.to_string()),
        tracked_end: headline.tracked_end.map(|t| t.to_string()),
        untracked: headline.untracked.map(|t| t.to_string()),
        tags: headline.tags.into_iter().collect(),
        properties: node.properties.clone(),
        lines: node.source_lines.map(|span| [span.start, span.end]),
        children: visible_children(node, max_depth)
            .map(|c| node_to_json(c, max_depth))
            .collect(),
    }
}

/// Children of `node` no deeper than `max_depth`
pub fn visible_children(node: &Node, max_depth: Option<usize>) -> impl Iterator<Item = &Node> {
    node.children
        .iter()
        .filter(move |c| max_depth.is_none_or(|max| c.depth <= max))
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// One-line summary of a heading, without the `#` markers
pub fn format_node_line(node: &Node) -> String {
    let Some(ref headline) = node.headline else {
        return String::new();
    };
    let mut parts = Vec::new();
    if let Some(ref state) = headline.state {
        parts.push(state.clone());
    }
    if let Some(priority) = headline.priority {
        parts.push(format!("[#{}]", priority));
    }
    if headline.free_text.is_empty() {
        parts.push("(untitled)".to_string());
    } else {
        parts.push(headline.free_text.clone());
    }
    if !headline.tags.is_empty() {
        let tags: Vec<&str> = headline.tags.iter().map(String::as_str).collect();
        parts.push(format!(":{}:", tags.join(":")));
    }
    if let Some(ref tracked) = headline.tracked {
        match headline.tracked_end {
            Some(ref end) => parts.push(format!("<{}>--<{}>", tracked, end)),
            None => parts.push(format!("<{}>", tracked)),
        }
    }
    if let Some(ref untracked) = headline.untracked {
        parts.push(format!("[{}]", untracked));
    }
    parts.join(" ")
}

/// Indented heading tree with each heading's properties under it
pub fn format_tree(root: &Node, max_depth: Option<usize>) -> Vec<String> {
    let mut lines = Vec::new();
    for child in visible_children(root, max_depth) {
        format_subtree(child, 0, max_depth, &mut lines);
    }
    lines
}

fn format_subtree(node: &Node, level: usize, max_depth: Option<usize>, lines: &mut Vec<String>) {
    let indent = "  ".repeat(level);
    lines.push(format!("{}{}", indent, format_node_line(node)));
    for (key, value) in &node.properties {
        lines.push(format!("{}  - {}: {}", indent, key, value));
    }
    for child in visible_children(node, max_depth) {
        format_subtree(child, level + 1, max_depth, lines);
    }
}

/// Render an edit as `<line> <marker> <text>` rows (`+` insert, `-` delete,
/// `~` replace). Deleted rows carry their own line numbers.
pub fn format_edit(edit: &Edit) -> Vec<String> {
    let marker = match edit.op {
        EditOp::Insert => '+',
        EditOp::Delete => '-',
        EditOp::Replace => '~',
    };
    edit.payload
        .iter()
        .enumerate()
        .map(|(offset, text)| {
            let line = match edit.op {
                EditOp::Delete => edit.at_line + offset,
                EditOp::Insert | EditOp::Replace => edit.at_line,
            };
            format!("{:>4} {} {}", line, marker, text)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::ValidStates;
    use crate::parse::parse_outline_str;
    use insta::assert_snapshot;

    const SAMPLE: &str = "\
Intro
# Projects
## TODO [#A] Write parser :code:
OWNER: [me]
## WAITING Review <2025-03-04 Tue>
### [2025-02-01] Old notes
# Errands";

    #[test]
    fn test_format_tree() {
        let root = parse_outline_str(SAMPLE, &ValidStates::default());
        assert_snapshot!(format_tree(&root, None).join("\n"), @r"
        Projects
          TODO [#A] Write parser :code:
            - OWNER: me
          WAITING Review <2025-03-04 Tue>
            Old notes [2025-02-01]
        Errands
        ");
    }

    #[test]
    fn test_format_tree_depth_limit() {
        let root = parse_outline_str(SAMPLE, &ValidStates::default());
        assert_eq!(format_tree(&root, Some(1)), vec!["Projects", "Errands"]);
    }

    #[test]
    fn test_node_to_json() {
        let root = parse_outline_str(SAMPLE, &ValidStates::default());
        let json = node_to_json(&root.children[0], None);
        let value = serde_json::to_value(&json).unwrap();
        assert_eq!(value["text"], "Projects");
        assert_eq!(value["lines"], serde_json::json!([2, 6]));
        let task = &value["children"][0];
        assert_eq!(task["state"], "TODO");
        assert_eq!(task["priority"], "A");
        assert_eq!(task["tags"], serde_json::json!(["code"]));
        assert_eq!(task["properties"]["OWNER"], "me");
        assert!(task.get("children").is_none());
        assert_eq!(value["children"][1]["tracked"], "2025-03-04 Tue");
    }

    #[test]
    fn test_format_edit() {
        let delete = Edit::delete(3, vec!["a".into(), "b".into()]);
        assert_eq!(format_edit(&delete), vec!["   3 - a", "   4 - b"]);
        let insert = Edit::insert(5, vec!["x".into()]);
        assert_eq!(format_edit(&insert), vec!["   5 + x"]);
        let replace = Edit::replace(1, "y".into());
        assert_eq!(format_edit(&replace), vec!["   1 ~ y"]);
    }
}
