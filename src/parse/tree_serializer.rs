use crate::model::config::ValidStates;
use crate::model::headline::Headline;
use crate::model::node::Node;
use crate::parse::headline_parser::{
    has_tracked_shape, has_untracked_shape, leading_keyword, parse_headline,
};
use crate::parse::property::serialize_property;

/// Serialize an outline tree back to lines.
///
/// Clean headings are emitted from their original source line; dirty ones
/// are rebuilt from their fields. Content lines are always verbatim and
/// property lines follow the content in key order.
pub fn serialize_outline(root: &Node) -> Vec<String> {
    let mut lines = root.content.clone();
    for child in &root.children {
        serialize_node(child, &mut lines);
    }
    tracing::debug!(lines = lines.len(), "serialized outline");
    lines
}

fn serialize_node(node: &Node, lines: &mut Vec<String>) {
    lines.push(heading_line(node));
    lines.extend(node.content.iter().cloned());
    for (key, value) in &node.properties {
        lines.push(serialize_property(key, value));
    }
    for child in &node.children {
        serialize_node(child, lines);
    }
}

/// The heading line for a node: verbatim when clean, rebuilt when dirty.
pub fn heading_line(node: &Node) -> String {
    if !node.dirty
        && let Some(ref raw) = node.raw_heading
    {
        return raw.clone();
    }
    match node.headline {
        Some(ref headline) => format_heading(node.depth, headline),
        None => "#".repeat(node.depth),
    }
}

/// Canonical heading line:
/// `### STATE [#P] free text <tracked>--<end> [untracked] :tag1:tag2:`
///
/// A date moves ahead of the free text when the text holds another date of
/// the same kind, or when the text would otherwise open the line with an
/// all-caps word. The parser takes the first date of each kind and a
/// leading keyword as the state, so either layout would read back wrong.
pub fn format_heading(depth: usize, headline: &Headline) -> String {
    let mut parts: Vec<String> = vec!["#".repeat(depth)];

    let tracked = headline.tracked.as_ref().map(|tracked| match headline.tracked_end {
        Some(ref end) => format!("<{}>--<{}>", tracked, end),
        None => format!("<{}>", tracked),
    });
    let untracked = headline.untracked.as_ref().map(|u| format!("[{}]", u));

    let text = headline.free_text.as_str();
    let mut tracked_first = tracked.is_some() && has_tracked_shape(text);
    let mut untracked_first = untracked.is_some() && has_untracked_shape(text);
    let text_leads = headline.state.is_none()
        && headline.priority.is_none()
        && !tracked_first
        && !untracked_first;
    if text_leads && leading_keyword(text).is_some() {
        if tracked.is_some() {
            tracked_first = true;
        } else {
            untracked_first = untracked.is_some();
        }
    }

    if let Some(ref state) = headline.state {
        parts.push(state.clone());
    }
    if let Some(priority) = headline.priority {
        parts.push(format!("[#{}]", priority));
    }
    let (early_tracked, late_tracked) = split_by(tracked, tracked_first);
    let (early_untracked, late_untracked) = split_by(untracked, untracked_first);
    parts.extend(early_tracked);
    parts.extend(early_untracked);
    if !text.is_empty() {
        parts.push(text.to_string());
    }
    parts.extend(late_tracked);
    parts.extend(late_untracked);
    if !headline.tags.is_empty() {
        let tags: Vec<&str> = headline.tags.iter().map(String::as_str).collect();
        parts.push(format!(":{}:", tags.join(":")));
    }

    let line = parts.join(" ");
    // A heading needs the space after its markers even with nothing else on it
    if parts.len() == 1 {
        format!("{} ", line)
    } else {
        line
    }
}

fn split_by(part: Option<String>, early: bool) -> (Option<String>, Option<String>) {
    if early { (part, None) } else { (None, part) }
}

/// Check that the rebuilt line for `headline` parses back to the same fields.
///
/// The valid state set is not known here, so an all-caps word that the
/// rebuilt line would open with counts as a state, unless `previous`
/// already opened its line with that same word and no state.
pub fn reads_back(depth: usize, previous: &Headline, headline: &Headline) -> bool {
    let line = format_heading(depth, headline);
    let mut states: Vec<&str> = headline.state.iter().map(String::as_str).collect();
    if headline.state.is_none()
        && let Some(word) = leading_keyword(line.get(depth + 1..).unwrap_or(""))
    {
        let before = format_heading(depth, previous);
        let already_there = previous.state.is_none()
            && leading_keyword(before.get(depth + 1..).unwrap_or("")) == Some(word);
        if !already_there {
            states.push(word);
        }
    }
    parse_headline(&line, &ValidStates::new(states)).as_ref() == Some(headline)
}
