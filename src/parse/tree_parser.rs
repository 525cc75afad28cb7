use crate::model::config::ValidStates;
use crate::model::node::Node;
use crate::model::span::SourceSpan;
use crate::parse::headline_parser::parse_heading_line;
use crate::parse::property::parse_property_line;

/// Parse an outline from its source text
pub fn parse_outline_str(source: &str, states: &ValidStates) -> Node {
    let lines: Vec<String> = source.lines().map(|l| l.to_string()).collect();
    parse_outline(&lines, states)
}

/// Build the heading tree for a document.
///
/// Each heading becomes a child of the nearest preceding heading with a
/// strictly smaller depth. Non-heading lines belong to the innermost open
/// heading, or to the document root before the first heading. Property
/// lines are only recognized under a heading; before the first heading they
/// stay root content.
pub fn parse_outline(lines: &[String], states: &ValidStates) -> Node {
    // Open nodes from the root down to the innermost heading
    let mut stack: Vec<Node> = vec![Node::document()];
    let mut headings = 0usize;

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;

        if let Some((depth, headline)) = parse_heading_line(line, states) {
            while stack.len() > 1 && stack.last().is_some_and(|n| n.depth >= depth) {
                close_innermost(&mut stack, line_no - 1);
            }
            let mut node = Node::parsed_heading(depth, line.clone(), headline);
            node.source_lines = Some(SourceSpan::new(line_no, line_no));
            stack.push(node);
            headings += 1;
            continue;
        }

        let Some(current) = stack.last_mut() else {
            continue;
        };
        if current.is_heading()
            && let Some((key, value)) = parse_property_line(line)
        {
            current.properties.insert(key, value);
        } else {
            current.content.push(line.clone());
        }
    }

    while stack.len() > 1 {
        close_innermost(&mut stack, lines.len());
    }

    tracing::debug!(lines = lines.len(), headings, "parsed outline");
    stack.pop().unwrap_or_else(Node::document)
}

/// Pop the innermost open heading, record where it ends, and attach it to
/// its parent.
fn close_innermost(stack: &mut Vec<Node>, last_line: usize) {
    let Some(mut node) = stack.pop() else {
        return;
    };
    if let Some(span) = node.source_lines.as_mut() {
        span.end = last_line;
    }
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}
