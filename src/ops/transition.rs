use std::collections::BTreeSet;
use std::fmt;

use crate::model::config::OutlineConfig;
use crate::model::node::Node;
use crate::ops::node_ops::{NodeError, set_property};

/// Called after a heading's state has changed.
///
/// The hook gets the node (already carrying the new state) plus the old and
/// new state. It may edit the node further, e.g. to stamp a property.
pub trait TransitionHook {
    fn on_transition(
        &self,
        node: &mut Node,
        old: Option<&str>,
        new: Option<&str>,
    ) -> Result<(), NodeError>;
}

impl<F> TransitionHook for F
where
    F: Fn(&mut Node, Option<&str>, Option<&str>) -> Result<(), NodeError>,
{
    fn on_transition(
        &self,
        node: &mut Node,
        old: Option<&str>,
        new: Option<&str>,
    ) -> Result<(), NodeError> {
        self(node, old, new)
    }
}

/// Hooks run in registration order by `set_state`. An empty registry
/// means a state change has no side effects.
#[derive(Default)]
pub struct TransitionHooks {
    hooks: Vec<Box<dyn TransitionHook>>,
}

impl TransitionHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard hooks for a config: the completion stamp, when enabled
    pub fn from_config(config: &OutlineConfig) -> Self {
        let mut hooks = Self::new();
        if config.completion.enabled {
            hooks.register(CompletionStamp::from_config(config));
        }
        hooks
    }

    pub fn register(&mut self, hook: impl TransitionHook + 'static) -> &mut Self {
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Run every hook; the first error stops the chain.
    pub(crate) fn fire(
        &self,
        node: &mut Node,
        old: Option<&str>,
        new: Option<&str>,
    ) -> Result<(), NodeError> {
        if !self.hooks.is_empty() {
            tracing::debug!(node = %node.id, ?old, ?new, hooks = self.hooks.len(), "state transition");
        }
        for hook in &self.hooks {
            hook.on_transition(node, old, new)?;
        }
        Ok(())
    }
}

impl fmt::Debug for TransitionHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionHooks")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Completion stamp
// ---------------------------------------------------------------------------

type Clock = Box<dyn Fn() -> String>;

/// Records the completion date as a property.
///
/// Entering a terminal state from a non-terminal one (or from no state)
/// sets the property to today's date. Leaving a terminal state for a
/// non-terminal one removes it. Moving between terminal states keeps it.
pub struct CompletionStamp {
    property: String,
    terminal: BTreeSet<String>,
    clock: Clock,
}

impl CompletionStamp {
    pub fn new<I, S>(property: &str, terminal: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CompletionStamp {
            property: property.to_string(),
            terminal: terminal.into_iter().map(Into::into).collect(),
            clock: Box::new(today),
        }
    }

    pub fn from_config(config: &OutlineConfig) -> Self {
        Self::new(&config.completion.property, config.states.terminal.iter().cloned())
    }

    /// Replace the date source (tests use a fixed date)
    pub fn with_clock(mut self, clock: impl Fn() -> String + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    fn is_terminal(&self, state: Option<&str>) -> bool {
        state.is_some_and(|s| self.terminal.contains(s))
    }
}

impl TransitionHook for CompletionStamp {
    fn on_transition(
        &self,
        node: &mut Node,
        old: Option<&str>,
        new: Option<&str>,
    ) -> Result<(), NodeError> {
        match (self.is_terminal(old), self.is_terminal(new)) {
            (false, true) => {
                let stamp = (self.clock)();
                set_property(node, &self.property, Some(&stamp))
            }
            (true, false) => set_property(node, &self.property, None),
            _ => Ok(()),
        }
    }
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::ValidStates;
    use crate::ops::node_ops::{find_heading_by_text_mut, set_state};
    use crate::parse::{parse_outline_str, serialize_outline};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn stamp_hooks() -> TransitionHooks {
        let mut hooks = TransitionHooks::new();
        hooks.register(
            CompletionStamp::new("COMPLETED_AT", ["DONE", "CANCELLED"])
                .with_clock(|| "2025-01-15".to_string()),
        );
        hooks
    }

    fn single(source: &str) -> Node {
        parse_outline_str(source, &ValidStates::default())
    }

    #[test]
    fn test_completion_stamp_scenario() {
        let mut root = single("## TODO Task\nbody");
        let hooks = stamp_hooks();
        let task = find_heading_by_text_mut(&mut root, "Task").unwrap();

        set_state(task, Some("DONE"), &hooks).unwrap();
        assert_eq!(task.property("COMPLETED_AT"), Some("2025-01-15"));
        assert_eq!(
            serialize_outline(&root),
            vec!["## DONE Task", "body", "COMPLETED_AT: [2025-01-15]"]
        );

        let task = find_heading_by_text_mut(&mut root, "Task").unwrap();
        set_state(task, Some("TODO"), &hooks).unwrap();
        assert_eq!(task.property("COMPLETED_AT"), None);
        assert_eq!(serialize_outline(&root), vec!["## TODO Task", "body"]);
    }

    #[test]
    fn test_terminal_to_terminal_keeps_stamp() {
        let mut root = single("# DONE Task\nCOMPLETED_AT: [2024-12-01]");
        let task = &mut root.children[0];
        set_state(task, Some("CANCELLED"), &stamp_hooks()).unwrap();
        assert_eq!(task.property("COMPLETED_AT"), Some("2024-12-01"));
    }

    #[test]
    fn test_from_no_state_to_terminal_stamps() {
        let mut root = single("# Task");
        let task = &mut root.children[0];
        set_state(task, Some("DONE"), &stamp_hooks()).unwrap();
        assert_eq!(task.property("COMPLETED_AT"), Some("2025-01-15"));
    }

    #[test]
    fn test_clearing_terminal_state_removes_stamp() {
        let mut root = single("# DONE Task\nCOMPLETED_AT: [2024-12-01]");
        let task = &mut root.children[0];
        set_state(task, None, &stamp_hooks()).unwrap();
        assert!(task.properties.is_empty());
    }

    #[test]
    fn test_non_terminal_transitions_leave_properties_alone() {
        let mut root = single("# TODO Task\nOWNER: [me]");
        let task = &mut root.children[0];
        set_state(task, Some("WAITING"), &stamp_hooks()).unwrap();
        assert_eq!(task.properties.len(), 1);
        assert_eq!(task.property("OWNER"), Some("me"));
    }

    #[test]
    fn test_no_hooks_no_side_effects() {
        let mut root = single("# TODO Task");
        let task = &mut root.children[0];
        set_state(task, Some("DONE"), &TransitionHooks::new()).unwrap();
        assert!(task.properties.is_empty());
    }

    #[test]
    fn test_closure_hook_sees_old_and_new() {
        let seen: Rc<RefCell<Vec<(Option<String>, Option<String>)>>> = Rc::default();
        let log = Rc::clone(&seen);
        let mut hooks = TransitionHooks::new();
        hooks.register(
            move |_: &mut Node, old: Option<&str>, new: Option<&str>| -> Result<(), NodeError> {
                log.borrow_mut()
                    .push((old.map(str::to_string), new.map(str::to_string)));
                Ok(())
            },
        );

        let mut root = single("# TODO Task");
        let task = &mut root.children[0];
        set_state(task, Some("DONE"), &hooks).unwrap();
        set_state(task, Some("DONE"), &hooks).unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![(Some("TODO".to_string()), Some("DONE".to_string()))]
        );
    }

    #[test]
    fn test_hook_error_propagates() {
        let mut hooks = TransitionHooks::new();
        hooks.register(
            |_: &mut Node, _: Option<&str>, _: Option<&str>| -> Result<(), NodeError> {
                Err(NodeError::InvalidPropertyKey("bad".into()))
            },
        );
        let mut root = single("# TODO Task");
        let result = set_state(&mut root.children[0], Some("DONE"), &hooks);
        assert!(matches!(result, Err(NodeError::InvalidPropertyKey(_))));
    }

    #[test]
    fn test_from_config() {
        let mut config = OutlineConfig::default();
        assert_eq!(TransitionHooks::from_config(&config).len(), 1);
        config.completion.enabled = false;
        assert!(TransitionHooks::from_config(&config).is_empty());
    }
}
