use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Configuration from outline.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutlineConfig {
    #[serde(default)]
    pub states: StateConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// Keywords recognized as heading state
    #[serde(default = "default_valid_states")]
    pub valid: Vec<String>,
    /// States that count as finished for the completion stamp
    #[serde(default = "default_terminal_states")]
    pub terminal: Vec<String>,
}

impl Default for StateConfig {
    fn default() -> Self {
        StateConfig {
            valid: default_valid_states(),
            terminal: default_terminal_states(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Property key stamped when a heading enters a terminal state
    #[serde(default = "default_completion_property")]
    pub property: String,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        CompletionConfig {
            enabled: true,
            property: default_completion_property(),
        }
    }
}

fn default_valid_states() -> Vec<String> {
    ["TODO", "IN_PROGRESS", "WAITING", "CANCELLED", "DONE", "BLOCKED"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_terminal_states() -> Vec<String> {
    vec!["DONE".to_string(), "CANCELLED".to_string()]
}

fn default_completion_property() -> String {
    "COMPLETED_AT".to_string()
}

fn default_true() -> bool {
    true
}

impl OutlineConfig {
    pub fn valid_states(&self) -> ValidStates {
        ValidStates::new(self.states.valid.iter().cloned())
    }
}

/// The set of keywords the headline parser accepts as a state.
///
/// Passed into the parser at call time; the parser itself knows no state
/// names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidStates(BTreeSet<String>);

impl ValidStates {
    pub fn new<I, S>(states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ValidStates(states.into_iter().map(Into::into).collect())
    }

    /// A set that recognizes no state at all
    pub fn empty() -> Self {
        ValidStates(BTreeSet::new())
    }

    pub fn contains(&self, state: &str) -> bool {
        self.0.contains(state)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for ValidStates {
    fn default() -> Self {
        ValidStates::new(default_valid_states())
    }
}
