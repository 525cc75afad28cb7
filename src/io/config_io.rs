use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::OutlineConfig;

pub const CONFIG_FILE: &str = "outline.toml";

/// Error type for config loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse outline.toml: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Parse config text. Missing sections and keys take their defaults.
pub fn parse_config(text: &str) -> Result<OutlineConfig, ConfigError> {
    let config: OutlineConfig = toml::from_str(text)?;
    warn_on_unknown_terminal_states(&config);
    Ok(config)
}

/// Read and parse a config file
pub fn read_config(path: &Path) -> Result<OutlineConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_config(&text)
}

/// Find `outline.toml` by walking up from `start`.
pub fn discover_config(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Load the config for a document.
///
/// An explicit path must exist. Otherwise the nearest `outline.toml` above
/// `start` is used, and if there is none the defaults apply.
pub fn load_config(explicit: Option<&Path>, start: &Path) -> Result<OutlineConfig, ConfigError> {
    if let Some(path) = explicit {
        return read_config(path);
    }
    match discover_config(start) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            read_config(&path)
        }
        None => {
            tracing::debug!(start = %start.display(), "no outline.toml found, using defaults");
            Ok(OutlineConfig::default())
        }
    }
}

/// A terminal state that is not a valid state can never be reached by
/// parsing, so the stamp would only fire for programmatic edits.
fn warn_on_unknown_terminal_states(config: &OutlineConfig) {
    let valid = config.valid_states();
    for state in &config.states.terminal {
        if !valid.contains(state) {
            tracing::warn!(state = %state, "terminal state is not in [states] valid");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_config_is_default() {
        let config = parse_config("").unwrap();
        assert!(config.completion.enabled);
        assert_eq!(config.completion.property, "COMPLETED_AT");
        assert_eq!(config.states.terminal, vec!["DONE", "CANCELLED"]);
        assert!(config.valid_states().contains("IN_PROGRESS"));
    }

    #[test]
    fn test_partial_config() {
        let config = parse_config(
            r#"[states]
valid = ["TODO", "NEXT", "DONE"]

[completion]
property = "CLOSED"
"#,
        )
        .unwrap();
        let states = config.valid_states();
        assert!(states.contains("NEXT"));
        assert!(!states.contains("WAITING"));
        assert_eq!(config.completion.property, "CLOSED");
        assert!(config.completion.enabled);
        assert_eq!(config.states.terminal, vec!["DONE", "CANCELLED"]);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            parse_config("[states\nvalid = 1"),
            Err(ConfigError::ParseError(_))
        ));
        assert!(matches!(
            parse_config("[states]\nvalid = \"TODO\""),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_discover_walks_up() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("notes/2025/jan");
        fs::create_dir_all(&nested).unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "[completion]\nenabled = false\n").unwrap();

        assert_eq!(discover_config(&nested), Some(tmp.path().join(CONFIG_FILE)));
        let config = load_config(None, &nested).unwrap();
        assert!(!config.completion.enabled);
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(None, tmp.path()).unwrap();
        assert!(config.completion.enabled);
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nope.toml");
        assert!(matches!(
            load_config(Some(&path), tmp.path()),
            Err(ConfigError::ReadError { .. })
        ));
    }
}
