use once_cell::sync::Lazy;
use regex::Regex;

static PROPERTY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Z_]+): \[(.+)\]$").unwrap());
static KEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z_]+$").unwrap());

/// Parse a `KEY: [value]` line. The whole line must match.
pub fn parse_property_line(line: &str) -> Option<(String, String)> {
    let caps = PROPERTY_RE.captures(line)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}

/// Render a property as `KEY: [value]`
pub fn serialize_property(key: &str, value: &str) -> String {
    format!("{}: [{}]", key, value)
}

/// Whether `key` can appear on a property line (`[A-Z_]+`)
pub fn is_valid_property_key(key: &str) -> bool {
    KEY_RE.is_match(key)
}

/// Whether `value` would read back unchanged from a property line
pub fn is_valid_property_value(value: &str) -> bool {
    !value.is_empty() && !value.contains(['\n', '\r'])
}
