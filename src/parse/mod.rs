pub mod headline_parser;
pub mod property;
pub mod tree_parser;
pub mod tree_serializer;

pub use headline_parser::{classify_heading, parse_heading_line, parse_headline};
pub use property::{parse_property_line, serialize_property};
pub use tree_parser::{parse_outline, parse_outline_str};
pub use tree_serializer::{format_heading, heading_line, reads_back, serialize_outline};
