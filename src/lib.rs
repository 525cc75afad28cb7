//! Heading-oriented outline documents: parse plain text into a tree of
//! headings, edit nodes in place, and write back only what changed.
//!
//! Untouched headings serialize byte-for-byte from their source line;
//! edited ones are rebuilt from their fields. `ops::diff` turns the result
//! into line edits for a live buffer.

pub mod cli;
pub mod io;
pub mod model;
pub mod ops;
pub mod parse;
pub mod telemetry;
