pub mod config_io;
pub mod document_io;

pub use config_io::{ConfigError, load_config};
pub use document_io::{DocumentError, TextFile, read_document, write_document};
