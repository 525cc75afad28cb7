pub mod config;
pub mod headline;
pub mod node;
pub mod span;

pub use config::*;
pub use headline::*;
pub use node::*;
pub use span::*;
