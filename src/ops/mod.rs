pub mod diff;
pub mod node_ops;
pub mod transition;

pub use diff::{Edit, EditOp, LineStore, apply_edits, diff_lines};
pub use node_ops::{InsertPosition, NodeError};
pub use transition::{CompletionStamp, TransitionHook, TransitionHooks};
