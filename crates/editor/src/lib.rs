//! ped Editor
//!
//! Persistent-rope text editing engine:
//! - Immutable, structurally shared rope with reference-counted nodes
//! - Append-only version history for every line
//! - Line buffer with a flattened text cache for rendering
//! - Cursor movement and classified key commands

pub mod rope;
pub mod history;
pub mod buffer;
pub mod cursor;
pub mod commands;

pub use rope::{Anchor, Rope, RopeIndex, LEAF_CAPACITY};
pub use history::LineHistory;
pub use buffer::{Action, ActionKind, Buffer};
pub use cursor::{Cursor, Direction};
pub use commands::{Command, CommandExecutor, CommandResult};
