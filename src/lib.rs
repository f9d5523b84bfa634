//! ped - a persistent-rope text editing engine
//!
//! Every line of a document is a history of immutable ropes. Edits build
//! a new version that shares all untouched structure with the previous
//! one, so older versions stay readable at little cost.
//!
//! ## Architecture
//!
//! - `ped-core`: errors, configuration and the event bus
//! - `ped-editor`: ropes, line histories, the buffer, cursor and commands

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod commands;

// Re-export main components for library usage
pub use ped_core as core;
pub use ped_editor as editor;

/// Prelude module for convenient imports
pub mod prelude {
    pub use ped_core::{EventBus, PedConfig, PedError};
    pub use ped_editor::{Anchor, Buffer, Command, CommandExecutor, Cursor, Direction, Rope};
}
