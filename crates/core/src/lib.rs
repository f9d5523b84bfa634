//! ped Core - Shared types
//!
//! This crate provides what every other part of ped agrees on:
//! the error type, the TOML configuration and the event bus that
//! tells a renderer which lines changed.

pub mod config;
pub mod events;
pub mod error;

pub use config::{EditorConfig, LoggingConfig, PedConfig};
pub use events::{Event, EventBus, EventSubscription};
pub use error::{PedError, Result};

/// ped version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "ped";
