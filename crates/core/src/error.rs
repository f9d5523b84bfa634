//! Error types for ped
//!
//! Centralized error handling using thiserror.

use std::collections::TryReserveError;

use thiserror::Error;

/// Main error type for ped
#[derive(Error, Debug)]
pub enum PedError {
    /// A rope, history or buffer is not in a usable state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Line {line} is out of range (buffer has {lines} lines)")]
    LineOutOfRange { line: usize, lines: usize },

    #[error("Index {index} is out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Cursor is at the start of line {0}, nothing to delete")]
    StartOfLine(usize),

    #[error("Allocation failed: {0}")]
    Allocation(#[from] TryReserveError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Result type alias for ped operations
pub type Result<T> = std::result::Result<T, PedError>;

impl PedError {
    /// Check if this error leaves the document usable for another attempt.
    ///
    /// Edits are atomic, so every editing error is recoverable; only
    /// configuration and I/O problems are not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PedError::LineOutOfRange { .. }
                | PedError::IndexOutOfRange { .. }
                | PedError::StartOfLine(_)
                | PedError::Allocation(_)
        )
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            PedError::InvalidState(msg) => format!("Editor is in an invalid state: {}", msg),
            PedError::LineOutOfRange { line, lines } => {
                format!("Line {} does not exist ({} lines in document)", line + 1, lines)
            }
            PedError::IndexOutOfRange { index, len } => {
                format!("Position {} is past the end of the line ({} characters)", index, len)
            }
            PedError::StartOfLine(_) => "Nothing to delete".to_string(),
            PedError::Allocation(_) => "Out of memory, the edit was not applied".to_string(),
            PedError::Io(e) => format!("File operation failed: {}", e),
            _ => self.to_string(),
        }
    }
}
