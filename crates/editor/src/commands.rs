//! Editor Commands
//!
//! Key events, already classified, and the executor that applies them to
//! a buffer and cursor.

use std::sync::Arc;

use ped_core::{Event, EventBus};
use tracing::warn;

use crate::buffer::Buffer;
use crate::cursor::{Cursor, Direction};

/// Editor command type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    // Edit commands
    InsertChar(char),
    DeleteBackward,
    InsertNewline,

    // Movement commands
    MoveCursor(Direction),

    // Cache maintenance
    RefreshLine(usize),
}

impl Command {
    /// Classify a typed character.
    ///
    /// Returns `None` for control characters that have no editing meaning.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '\n' | '\r' => Some(Command::InsertNewline),
            '\u{8}' | '\u{7f}' => Some(Command::DeleteBackward),
            c if c.is_control() => None,
            c => Some(Command::InsertChar(c)),
        }
    }
}

/// Command execution result
#[derive(Debug)]
pub struct CommandResult {
    pub success: bool,
    pub message: Option<String>,
}

impl CommandResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// Command executor
pub struct CommandExecutor {
    events: Option<Arc<EventBus>>,
}

impl CommandExecutor {
    pub fn new() -> Self {
        Self { events: None }
    }

    /// Create an executor that reports changed lines on `events`
    pub fn with_events(events: Arc<EventBus>) -> Self {
        Self { events: Some(events) }
    }

    /// Execute a command on a buffer
    pub fn execute(&mut self, command: Command, buffer: &mut Buffer, cursor: &mut Cursor) -> CommandResult {
        let line = cursor.line;

        let outcome = match command {
            Command::InsertChar(c) => buffer.insert(cursor, c).map(|()| {
                self.emit(Event::LineRefreshed { line });
            }),

            Command::DeleteBackward => match buffer.validate(line) {
                // Nothing sits left of the line start
                Ok(()) if cursor.offset() == 0 => return CommandResult::with_message("Nothing to delete"),
                Ok(()) => buffer.delete(cursor).map(|()| {
                    self.emit(Event::LineRefreshed { line });
                }),
                Err(e) => Err(e),
            },

            Command::InsertNewline => buffer.newline(cursor).map(|()| {
                self.emit(Event::LineRefreshed { line });
                self.emit(Event::LineInserted { line: line + 1 });
            }),

            Command::MoveCursor(direction) => {
                cursor.move_direction(direction, buffer);
                Ok(())
            }

            Command::RefreshLine(target) => buffer.refresh_cache(target).map(|()| {
                self.emit(Event::LineRefreshed { line: target });
            }),
        };

        match outcome {
            Ok(()) => {
                self.emit(Event::CursorMoved {
                    line: cursor.line,
                    offset: cursor.offset(),
                });
                CommandResult::ok()
            }
            Err(e) => {
                warn!("Command {:?} failed: {}", command, e);
                let message = e.user_message();
                self.emit(Event::EditRejected { message: message.clone() });
                CommandResult::error(message)
            }
        }
    }

    fn emit(&self, event: Event) {
        if let Some(events) = &self.events {
            events.emit(event);
        }
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rope::Anchor;

    fn run(executor: &mut CommandExecutor, buffer: &mut Buffer, cursor: &mut Cursor, keys: &str) {
        for c in keys.chars() {
            if let Some(command) = Command::from_char(c) {
                assert!(executor.execute(command, buffer, cursor).success);
            }
        }
    }

    #[test]
    fn test_classify_characters() {
        assert_eq!(Command::from_char('a'), Some(Command::InsertChar('a')));
        assert_eq!(Command::from_char('é'), Some(Command::InsertChar('é')));
        assert_eq!(Command::from_char('\n'), Some(Command::InsertNewline));
        assert_eq!(Command::from_char('\u{7f}'), Some(Command::DeleteBackward));
        assert_eq!(Command::from_char('\u{1b}'), None);
    }

    #[test]
    fn test_insert_command() {
        let mut buffer = Buffer::new();
        let mut cursor = Cursor::new();
        let mut executor = CommandExecutor::new();

        run(&mut executor, &mut buffer, &mut cursor, "Hello\nWorld\u{7f}d");

        assert_eq!(buffer.line_string(0).unwrap(), "Hello");
        assert_eq!(buffer.line_string(1).unwrap(), "World");
        assert_eq!(cursor, Cursor::at_offset(1, 5));
    }

    #[test]
    fn test_delete_at_line_start_is_skipped() {
        let mut buffer = Buffer::from_lines(&["abc"]).unwrap();
        let mut cursor = Cursor::new();
        let mut executor = CommandExecutor::new();

        let result = executor.execute(Command::DeleteBackward, &mut buffer, &mut cursor);
        assert!(result.success);
        assert_eq!(result.message.as_deref(), Some("Nothing to delete"));
        assert_eq!(buffer.history(0).unwrap().len(), 1);
    }

    #[test]
    fn test_failed_command_reports_error() {
        let mut buffer = Buffer::new();
        let mut cursor = Cursor::at(5, Anchor::Start);
        let mut executor = CommandExecutor::new();

        let result = executor.execute(Command::InsertChar('x'), &mut buffer, &mut cursor);
        assert!(!result.success);
        assert_eq!(result.message.as_deref(), Some("Line 6 does not exist (1 lines in document)"));
        assert_eq!(cursor, Cursor::at(5, Anchor::Start));
    }

    #[test]
    fn test_delete_on_missing_line_is_rejected() {
        let mut buffer = Buffer::new();
        let mut cursor = Cursor::at(5, Anchor::Start);
        let mut executor = CommandExecutor::new();

        let result = executor.execute(Command::DeleteBackward, &mut buffer, &mut cursor);
        assert!(!result.success);
        assert_eq!(result.message.as_deref(), Some("Line 6 does not exist (1 lines in document)"));
        assert_eq!(cursor, Cursor::at(5, Anchor::Start));
    }

    #[test]
    fn test_move_command() {
        let mut buffer = Buffer::from_lines(&["ab", "c"]).unwrap();
        let mut cursor = Cursor::at_offset(0, 2);
        let mut executor = CommandExecutor::new();

        executor.execute(Command::MoveCursor(Direction::Down), &mut buffer, &mut cursor);
        assert_eq!(cursor, Cursor::at_offset(1, 1));
        executor.execute(Command::MoveCursor(Direction::Left), &mut buffer, &mut cursor);
        assert_eq!(cursor, Cursor::at(1, Anchor::Start));
    }

    #[test]
    fn test_events_report_changed_lines() {
        let bus = Arc::new(EventBus::new());
        let subscription = bus.subscribe();
        let mut executor = CommandExecutor::with_events(Arc::clone(&bus));
        let mut buffer = Buffer::new();
        let mut cursor = Cursor::new();

        executor.execute(Command::InsertChar('a'), &mut buffer, &mut cursor);
        executor.execute(Command::InsertNewline, &mut buffer, &mut cursor);
        executor.execute(Command::RefreshLine(9), &mut buffer, &mut cursor);

        let events: Vec<Event> = subscription.drain().collect();
        assert_eq!(events[0], Event::LineRefreshed { line: 0 });
        assert_eq!(events[1], Event::CursorMoved { line: 0, offset: 1 });
        assert_eq!(events[2], Event::LineRefreshed { line: 0 });
        assert_eq!(events[3], Event::LineInserted { line: 1 });
        assert_eq!(events[4], Event::CursorMoved { line: 1, offset: 0 });
        assert!(matches!(events[5], Event::EditRejected { .. }));
        assert_eq!(events.len(), 6);
    }
}
