//! CLI commands for ped
//!
//! Replays a keystroke script against a fresh buffer, the way an input
//! layer would feed classified key events to the editor.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;
use tracing::info;

use ped_core::{EditorConfig, Event, EventBus};
use ped_editor::{Buffer, Command, CommandExecutor, Cursor, Direction};

/// Outcome of a replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    /// Final text of every line
    pub lines: Vec<String>,
    /// Number of recorded versions for every line
    pub versions: Vec<usize>,
    /// Commands that were rejected
    pub rejected: usize,
    /// Line redraws requested through the event bus
    pub redraws: usize,
}

/// Replay command options
pub struct ReplayCommand {
    /// Keystroke script; stdin when absent
    pub script: Option<PathBuf>,
}

impl ReplayCommand {
    /// Read the script and replay it
    pub async fn execute(&self, config: &EditorConfig) -> Result<ReplayReport> {
        let keys = match &self.script {
            Some(path) => {
                info!("Replaying keystrokes from {:?}", path);
                tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read script {}", path.display()))?
            }
            None => {
                let mut keys = String::new();
                tokio::io::stdin()
                    .read_to_string(&mut keys)
                    .await
                    .context("Failed to read keystrokes from stdin")?;
                keys
            }
        };
        Ok(replay(&keys, config))
    }
}

/// Turn raw keystrokes into commands.
///
/// ANSI arrow sequences (`ESC [ A` to `ESC [ D`) become cursor moves;
/// everything else goes through [`Command::from_char`].
pub fn classify_keys(keys: &str) -> Vec<Command> {
    let mut commands = Vec::new();
    let mut chars = keys.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\u{1b}' && chars.peek() == Some(&'[') {
            chars.next();
            let direction = match chars.next() {
                Some('A') => Some(Direction::Up),
                Some('B') => Some(Direction::Down),
                Some('C') => Some(Direction::Right),
                Some('D') => Some(Direction::Left),
                _ => None,
            };
            commands.extend(direction.map(Command::MoveCursor));
            continue;
        }
        commands.extend(Command::from_char(c));
    }
    commands
}

/// Apply `keys` to an empty buffer and report the result
pub fn replay(keys: &str, config: &EditorConfig) -> ReplayReport {
    let bus = Arc::new(EventBus::new());
    let renderer = bus.subscribe();
    let mut executor = CommandExecutor::with_events(Arc::clone(&bus));
    let mut buffer = Buffer::with_config(config);
    let mut cursor = Cursor::new();

    let mut rejected = 0;
    let mut redraws = 0;
    for command in classify_keys(keys) {
        if !executor.execute(command, &mut buffer, &mut cursor).success {
            rejected += 1;
        }
        redraws += renderer
            .drain()
            .filter(|event| matches!(event, Event::LineRefreshed { .. } | Event::LineInserted { .. }))
            .count();
    }

    let report = ReplayReport {
        lines: (0..buffer.line_count())
            .map(|line| buffer.line_string(line).unwrap_or_default())
            .collect(),
        versions: (0..buffer.line_count())
            .map(|line| buffer.history(line).map_or(0, |h| h.len()))
            .collect(),
        rejected,
        redraws,
    };

    buffer.teardown();
    bus.emit(Event::Shutdown);
    info!(
        lines = report.lines.len(),
        rejected = report.rejected,
        "Replay finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_arrow_sequences() {
        let commands = classify_keys("a\u{1b}[D\u{1b}[Cb\u{1b}[Z");
        assert_eq!(
            commands,
            vec![
                Command::InsertChar('a'),
                Command::MoveCursor(Direction::Left),
                Command::MoveCursor(Direction::Right),
                Command::InsertChar('b'),
            ]
        );
    }

    #[test]
    fn test_replay_edits_and_moves() {
        let report = replay("hello\u{1b}[D\nX\u{1b}[A\u{7f}", &EditorConfig::default());
        assert_eq!(report.lines, vec!["ell", "Xo"]);
        assert_eq!(report.rejected, 0);
    }
}
