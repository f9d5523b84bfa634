//! Text Buffer
//!
//! Versioned document storage: one [`LineHistory`] per line, a cache of
//! each line's flattened text for rendering, and a log of the edits
//! that were applied.
//!
//! Every edit computes all of its results before committing any of them,
//! so a failed edit leaves the lines, the cache, the action log and the
//! cursor exactly as they were.

use std::collections::VecDeque;

use ped_core::{EditorConfig, PedError, Result};
use tracing::{debug, trace};

use crate::cursor::Cursor;
use crate::history::LineHistory;
use crate::rope::{Anchor, Rope};

/// Kind of edit recorded in the action log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Insert,
    Delete,
    Newline,
}

/// One applied edit: what it was and where the cursor stood when it ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action {
    pub kind: ActionKind,
    pub line: usize,
    pub anchor: Anchor,
}

/// Versioned multi-line text buffer
pub struct Buffer {
    /// Histories in document order
    lines: Vec<LineHistory>,
    /// Flattened text of each line's current version
    cache: Vec<Vec<char>>,
    /// Applied edits, oldest first
    undo_log: VecDeque<Action>,
    /// Mirror log for undone edits
    redo_log: Vec<Action>,
    /// Maximum undo log size
    max_action_log: usize,
    /// Height above which a new version is rebalanced (0 = never)
    rebuild_height: usize,
}

impl Buffer {
    /// Create a buffer holding one empty line
    pub fn new() -> Self {
        Self::with_config(&EditorConfig::default())
    }

    /// Create a buffer holding one empty line with custom settings
    pub fn with_config(config: &EditorConfig) -> Self {
        Self {
            lines: vec![LineHistory::new()],
            cache: vec![Vec::new()],
            undo_log: VecDeque::new(),
            redo_log: Vec::new(),
            max_action_log: config.max_action_log.max(1),
            rebuild_height: config.rebuild_height,
        }
    }

    /// Create a buffer whose lines start out as `lines`
    pub fn from_lines(lines: &[&str]) -> Result<Self> {
        let mut buffer = Self::new();
        if lines.is_empty() {
            return Ok(buffer);
        }

        let mut histories = Vec::new();
        histories.try_reserve_exact(lines.len())?;
        for line in lines {
            histories.push(LineHistory::with_root(line.parse::<Rope>()?));
        }
        buffer.lines = histories;
        buffer.refresh_all()?;
        Ok(buffer)
    }

    /// Check that `line` can be edited
    pub fn validate(&self, line: usize) -> Result<()> {
        if self.lines.is_empty() {
            return Err(PedError::InvalidState("buffer has no lines".into()));
        }
        if self.cache.len() != self.lines.len() {
            return Err(PedError::InvalidState(format!(
                "text cache holds {} lines but buffer has {}",
                self.cache.len(),
                self.lines.len()
            )));
        }
        if line >= self.lines.len() {
            return Err(PedError::LineOutOfRange {
                line,
                lines: self.lines.len(),
            });
        }
        Ok(())
    }

    /// Insert `c` at the cursor and move the cursor past it
    pub fn insert(&mut self, cursor: &mut Cursor, c: char) -> Result<()> {
        let line = cursor.line;
        self.validate(line)?;

        let rope = self.lines[line].current().insert(c, cursor.anchor)?;
        let rope = self.balanced(rope)?;
        let text = rope.text()?;

        self.commit_version(line, rope, text, ActionKind::Insert, cursor.anchor)?;
        cursor.anchor = cursor.anchor.next();

        debug!(line, offset = cursor.anchor.offset(), ?c, "Inserted character");
        Ok(())
    }

    /// Delete the character to the left of the cursor and move the cursor back
    pub fn delete(&mut self, cursor: &mut Cursor) -> Result<()> {
        let line = cursor.line;
        self.validate(line)?;

        let index = match cursor.anchor {
            Anchor::Start => return Err(PedError::StartOfLine(line)),
            Anchor::After(index) => index,
        };

        let rope = self.lines[line].current().delete(index)?;
        let rope = self.balanced(rope)?;
        let text = rope.text()?;

        self.commit_version(line, rope, text, ActionKind::Delete, cursor.anchor)?;
        cursor.anchor = cursor.anchor.prev();

        debug!(line, offset = cursor.anchor.offset(), "Deleted character");
        Ok(())
    }

    /// Split the cursor's line at the cursor.
    ///
    /// The text left of the cursor becomes the line's new version; the
    /// rest starts a new line directly below. The cursor moves to the
    /// start of the new line.
    pub fn newline(&mut self, cursor: &mut Cursor) -> Result<()> {
        let line = cursor.line;
        self.validate(line)?;

        let (left, right) = self.lines[line].current().split(cursor.anchor)?;

        // Line indices shift, so the whole cache is rebuilt
        let mut cache = Vec::new();
        cache.try_reserve_exact(self.lines.len() + 1)?;
        for (i, history) in self.lines.iter().enumerate() {
            if i == line {
                cache.push(left.text()?);
                cache.push(right.text()?);
            } else {
                cache.push(history.current().text()?);
            }
        }

        self.lines.try_reserve(1)?;
        self.undo_log.try_reserve(1)?;
        self.lines[line].push(left)?;
        self.lines.insert(line + 1, LineHistory::with_root(right));
        self.cache = cache;
        self.record(Action {
            kind: ActionKind::Newline,
            line,
            anchor: cursor.anchor,
        });

        cursor.line = line + 1;
        cursor.anchor = Anchor::Start;

        debug!(line, lines = self.lines.len(), "Split line");
        Ok(())
    }

    /// Recompute the cached text of `line` from its current version
    pub fn refresh_cache(&mut self, line: usize) -> Result<()> {
        self.validate(line)?;
        let text = self.lines[line].current().text()?;
        self.cache[line] = text;
        Ok(())
    }

    /// Recompute the cached text of every line
    pub fn refresh_all(&mut self) -> Result<()> {
        let mut cache = Vec::new();
        cache.try_reserve_exact(self.lines.len())?;
        for history in &self.lines {
            cache.push(history.current().text()?);
        }
        self.cache = cache;
        Ok(())
    }

    /// Cached text of `line`
    pub fn flattened_text(&self, line: usize) -> Result<&[char]> {
        self.validate(line)?;
        Ok(&self.cache[line])
    }

    /// Cached text of `line` as a `String`
    pub fn line_string(&self, line: usize) -> Option<String> {
        self.cache.get(line).map(|text| text.iter().collect())
    }

    /// Number of characters in `line`, from the cache
    pub fn line_len(&self, line: usize) -> Option<usize> {
        self.cache.get(line).map(Vec::len)
    }

    /// Number of lines
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Version history of `line`
    pub fn history(&self, line: usize) -> Option<&LineHistory> {
        self.lines.get(line)
    }

    /// Current version of `line`
    pub fn current(&self, line: usize) -> Option<&Rope> {
        self.lines.get(line).map(LineHistory::current)
    }

    /// Applied edits, oldest first
    pub fn undo_log(&self) -> &VecDeque<Action> {
        &self.undo_log
    }

    /// Undone edits
    pub fn redo_log(&self) -> &[Action] {
        &self.redo_log
    }

    /// Release every version of every line
    pub fn teardown(self) {
        let versions: usize = self.lines.iter().map(LineHistory::len).sum();
        debug!(lines = self.lines.len(), versions, "Tearing down buffer");
        drop(self);
    }

    fn balanced(&self, rope: Rope) -> Result<Rope> {
        if self.rebuild_height == 0 {
            return Ok(rope);
        }
        let height = rope.height();
        if height <= self.rebuild_height {
            return Ok(rope);
        }
        let rebuilt = rope.rebuild()?;
        trace!(height, new_height = rebuilt.height(), "Rebalanced rope");
        Ok(rebuilt)
    }

    fn commit_version(
        &mut self,
        line: usize,
        rope: Rope,
        text: Vec<char>,
        kind: ActionKind,
        anchor: Anchor,
    ) -> Result<()> {
        self.undo_log.try_reserve(1)?;
        trace!(line, "New version:\n{}", rope.render_tree());
        self.lines[line].push(rope)?;
        self.cache[line] = text;
        self.record(Action { kind, line, anchor });
        Ok(())
    }

    /// Push an action to the undo log
    fn record(&mut self, action: Action) {
        self.undo_log.push_back(action);
        self.redo_log.clear();

        // Trim action history if needed
        while self.undo_log.len() > self.max_action_log {
            self.undo_log.pop_front();
        }
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}
