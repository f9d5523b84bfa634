//! Cursor Management
//!
//! Tracks where edits apply and moves through the buffer's lines.

use crate::buffer::Buffer;
use crate::rope::Anchor;

/// Cursor movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// A text cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    /// Line index
    pub line: usize,
    /// Position inside the line
    pub anchor: Anchor,
}

impl Cursor {
    /// Create a cursor before the first character of the first line
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cursor at a specific position
    pub fn at(line: usize, anchor: Anchor) -> Self {
        Self { line, anchor }
    }

    /// Create a cursor with `offset` characters to its left on `line`
    pub fn at_offset(line: usize, offset: usize) -> Self {
        Self::at(line, Anchor::from_offset(offset))
    }

    /// Number of characters to the left of the cursor
    pub fn offset(&self) -> usize {
        self.anchor.offset()
    }

    /// Move one step in `direction`, using the buffer's cached line lengths.
    ///
    /// Vertical moves keep the cursor at the end of the line if it was at
    /// the end of the line it left; otherwise it is clamped to the new
    /// line's end.
    pub fn move_direction(&mut self, direction: Direction, buffer: &Buffer) {
        let line_len = buffer.line_len(self.line).unwrap_or(0);
        let offset = self.offset();

        match direction {
            Direction::Left => {
                self.anchor = self.anchor.prev();
            }
            Direction::Right => {
                if offset < line_len {
                    self.anchor = self.anchor.next();
                }
            }
            Direction::Up => {
                if self.line > 0 {
                    self.move_vertically(self.line - 1, offset, line_len, buffer);
                }
            }
            Direction::Down => {
                if self.line + 1 < buffer.line_count() {
                    self.move_vertically(self.line + 1, offset, line_len, buffer);
                }
            }
        }
    }

    fn move_vertically(&mut self, target: usize, offset: usize, old_len: usize, buffer: &Buffer) {
        let new_len = buffer.line_len(target).unwrap_or(0);
        let offset = if offset == old_len { new_len } else { offset.min(new_len) };
        self.line = target;
        self.anchor = Anchor::from_offset(offset);
    }

    /// Move to the start of the line
    pub fn move_to_line_start(&mut self) {
        self.anchor = Anchor::Start;
    }

    /// Move to the end of the line
    pub fn move_to_line_end(&mut self, buffer: &Buffer) {
        let len = buffer.line_len(self.line).unwrap_or(0);
        self.anchor = Anchor::from_offset(len);
    }
}
