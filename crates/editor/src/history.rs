//! Line History
//!
//! Append-only record of every rope version a line has had.

use ped_core::Result;

use crate::rope::Rope;

/// Every version of one line, oldest first. The last one is current.
#[derive(Debug, Clone)]
pub struct LineHistory {
    /// Version the line was created with
    first: Rope,
    /// Versions produced by edits, in order
    edits: Vec<Rope>,
}

impl LineHistory {
    /// A line holding a single empty rope
    pub fn new() -> Self {
        Self::with_root(Rope::empty())
    }

    /// A line whose only version is `root`
    pub fn with_root(root: Rope) -> Self {
        Self {
            first: root,
            edits: Vec::new(),
        }
    }

    /// The current version
    pub fn current(&self) -> &Rope {
        self.edits.last().unwrap_or(&self.first)
    }

    /// The `n`th version, 0 being the one the line was created with
    pub fn version(&self, n: usize) -> Option<&Rope> {
        match n {
            0 => Some(&self.first),
            n => self.edits.get(n - 1),
        }
    }

    /// All versions, oldest first
    pub fn versions(&self) -> impl Iterator<Item = &Rope> + '_ {
        std::iter::once(&self.first).chain(self.edits.iter())
    }

    /// Number of versions recorded
    pub fn len(&self) -> usize {
        self.edits.len() + 1
    }

    /// Always false: a line has at least its initial version
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Record `root` as the new current version.
    ///
    /// Either the version is appended or, if room for it cannot be
    /// allocated, the history is left exactly as it was.
    pub fn push(&mut self, root: Rope) -> Result<()> {
        self.edits.try_reserve(1)?;
        self.edits.push(root);
        Ok(())
    }
}

impl Default for LineHistory {
    fn default() -> Self {
        Self::new()
    }
}
