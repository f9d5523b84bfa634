//! Persistent Rope
//!
//! An immutable binary rope whose nodes are shared between versions.
//! Every edit returns a new root: the spine on the edited side is rebuilt
//! and every untouched subtree is reused by bumping its reference count.
//!
//! Ownership is tracked by `Rc`: a node starts with one owner, gains one
//! for every parent or root that installs it, and is freed when the last
//! owner releases it. Published nodes are never mutated.

use std::fmt::{self, Write as _};
use std::rc::Rc;
use std::str::FromStr;

use ped_core::{PedError, Result};

/// Maximum number of code points stored in one leaf
pub const LEAF_CAPACITY: usize = 4;

/// A split or insertion point inside a line.
///
/// `Start` sits before the first character. `After(i)` sits immediately
/// to the right of character `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Anchor {
    #[default]
    Start,
    After(usize),
}

impl Anchor {
    /// The anchor with `offset` characters to its left
    pub const fn from_offset(offset: usize) -> Self {
        if offset == 0 {
            Anchor::Start
        } else {
            Anchor::After(offset - 1)
        }
    }

    /// Number of characters to the left of this anchor
    pub const fn offset(self) -> usize {
        match self {
            Anchor::Start => 0,
            Anchor::After(index) => index + 1,
        }
    }

    /// One character further right
    pub const fn next(self) -> Self {
        Anchor::After(self.offset())
    }

    /// One character further left, saturating at `Start`
    pub const fn prev(self) -> Self {
        match self {
            Anchor::Start | Anchor::After(0) => Anchor::Start,
            Anchor::After(index) => Anchor::After(index - 1),
        }
    }
}

pub(crate) struct RopeNode {
    /// Leaf: number of code points held. Internal: text length of the left subtree.
    weight: usize,
    /// Depth of the deepest leaf below, counting this node
    height: usize,
    kind: NodeKind,
}

enum NodeKind {
    Leaf(Box<[char]>),
    Internal {
        left: Rc<RopeNode>,
        right: Option<Rc<RopeNode>>,
    },
}

impl RopeNode {
    fn left_child(&self) -> Option<&Rc<RopeNode>> {
        match &self.kind {
            NodeKind::Internal { left, .. } => Some(left),
            NodeKind::Leaf(_) => None,
        }
    }

    fn right_child(&self) -> Option<&Rc<RopeNode>> {
        match &self.kind {
            NodeKind::Internal { right, .. } => right.as_ref(),
            NodeKind::Leaf(_) => None,
        }
    }

    fn detach_children(&mut self, pending: &mut Vec<Rc<RopeNode>>) {
        let kind = std::mem::replace(&mut self.kind, NodeKind::Leaf(Box::default()));
        if let NodeKind::Internal { left, right } = kind {
            pending.push(left);
            pending.extend(right);
        }
    }
}

// Children are released with an explicit stack so that long degenerate
// spines do not recurse once per level.
impl Drop for RopeNode {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(child) = pending.pop() {
            if let Ok(mut node) = Rc::try_unwrap(child) {
                node.detach_children(&mut pending);
            }
        }
    }
}

fn empty_leaf() -> Rc<RopeNode> {
    Rc::new(RopeNode {
        weight: 0,
        height: 1,
        kind: NodeKind::Leaf(Box::default()),
    })
}

fn leaf(chars: &[char]) -> Result<Rc<RopeNode>> {
    let mut value = Vec::new();
    value.try_reserve_exact(chars.len())?;
    value.extend_from_slice(chars);
    Ok(Rc::new(RopeNode {
        weight: chars.len(),
        height: 1,
        kind: NodeKind::Leaf(value.into_boxed_slice()),
    }))
}

/// New internal node owning `left` and `right`; its weight is the full text length of `left`.
fn internal(left: Rc<RopeNode>, right: Option<Rc<RopeNode>>) -> Rc<RopeNode> {
    let below = right.as_ref().map_or(0, |right| right.height);
    Rc::new(RopeNode {
        weight: length(&left),
        height: left.height.max(below) + 1,
        kind: NodeKind::Internal { left, right },
    })
}

fn length(node: &RopeNode) -> usize {
    let mut total = node.weight;
    let mut current = node;
    while let Some(right) = current.right_child() {
        total += right.weight;
        current = right;
    }
    total
}

/// Pair adjacent nodes under new parents, level by level, until one root remains.
fn merge(mut nodes: Vec<Rc<RopeNode>>) -> Result<Rc<RopeNode>> {
    while nodes.len() > 1 {
        let mut parents = Vec::new();
        parents.try_reserve_exact(nodes.len().div_ceil(2))?;

        let mut level = nodes.into_iter();
        while let Some(left) = level.next() {
            // An odd node out gets a parent with only a left child
            parents.push(internal(left, level.next()));
        }
        nodes = parents;
    }
    nodes
        .pop()
        .ok_or_else(|| PedError::InvalidState("cannot merge an empty leaf sequence".into()))
}

/// Which child a split descended into
enum Side {
    Left,
    Right,
}

/// Split so the left part holds `[0, index]` and the right part the rest.
///
/// Walks down to the leaf holding `index`, then rebuilds the path bottom-up.
fn split_node(root: &Rc<RopeNode>, index: usize) -> Result<(Rc<RopeNode>, Rc<RopeNode>)> {
    let mut path: Vec<(&Rc<RopeNode>, Side)> = Vec::new();
    let mut node = root;
    let mut i = index;

    let (mut left, mut right) = loop {
        match &node.kind {
            NodeKind::Leaf(value) => {
                if i >= node.weight {
                    return Err(PedError::IndexOutOfRange { index, len: length(root) });
                }
                if i + 1 == node.weight {
                    break (Rc::clone(node), empty_leaf());
                }
                let (head, tail) = value.split_at(i + 1);
                break (leaf(head)?, leaf(tail)?);
            }
            NodeKind::Internal { left, right } => {
                path.try_reserve(1)?;
                if i >= node.weight {
                    let next = right.as_ref().ok_or(PedError::IndexOutOfRange {
                        index,
                        len: length(root),
                    })?;
                    i -= node.weight;
                    path.push((node, Side::Right));
                    node = next;
                } else {
                    path.push((node, Side::Left));
                    node = left;
                }
            }
        }
    };

    while let Some((parent, side)) = path.pop() {
        let (parent_left, parent_right) = match &parent.kind {
            NodeKind::Internal { left, right } => (left, right),
            NodeKind::Leaf(_) => {
                return Err(PedError::InvalidState("leaf recorded on a split path".into()))
            }
        };
        match side {
            // The untouched left subtree is reused as is
            Side::Right => left = internal(Rc::clone(parent_left), Some(left)),
            Side::Left => {
                if let Some(parent_right) = parent_right {
                    right = internal(right, Some(Rc::clone(parent_right)));
                }
            }
        }
    }
    Ok((left, right))
}

/// Location of a single code point inside a rope
#[derive(Debug, Clone)]
pub struct RopeIndex {
    /// The leaf holding the code point
    pub leaf: Rope,
    /// The code point itself
    pub c: char,
    /// Offset of the code point inside `leaf`
    pub offset: usize,
}

/// Handle to the root of a persistent rope.
///
/// Cloning a rope shares it; nothing is copied.
#[derive(Clone)]
pub struct Rope {
    root: Rc<RopeNode>,
}

impl Rope {
    /// The empty rope: a single leaf of weight 0
    pub fn empty() -> Self {
        Self { root: empty_leaf() }
    }

    /// Build a rope from a run of code points.
    ///
    /// The input is cut into leaves of at most [`LEAF_CAPACITY`] code
    /// points which are then merged bottom-up into a balanced tree.
    pub fn build(text: &[char]) -> Result<Self> {
        if text.is_empty() {
            return Ok(Self::empty());
        }

        let mut leaves = Vec::new();
        leaves.try_reserve_exact(text.len().div_ceil(LEAF_CAPACITY))?;
        for chunk in text.chunks(LEAF_CAPACITY) {
            leaves.push(leaf(chunk)?);
        }
        Ok(Self { root: merge(leaves)? })
    }

    /// Total number of code points. Walks only the right spine.
    pub fn len(&self) -> usize {
        length(&self.root)
    }

    /// Whether the rope holds no text
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Weight of the root node
    pub fn weight(&self) -> usize {
        self.root.weight
    }

    /// Depth of the deepest leaf; a lone leaf has height 1
    pub fn height(&self) -> usize {
        self.root.height
    }

    /// Whether the root is a leaf
    pub fn is_leaf(&self) -> bool {
        matches!(self.root.kind, NodeKind::Leaf(_))
    }

    /// Payload of a leaf root
    pub fn value(&self) -> Option<&[char]> {
        match &self.root.kind {
            NodeKind::Leaf(value) => Some(value),
            NodeKind::Internal { .. } => None,
        }
    }

    /// Number of live owners of the root node
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.root)
    }

    /// Whether both handles point at the same node
    pub fn ptr_eq(&self, other: &Rope) -> bool {
        Rc::ptr_eq(&self.root, &other.root)
    }

    /// Locate the code point at position `index`
    pub fn index(&self, index: usize) -> Result<RopeIndex> {
        let len = self.len();
        if index >= len {
            return Err(PedError::IndexOutOfRange { index, len });
        }

        let mut node = &self.root;
        let mut i = index;
        loop {
            match &node.kind {
                NodeKind::Leaf(value) => {
                    let c = *value
                        .get(i)
                        .ok_or(PedError::IndexOutOfRange { index, len })?;
                    return Ok(RopeIndex {
                        leaf: Rope { root: Rc::clone(node) },
                        c,
                        offset: i,
                    });
                }
                NodeKind::Internal { left, right } => {
                    if i >= node.weight {
                        i -= node.weight;
                        node = right
                            .as_ref()
                            .ok_or(PedError::IndexOutOfRange { index, len })?;
                    } else {
                        node = left;
                    }
                }
            }
        }
    }

    /// Join two ropes under a new root. Both handles move into the new node.
    pub fn concat(first: Rope, second: Rope) -> Rope {
        Rope {
            root: internal(first.root, Some(second.root)),
        }
    }

    /// Split into `[0, i]` and `(i, end)` for `Anchor::After(i)`.
    ///
    /// `Anchor::Start` yields a fresh empty rope and a share of `self`.
    /// Only the nodes along the split path are rebuilt.
    pub fn split(&self, at: Anchor) -> Result<(Rope, Rope)> {
        match at {
            Anchor::Start => Ok((Rope::empty(), self.clone())),
            Anchor::After(index) => {
                let len = self.len();
                if index >= len {
                    return Err(PedError::IndexOutOfRange { index, len });
                }
                let (left, right) = split_node(&self.root, index)?;
                Ok((Rope { root: left }, Rope { root: right }))
            }
        }
    }

    /// New rope with `c` inserted at `at`; `self` is left untouched
    pub fn insert(&self, c: char, at: Anchor) -> Result<Rope> {
        let (left, right) = self.split(at)?;
        let single = Rope { root: leaf(&[c])? };
        let joined = Rope::concat(left, single);

        if right.is_empty() {
            right.release();
            Ok(joined)
        } else {
            Ok(Rope::concat(joined, right))
        }
    }

    /// New rope without the character at `index`; `self` is left untouched
    pub fn delete(&self, index: usize) -> Result<Rope> {
        let len = self.len();
        if index >= len {
            return Err(PedError::IndexOutOfRange { index, len });
        }

        let (before, _) = self.split(Anchor::from_offset(index))?;
        let (_, after) = self.split(Anchor::After(index))?;
        Ok(Rope::concat(before, after))
    }

    /// Shares of every leaf in text order.
    ///
    /// Each returned handle holds one extra reference that is given back
    /// when the handle is dropped.
    pub fn leaves(&self) -> Vec<Rope> {
        let mut leaves = Vec::new();
        let mut pending: Vec<&Rc<RopeNode>> = Vec::new();
        let mut current = Some(&self.root);

        while let Some(node) = current {
            if let Some(left) = node.left_child() {
                pending.push(node);
                current = Some(left);
                continue;
            }

            leaves.push(Rope { root: Rc::clone(node) });
            current = loop {
                match pending.pop() {
                    Some(parent) => {
                        if let Some(right) = parent.right_child() {
                            break Some(right);
                        }
                    }
                    None => break None,
                }
            };
        }
        leaves
    }

    /// Flatten to a contiguous run of code points
    pub fn text(&self) -> Result<Vec<char>> {
        let mut text = Vec::new();
        text.try_reserve_exact(self.len())?;
        for leaf in self.leaves() {
            if let Some(value) = leaf.value() {
                text.extend_from_slice(value);
            }
        }
        Ok(text)
    }

    /// A balanced copy of this rope that shares no nodes with it
    pub fn rebuild(&self) -> Result<Rope> {
        Rope::build(&self.text()?)
    }

    /// Give up this handle. The nodes are freed once no other owner remains.
    pub fn release(self) {
        drop(self);
    }

    /// Sideways dump of the tree: right subtree above, left below.
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        render_node(&self.root, &mut out);
        out
    }

    #[cfg(test)]
    pub(crate) fn node_handles(&self) -> Vec<std::rc::Weak<RopeNode>> {
        let mut handles = Vec::new();
        let mut pending = vec![&self.root];
        while let Some(node) = pending.pop() {
            handles.push(Rc::downgrade(node));
            pending.extend(node.left_child());
            pending.extend(node.right_child());
        }
        handles
    }
}

enum RenderStep<'a> {
    Expand(&'a Rc<RopeNode>, String, bool),
    Emit(&'a Rc<RopeNode>, String, bool),
}

fn render_node(root: &Rc<RopeNode>, out: &mut String) {
    let mut pending = vec![RenderStep::Expand(root, String::new(), true)];

    while let Some(step) = pending.pop() {
        match step {
            RenderStep::Expand(node, prefix, is_left) => {
                // Pushed in reverse: right subtree, this node, left subtree
                if let Some(left) = node.left_child() {
                    let child_prefix = format!("{}{}", prefix, if is_left { "    " } else { "|   " });
                    pending.push(RenderStep::Expand(left, child_prefix, true));
                }
                if let Some(right) = node.right_child() {
                    let child_prefix = format!("{}{}", prefix, if is_left { "|   " } else { "    " });
                    pending.push(RenderStep::Emit(node, prefix, is_left));
                    pending.push(RenderStep::Expand(right, child_prefix, false));
                } else {
                    pending.push(RenderStep::Emit(node, prefix, is_left));
                }
            }
            RenderStep::Emit(node, prefix, is_left) => {
                let branch = if is_left { "└── " } else { "┌── " };
                let _ = write!(out, "{}{}refc: {} weight: {}", prefix, branch, Rc::strong_count(node), node.weight);
                if let NodeKind::Leaf(value) = &node.kind {
                    let _ = write!(out, " {:?}", value.iter().collect::<String>());
                }
                out.push('\n');
            }
        }
    }
}

impl Default for Rope {
    fn default() -> Self {
        Self::empty()
    }
}

impl FromStr for Rope {
    type Err = PedError;

    fn from_str(s: &str) -> Result<Self> {
        let chars: Vec<char> = s.chars().collect();
        Rope::build(&chars)
    }
}

impl fmt::Display for Rope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for leaf in self.leaves() {
            for c in leaf.value().unwrap_or_default() {
                f.write_char(*c)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Rope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rope")
            .field("len", &self.len())
            .field("weight", &self.weight())
            .field("ref_count", &self.ref_count())
            .finish()
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Edit {
        Insert(char, usize),
        Delete(usize),
    }

    fn edit() -> impl Strategy<Value = Edit> {
        prop_oneof![
            (any::<char>(), any::<usize>()).prop_map(|(c, at)| Edit::Insert(c, at)),
            any::<usize>().prop_map(Edit::Delete),
        ]
    }

    /// Apply `edits` to both a rope and a plain vector, keeping every version
    fn apply(text: &str, edits: &[Edit]) -> (Vec<Rope>, Vec<char>) {
        let mut expected: Vec<char> = text.chars().collect();
        let mut versions = vec![Rope::build(&expected).unwrap()];

        for edit in edits {
            let current = versions.last().unwrap();
            let next = match *edit {
                Edit::Insert(c, at) => {
                    let offset = at % (expected.len() + 1);
                    expected.insert(offset, c);
                    current.insert(c, Anchor::from_offset(offset)).unwrap()
                }
                Edit::Delete(at) => {
                    if expected.is_empty() {
                        continue;
                    }
                    let index = at % expected.len();
                    expected.remove(index);
                    current.delete(index).unwrap()
                }
            };
            versions.push(next);
        }
        (versions, expected)
    }

    fn nodes_consistent(rope: &Rope) -> bool {
        let mut pending = vec![&rope.root];
        while let Some(node) = pending.pop() {
            match &node.kind {
                NodeKind::Leaf(value) => {
                    if node.weight != value.len() || node.height != 1 {
                        return false;
                    }
                }
                NodeKind::Internal { left, right } => {
                    let below = right.as_ref().map_or(0, |right| right.height);
                    if node.weight != length(left) || node.height != left.height.max(below) + 1 {
                        return false;
                    }
                    pending.push(left);
                    pending.extend(right);
                }
            }
        }
        true
    }

    fn anchors(len: usize) -> Vec<Anchor> {
        (0..=len).map(Anchor::from_offset).collect()
    }

    proptest! {
        #[test]
        fn build_keeps_every_code_point(text in ".{0,64}") {
            let chars: Vec<char> = text.chars().collect();
            let rope = Rope::build(&chars).unwrap();
            prop_assert_eq!(rope.len(), chars.len());
            prop_assert_eq!(rope.text().unwrap(), chars);
            prop_assert!(nodes_consistent(&rope));
        }

        #[test]
        fn edits_match_a_plain_vector(
            text in ".{0,32}",
            edits in prop::collection::vec(edit(), 0..40),
        ) {
            let (versions, expected) = apply(&text, &edits);
            let current = versions.last().unwrap();
            prop_assert_eq!(current.len(), expected.len());
            prop_assert_eq!(current.text().unwrap(), expected);
            for version in &versions {
                prop_assert!(nodes_consistent(version));
            }
        }

        #[test]
        fn split_then_join_restores_edited_text(
            text in ".{0,32}",
            edits in prop::collection::vec(edit(), 0..24),
        ) {
            let (versions, expected) = apply(&text, &edits);
            let rope = versions.last().unwrap();
            let expected: String = expected.into_iter().collect();

            for at in anchors(rope.len()) {
                let (left, right) = rope.split(at).unwrap();
                prop_assert_eq!(left.len(), at.offset());
                prop_assert_eq!(format!("{}{}", left, right), expected.clone());
            }
            prop_assert!(rope.split(Anchor::After(rope.len())).is_err());
        }

        #[test]
        fn insert_then_delete_is_identity(
            text in ".{0,32}",
            edits in prop::collection::vec(edit(), 0..24),
            c in any::<char>(),
            at in any::<usize>(),
        ) {
            let (versions, expected) = apply(&text, &edits);
            let rope = versions.last().unwrap();
            let offset = at % (rope.len() + 1);

            let inserted = rope.insert(c, Anchor::from_offset(offset)).unwrap();
            prop_assert_eq!(inserted.index(offset).unwrap().c, c);
            let restored = inserted.delete(offset).unwrap();
            prop_assert_eq!(restored.text().unwrap(), expected);
        }

        #[test]
        fn insert_copies_at_most_one_leaf(
            text in ".{0,32}",
            edits in prop::collection::vec(edit(), 0..24),
            c in any::<char>(),
            at in any::<usize>(),
        ) {
            let (versions, _) = apply(&text, &edits);
            let rope = versions.last().unwrap();
            let at = Anchor::from_offset(at % (rope.len() + 1));
            let inserted = rope.insert(c, at).unwrap();

            let new_leaves = inserted.leaves();
            let copied = rope
                .leaves()
                .iter()
                .filter(|old| old.weight() > 0)
                .filter(|old| !new_leaves.iter().any(|new| new.ptr_eq(old)))
                .count();
            if at == Anchor::Start {
                prop_assert_eq!(copied, 0);
            } else {
                prop_assert!(copied <= 1);
            }
        }

        #[test]
        fn releasing_every_version_frees_every_node(
            text in ".{0,32}",
            edits in prop::collection::vec(edit(), 0..24),
        ) {
            let (versions, _) = apply(&text, &edits);
            let handles: Vec<_> = versions.iter().flat_map(Rope::node_handles).collect();
            prop_assert!(handles.iter().all(|h| h.strong_count() >= 1));

            for version in versions {
                version.release();
            }
            prop_assert!(handles.iter().all(|h| h.upgrade().is_none()));
        }
    }
}
