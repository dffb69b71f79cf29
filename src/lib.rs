//! An ordered set backed by an AVL tree with parent links and a header node.
//!
//! Nodes live in an arena and refer to each other through checked handles, so successor and
//! predecessor steps and bottom-up rebalancing can climb parent links without an explicit path
//! stack. A [`Position`] names a single node; rotations relink nodes without recreating them, so
//! a position stays valid until the value it refers to is removed.

// Conventions used in comments:
// - `h(x)` is the cached height of `x`; a missing child has height 0.
// - `s(x)` is the cached subtree size of `x`; a missing child has size 0.
// - The balance of `x` is `h(right(x)) - h(left(x))`.
//
// The invariants of the tree, outside of the body of a mutating method:
// 1. In-order traversal of the real nodes is strictly increasing.
// 2. Every real node has a balance in {-1, 0, 1}.
// 3. `h(x) = 1 + max(h(left(x)), h(right(x)))` and `s(x) = 1 + s(left(x)) + s(right(x))`.
// 4. Every child's parent link points back at the node holding it.
// 5. The header is the parent of the root. The root is the header's left child; the header's
//    right child is always absent.
//
// Corollary of (5): every real node has a parent, and walking up from any real node ends at the
// header. The header's left-subtree maximum is the largest element, which is what makes the
// header double as the end position.

use core::{borrow::Borrow, cmp::Ordering, fmt, mem};

mod arena;
mod cursor;
mod debug;
mod iter;
mod node;
mod rotate;

#[cfg(any(test, feature = "model"))]
pub mod model;

#[cfg(test)]
mod tests;

use crate::{
    arena::{Arena, NodeId},
    node::{Dir, Link, Node},
};

pub use crate::{
    cursor::{Cursor, CursorMut, Position},
    iter::{IntoIter, Iter},
};

/// An ordered set implemented as an AVL tree.
///
/// The tree keeps the heights of the two subtrees of every node within one of each other, so
/// lookups, insertions and removals complete in _O(log(n))_ time. Each node also tracks the size
/// of its subtree, which makes [`rank`](AvlSet::rank) and [`select`](AvlSet::select)
/// logarithmic as well.
///
/// # Examples
///
/// ```
/// use avl_set::AvlSet;
///
/// let mut set = AvlSet::new();
/// set.insert(10);
/// set.insert(20);
///
/// assert_eq!(set.get(set.upper_bound(&15)), Some(&20));
/// assert_eq!(set.upper_bound(&30), set.end());
/// ```
pub struct AvlSet<T> {
    nodes: Arena<Node<T>>,
    header: NodeId,
    leftmost: NodeId,
}

/// A violated structural invariant, as reported by [`AvlSet::check_invariants`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InvariantError {
    /// The header has a parent or a right child.
    MalformedHeader,
    /// A child link points at a freed node.
    DanglingLink,
    /// A node's parent link does not point at the node holding it.
    ParentMismatch,
    /// A node other than the header has no value.
    MissingValue,
    /// A node's subtree heights differ by more than one.
    Unbalanced,
    /// A node's cached height disagrees with its children.
    HeightMismatch,
    /// A node's cached size disagrees with its children.
    SizeMismatch,
    /// In-order traversal is not strictly increasing.
    OutOfOrder,
    /// The cached leftmost node is not the minimum.
    StaleLeftmost,
    /// The number of reachable nodes disagrees with the number of allocated nodes.
    LengthMismatch,
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            InvariantError::MalformedHeader => "header node has a parent or a right child",
            InvariantError::DanglingLink => "link points at a freed node",
            InvariantError::ParentMismatch => "parent link does not match child link",
            InvariantError::MissingValue => "real node has no value",
            InvariantError::Unbalanced => "subtree heights differ by more than one",
            InvariantError::HeightMismatch => "cached height is stale",
            InvariantError::SizeMismatch => "cached size is stale",
            InvariantError::OutOfOrder => "in-order traversal is not strictly increasing",
            InvariantError::StaleLeftmost => "cached leftmost node is not the minimum",
            InvariantError::LengthMismatch => "reachable nodes do not match allocated nodes",
        };

        f.write_str(msg)
    }
}

impl std::error::Error for InvariantError {}

impl<T> AvlSet<T> {
    /// Returns a new, empty set.
    pub fn new() -> AvlSet<T> {
        Self::from_arena(Arena::new())
    }

    /// Returns a new, empty set with room for `capacity` elements before reallocating.
    pub fn with_capacity(capacity: usize) -> AvlSet<T> {
        Self::from_arena(Arena::with_capacity(capacity.saturating_add(1)))
    }

    fn from_arena(mut nodes: Arena<Node<T>>) -> AvlSet<T> {
        let header = nodes.allocate(Node::header());

        AvlSet {
            nodes,
            header,
            leftmost: header,
        }
    }

    /// Returns the number of elements in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Returns `true` if the set contains no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        let empty = self.len() == 0;
        debug_assert_eq!(empty, self.root().is_none());
        empty
    }

    /// Returns the position of the smallest element, or [`end`](AvlSet::end) if the set is
    /// empty.
    ///
    /// This operation completes in _O(1)_ time.
    #[inline]
    pub fn begin(&self) -> Position {
        Position::new(self.leftmost)
    }

    /// Returns the past-the-end position.
    ///
    /// The end position never refers to a value and stays the same for the lifetime of the set,
    /// including across [`clear`](AvlSet::clear).
    #[inline]
    pub fn end(&self) -> Position {
        Position::new(self.header)
    }

    /// Returns a reference to the value at `pos`.
    ///
    /// Returns `None` for the end position and for positions whose value has been removed.
    #[inline]
    pub fn get(&self, pos: Position) -> Option<&T> {
        self.nodes.get(pos.node())?.value.as_ref()
    }

    /// Returns `true` if `pos` refers to a value in this set.
    #[inline]
    pub fn is_valid(&self, pos: Position) -> bool {
        self.get(pos).is_some()
    }

    /// Returns the position following `pos` in sorted order.
    ///
    /// The last element is followed by [`end`](AvlSet::end). Returns `None` if `pos` is the end
    /// position or is stale.
    pub fn next(&self, pos: Position) -> Option<Position> {
        self.nodes.get(pos.node())?;
        self.step(pos.node(), Dir::Right).map(Position::new)
    }

    /// Returns the position preceding `pos` in sorted order.
    ///
    /// The end position is preceded by the largest element. Returns `None` if `pos` is the
    /// first position (including the end position of an empty set) or is stale.
    pub fn prev(&self, pos: Position) -> Option<Position> {
        self.nodes.get(pos.node())?;
        self.step(pos.node(), Dir::Left).map(Position::new)
    }

    /// Returns the smallest element of the set.
    pub fn first(&self) -> Option<&T> {
        self.get(self.begin())
    }

    /// Returns the largest element of the set.
    pub fn last(&self) -> Option<&T> {
        self.get(self.prev(self.end())?)
    }

    /// Removes and returns the smallest element of the set.
    pub fn pop_first(&mut self) -> Option<T> {
        self.remove_at(self.begin())
    }

    /// Removes and returns the largest element of the set.
    pub fn pop_last(&mut self) -> Option<T> {
        let last = self.prev(self.end())?;
        self.remove_at(last)
    }

    /// Returns the 0-based index of the value at `pos` in ascending order.
    ///
    /// Returns `None` for the end position and for stale positions.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn rank(&self, pos: Position) -> Option<usize> {
        self.get(pos)?;
        Some(self.count_beyond(pos.node(), Dir::Left))
    }

    /// Returns the 0-based index of the value at `pos` in descending order, i.e. the number of
    /// elements greater than it.
    ///
    /// Returns `None` for the end position and for stale positions.
    pub fn rank_from_back(&self, pos: Position) -> Option<usize> {
        self.get(pos)?;
        Some(self.count_beyond(pos.node(), Dir::Right))
    }

    /// Returns the position of the element with ascending index `index`, or
    /// [`end`](AvlSet::end) if `index >= self.len()`.
    ///
    /// This is the inverse of [`rank`](AvlSet::rank).
    pub fn select(&self, index: usize) -> Position {
        let mut remaining = index;
        let mut opt_cur = self.root();

        while let Some(cur) = opt_cur {
            let left = self.nodes[cur].left();
            let left_size = self.size(left);

            match remaining.cmp(&left_size) {
                Ordering::Less => opt_cur = left,
                Ordering::Equal => return Position::new(cur),
                Ordering::Greater => {
                    remaining -= left_size + 1;
                    opt_cur = self.nodes[cur].right();
                }
            }
        }

        self.end()
    }

    /// Removes the value at `pos` and returns it.
    ///
    /// Returns `None`, leaving the set untouched, if `pos` is the end position or is stale.
    /// Positions to every other value remain valid.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn remove_at(&mut self, pos: Position) -> Option<T> {
        let node = pos.node();
        if node == self.header || !self.nodes.contains(node) {
            return None;
        }

        // The successor survives the removal with its identity intact, so it can be taken as
        // the new minimum before any relinking happens.
        if node == self.leftmost {
            self.leftmost = self
                .step(node, Dir::Right)
                .expect("a real node is always followed by a node or the header");
        }

        let parent = self.nodes[node].parent.expect("every real node has a parent");
        let left = self.nodes[node].left();
        let right = self.nodes[node].right();

        let rebalance_from = match (left, right) {
            (Some(left), Some(right)) => {
                // The successor is the minimum of the right subtree. It has no left child, so it
                // can be unlinked by elevating its right child, then moved into `node`'s slot.
                let successor = self.extreme_in_subtree(right, Dir::Left);

                let rebalance_from = if successor == right {
                    successor
                } else {
                    let successor_parent = self.nodes[successor]
                        .parent
                        .expect("successor has a parent");
                    let successor_right = self.nodes[successor].right();

                    self.link_child(successor_parent, Dir::Left, successor_right);
                    self.link_child(successor, Dir::Right, Some(right));

                    successor_parent
                };

                self.link_child(successor, Dir::Left, Some(left));
                self.replace_child(parent, node, Some(successor));

                rebalance_from
            }

            (Some(child), None) | (None, Some(child)) => {
                self.replace_child(parent, node, Some(child));
                parent
            }

            (None, None) => {
                self.replace_child(parent, node, None);
                parent
            }
        };

        self.rebalance_upward(rebalance_from);

        let removed = self.nodes.free(node).expect("checked above");
        tracing::trace!(?node, len = self.len(), "removed node");

        removed.value
    }

    /// Removes every element from the set.
    ///
    /// Positions to removed elements become stale; the end position stays valid.
    pub fn clear(&mut self) {
        let header = self.header;
        self.nodes.retain(|id, _| id == header);

        self.nodes[header].clear_children();
        self.leftmost = header;

        tracing::trace!("cleared set");
    }

    /// Moves every element out of `self` into a new set, leaving `self` empty.
    ///
    /// This completes in _O(1)_ time. The returned set owns the original node graph, so
    /// positions taken from `self` before the call are valid for the returned set.
    pub fn take(&mut self) -> AvlSet<T> {
        mem::take(self)
    }

    /// Returns an iterator over the elements of the set, in ascending order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    /// Returns a cursor pointing at the first element of the set.
    ///
    /// If the set is empty, the cursor points at the "ghost" non-element.
    pub fn cursor_first(&self) -> Cursor<'_, T> {
        Cursor::new(self, self.begin())
    }

    /// Returns a cursor pointing at the last element of the set.
    ///
    /// If the set is empty, the cursor points at the "ghost" non-element.
    pub fn cursor_last(&self) -> Cursor<'_, T> {
        let last = self.prev(self.end()).unwrap_or_else(|| self.end());
        Cursor::new(self, last)
    }

    /// Returns a cursor pointing at `pos`, or `None` if `pos` is stale.
    pub fn cursor_at(&self, pos: Position) -> Option<Cursor<'_, T>> {
        self.nodes.contains(pos.node()).then(|| Cursor::new(self, pos))
    }

    /// Returns an editing cursor pointing at the first element of the set.
    pub fn cursor_first_mut(&mut self) -> CursorMut<'_, T> {
        let first = self.begin();
        CursorMut::new(self, first)
    }

    /// Returns an editing cursor pointing at the last element of the set.
    pub fn cursor_last_mut(&mut self) -> CursorMut<'_, T> {
        let last = self.prev(self.end()).unwrap_or_else(|| self.end());
        CursorMut::new(self, last)
    }

    /// Returns an editing cursor pointing at `pos`, or `None` if `pos` is stale.
    pub fn cursor_at_mut(&mut self, pos: Position) -> Option<CursorMut<'_, T>> {
        if !self.nodes.contains(pos.node()) {
            return None;
        }

        Some(CursorMut::new(self, pos))
    }

    // Support methods ========================================================

    #[inline]
    fn root(&self) -> Link {
        self.nodes[self.header].left()
    }

    #[inline]
    pub(crate) fn value(&self, node: NodeId) -> &T {
        self.nodes[node]
            .value
            .as_ref()
            .expect("the header has no value")
    }

    // Sets the `dir` child of `parent` to `child` and points `child` back at `parent`.
    pub(crate) fn link_child(&mut self, parent: NodeId, dir: Dir, child: Link) {
        self.nodes[parent].set_child(dir, child);

        if let Some(child) = child {
            self.nodes[child].parent = Some(parent);
        }
    }

    // Replaces the child link of `parent` pointing at `old_child` with `new_child`, and points
    // `new_child` back at `parent`.
    //
    // `old_child`'s own parent link is not updated.
    pub(crate) fn replace_child(&mut self, parent: NodeId, old_child: NodeId, new_child: Link) {
        let dir = self.which_child(parent, old_child);
        self.link_child(parent, dir, new_child);
    }

    fn which_child(&self, parent: NodeId, child: NodeId) -> Dir {
        if self.nodes[parent].left() == Some(child) {
            Dir::Left
        } else {
            debug_assert_eq!(
                self.nodes[parent].right(),
                Some(child),
                "`child` must be a child of `parent`"
            );
            Dir::Right
        }
    }

    // Follows `dir` links from `root` as far as they go.
    pub(crate) fn extreme_in_subtree(&self, root: NodeId, dir: Dir) -> NodeId {
        let mut cur = root;

        while let Some(next) = self.nodes[cur].child(dir) {
            cur = next;
        }

        cur
    }

    // Returns the in-order neighbour of `node` in direction `dir`: the successor for
    // `Dir::Right`, the predecessor for `Dir::Left`.
    //
    // If `node` has a `dir` child, the neighbour is the `!dir`-most node of that subtree.
    // Otherwise climb while `node` is a `dir` child; the neighbour is the first ancestor reached
    // through a `!dir` edge. Running off the header yields `None`.
    pub(crate) fn step(&self, node: NodeId, dir: Dir) -> Link {
        if let Some(child) = self.nodes[node].child(dir) {
            return Some(self.extreme_in_subtree(child, !dir));
        }

        let mut cur = node;
        while let Some(parent) = self.nodes[cur].parent {
            if self.nodes[parent].child(dir) == Some(cur) {
                cur = parent;
            } else {
                return Some(parent);
            }
        }

        None
    }

    // Counts the elements on the `dir` side of `node` in sorted order: those in its `dir`
    // subtree, plus each ancestor reached through a `!dir` edge together with that ancestor's
    // `dir` subtree.
    fn count_beyond(&self, node: NodeId, dir: Dir) -> usize {
        let mut count = self.size(self.nodes[node].child(dir));
        let mut cur = node;

        loop {
            let parent = self.nodes[cur].parent.expect("every real node has a parent");
            if parent == self.header {
                return count;
            }

            if self.nodes[parent].child(!dir) == Some(cur) {
                count += self.size(self.nodes[parent].child(dir)) + 1;
            }

            cur = parent;
        }
    }

    /// Checks every structural invariant of the tree.
    pub fn check_invariants(&self) -> Result<(), InvariantError>
    where
        T: Ord,
    {
        let header = self.nodes.get(self.header).ok_or(InvariantError::DanglingLink)?;
        if header.parent.is_some() || header.right().is_some() {
            return Err(InvariantError::MalformedHeader);
        }

        let size = match header.left() {
            Some(root) => self.check_subtree(root, self.header)?.1,
            None => 0,
        };

        if size != self.len() {
            return Err(InvariantError::LengthMismatch);
        }

        let min = self
            .root()
            .map(|root| self.extreme_in_subtree(root, Dir::Left))
            .unwrap_or(self.header);
        if min != self.leftmost {
            return Err(InvariantError::StaleLeftmost);
        }

        let mut prev: Option<&T> = None;
        for value in self.iter() {
            if prev.map_or(false, |prev| prev >= value) {
                return Err(InvariantError::OutOfOrder);
            }
            prev = Some(value);
        }

        Ok(())
    }

    // Returns the height and size of the subtree rooted at `node`, as recomputed from scratch.
    fn check_subtree(&self, node: NodeId, parent: NodeId) -> Result<(u32, usize), InvariantError> {
        let n = self.nodes.get(node).ok_or(InvariantError::DanglingLink)?;

        if n.parent != Some(parent) {
            return Err(InvariantError::ParentMismatch);
        }

        if n.value.is_none() {
            return Err(InvariantError::MissingValue);
        }

        let (left_height, left_size) = match n.left() {
            Some(left) => self.check_subtree(left, node)?,
            None => (0, 0),
        };

        let (right_height, right_size) = match n.right() {
            Some(right) => self.check_subtree(right, node)?,
            None => (0, 0),
        };

        if left_height.abs_diff(right_height) > 1 {
            return Err(InvariantError::Unbalanced);
        }

        if n.height != 1 + left_height.max(right_height) {
            return Err(InvariantError::HeightMismatch);
        }

        if n.size != 1 + left_size + right_size {
            return Err(InvariantError::SizeMismatch);
        }

        Ok((n.height, n.size))
    }

    /// Panics if any structural invariant of the tree is violated.
    #[doc(hidden)]
    #[track_caller]
    pub fn assert_invariants(&self)
    where
        T: Ord,
    {
        if let Err(e) = self.check_invariants() {
            panic!("AVL invariant violated: {e}");
        }
    }
}

impl<T: Ord> AvlSet<T> {
    /// Returns the position of `value`, or [`end`](AvlSet::end) if it is not in the set.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn find<Q>(&self, value: &Q) -> Position
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut opt_cur = self.root();

        while let Some(cur) = opt_cur {
            match value.cmp(self.value(cur).borrow()) {
                Ordering::Less => opt_cur = self.nodes[cur].left(),
                Ordering::Equal => return Position::new(cur),
                Ordering::Greater => opt_cur = self.nodes[cur].right(),
            }
        }

        self.end()
    }

    /// Returns `true` if the set contains `value`.
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(value) != self.end()
    }

    /// Returns the position of the smallest element strictly greater than `value`, or
    /// [`end`](AvlSet::end) if there is none.
    pub fn upper_bound<Q>(&self, value: &Q) -> Position
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.bound::<Q, _>(|cur| value < cur)
    }

    /// Returns the position of the smallest element greater than or equal to `value`, or
    /// [`end`](AvlSet::end) if there is none.
    pub fn lower_bound<Q>(&self, value: &Q) -> Position
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.bound::<Q, _>(|cur| value <= cur)
    }

    // Descends the tree, remembering the lowest node satisfying `accept`. `accept` must be
    // monotonic in sorted order (false for a prefix, true for the rest).
    fn bound<Q, F>(&self, accept: F) -> Position
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
        F: Fn(&Q) -> bool,
    {
        let mut result = self.header;
        let mut opt_cur = self.root();

        while let Some(cur) = opt_cur {
            if accept(self.value(cur).borrow()) {
                result = cur;
                opt_cur = self.nodes[cur].left();
            } else {
                opt_cur = self.nodes[cur].right();
            }
        }

        Position::new(result)
    }

    /// Inserts `value` into the set.
    ///
    /// Returns the position of `value` and `true` if it was inserted. If an equal value was
    /// already present, the set is left untouched and its position is returned with `false`.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, value: T) -> (Position, bool) {
        let mut parent = self.header;
        let mut dir = Dir::Left;
        let mut opt_cur = self.root();

        // Descend the tree, looking for a vacant leaf slot.
        while let Some(cur) = opt_cur {
            dir = match value.cmp(self.value(cur)) {
                Ordering::Less => Dir::Left,
                Ordering::Equal => return (Position::new(cur), false),
                Ordering::Greater => Dir::Right,
            };

            parent = cur;
            opt_cur = self.nodes[cur].child(dir);
        }

        let node = self.nodes.allocate(Node::new(value));
        self.link_child(parent, dir, Some(node));

        // A new minimum can only be attached as the left child of the old one (or of the
        // header, when the set was empty). Rotations never change which node is leftmost.
        if dir == Dir::Left && parent == self.leftmost {
            self.leftmost = node;
        }

        self.rebalance_upward(parent);
        tracing::trace!(?node, len = self.len(), "inserted node");

        (Position::new(node), true)
    }

    /// Removes `value` from the set and returns it, or returns `None` if it was not present.
    ///
    /// This is [`find`](AvlSet::find) followed by [`remove_at`](AvlSet::remove_at).
    pub fn remove<Q>(&mut self, value: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let pos = self.find(value);
        self.remove_at(pos)
    }
}

impl<T> Default for AvlSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for AvlSet<T> {
    /// Returns a deep copy of the set. The copy shares no nodes with `self`; positions into
    /// `self` refer to the corresponding values of the copy.
    fn clone(&self) -> Self {
        AvlSet {
            nodes: self.nodes.clone(),
            header: self.header,
            leftmost: self.leftmost,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for AvlSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for AvlSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for AvlSet<T> {}

impl<T: Ord> FromIterator<T> for AvlSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = AvlSet::new();
        set.extend(iter);
        set
    }
}

impl<T: Ord> Extend<T> for AvlSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<'a, T> IntoIterator for &'a AvlSet<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> IntoIterator for AvlSet<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}
