use crate::{arena::NodeId, AvlSet};

/// A reference to a single element of an [`AvlSet`], or to its end.
///
/// Positions are plain handles: they do not borrow the set, and two positions are equal exactly
/// when they name the same node, not merely equal values. A position stays valid across any
/// insertion or removal of *other* values. Once its own value is removed, the position is stale;
/// the set detects this and every lookup through it returns `None`.
///
/// A position is only meaningful for the set that produced it (or a clone of that set).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    node: NodeId,
}

impl Position {
    #[inline]
    pub(crate) fn new(node: NodeId) -> Position {
        Position { node }
    }

    #[inline]
    pub(crate) fn node(self) -> NodeId {
        self.node
    }
}

/// A cursor over an [`AvlSet`].
///
/// A cursor points either to an element of the set or to a "ghost" non-element that connects the
/// last element to the first. The ghost is the set's [`end`](AvlSet::end) position.
pub struct Cursor<'set, T> {
    set: &'set AvlSet<T>,
    pos: Position,
}

impl<'set, T> Cursor<'set, T> {
    pub(crate) fn new(set: &'set AvlSet<T>, pos: Position) -> Cursor<'set, T> {
        Cursor { set, pos }
    }

    /// Returns the position the cursor is pointing to.
    pub fn position(&self) -> Position {
        self.pos
    }

    /// Moves the cursor to the next element of the `AvlSet`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method moves it to the first
    /// element. If it is pointing to the last element, this method moves it to the "ghost"
    /// non-element.
    pub fn move_next(&mut self) {
        self.pos = next_or_wrap(self.set, self.pos);
    }

    /// Moves the cursor to the previous element of the `AvlSet`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method moves it to the last
    /// element. If it is pointing to the first element, this method moves it to the "ghost"
    /// non-element.
    pub fn move_prev(&mut self) {
        self.pos = prev_or_wrap(self.set, self.pos);
    }

    /// Returns a reference to the element pointed to by the cursor.
    ///
    /// This returns `None` if the cursor is currently pointing to the "ghost" non-element.
    pub fn get(&self) -> Option<&'set T> {
        self.set.get(self.pos)
    }

    /// Returns a reference to the next element.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method returns the first element.
    /// If it is pointing to the last element, this method returns `None`.
    pub fn peek_next(&self) -> Option<&'set T> {
        self.set.get(next_or_wrap(self.set, self.pos))
    }

    /// Returns a reference to the previous element.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method returns the last element.
    /// If it is pointing to the first element, this method returns `None`.
    pub fn peek_prev(&self) -> Option<&'set T> {
        self.set.get(prev_or_wrap(self.set, self.pos))
    }

    /// Returns the 0-based index of the current element in ascending order, or `None` at the
    /// "ghost" non-element.
    pub fn rank(&self) -> Option<usize> {
        self.set.rank(self.pos)
    }
}

impl<'set, T> Clone for Cursor<'set, T> {
    fn clone(&self) -> Self {
        Cursor {
            set: self.set,
            pos: self.pos,
        }
    }
}

/// A cursor over an [`AvlSet`] which supports removal.
///
/// A cursor points either to an element of the set or to a "ghost" non-element that connects the
/// last element to the first.
pub struct CursorMut<'set, T> {
    set: &'set mut AvlSet<T>,
    pos: Position,
}

impl<'set, T> CursorMut<'set, T> {
    pub(crate) fn new(set: &'set mut AvlSet<T>, pos: Position) -> CursorMut<'set, T> {
        CursorMut { set, pos }
    }

    /// Returns a read-only cursor pointing to the current element.
    ///
    /// The `CursorMut` remains immutably borrowed for the lifetime of the returned `Cursor`.
    pub fn as_cursor(&self) -> Cursor<'_, T> {
        Cursor::new(self.set, self.pos)
    }

    /// Returns the position the cursor is pointing to.
    pub fn position(&self) -> Position {
        self.pos
    }

    /// Moves the cursor to the next element of the `AvlSet`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method will move it to the first
    /// element. If it is pointing to the last element, this method will move it to the "ghost"
    /// non-element.
    pub fn move_next(&mut self) {
        self.pos = next_or_wrap(self.set, self.pos);
    }

    /// Moves the cursor to the previous element of the `AvlSet`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method will move it to the last
    /// element. If it is pointing to the first element, this method will move it to the "ghost"
    /// non-element.
    pub fn move_prev(&mut self) {
        self.pos = prev_or_wrap(self.set, self.pos);
    }

    /// Returns a reference to the element pointed to by the cursor.
    ///
    /// This returns `None` if the cursor is currently pointing to the "ghost" non-element.
    pub fn get(&self) -> Option<&T> {
        self.set.get(self.pos)
    }

    /// Returns a reference to the next element.
    pub fn peek_next(&self) -> Option<&T> {
        self.set.get(next_or_wrap(self.set, self.pos))
    }

    /// Returns a reference to the previous element.
    pub fn peek_prev(&self) -> Option<&T> {
        self.set.get(prev_or_wrap(self.set, self.pos))
    }

    /// Removes the current element from the set.
    ///
    /// This returns the removed element and moves the cursor to the next element. If the cursor is
    /// pointing to the "ghost" non-element, this method returns `None`, and neither the set nor
    /// the cursor is modified.
    pub fn remove_current(&mut self) -> Option<T> {
        if self.pos == self.set.end() {
            return None;
        }

        // Removal never recreates the neighbouring nodes, so the successor's position can be
        // taken before the current node is unlinked.
        let next = next_or_wrap(self.set, self.pos);
        let removed = self.set.remove_at(self.pos);
        self.pos = next;

        removed
    }

    /// Removes the current element from the set.
    ///
    /// This returns the removed element and moves the cursor to the previous element. If the
    /// cursor is pointing to the "ghost" non-element, this method returns `None`, and neither the
    /// set nor the cursor is modified.
    pub fn remove_current_and_move_prev(&mut self) -> Option<T> {
        if self.pos == self.set.end() {
            return None;
        }

        let prev = prev_or_wrap(self.set, self.pos);
        let removed = self.set.remove_at(self.pos);
        self.pos = prev;

        removed
    }
}

fn next_or_wrap<T>(set: &AvlSet<T>, pos: Position) -> Position {
    match set.next(pos) {
        Some(next) => next,
        None => set.begin(),
    }
}

fn prev_or_wrap<T>(set: &AvlSet<T>, pos: Position) -> Position {
    match set.prev(pos) {
        Some(prev) => prev,
        None => set.end(),
    }
}
