use core::iter::FusedIterator;

use crate::{arena::NodeId, node::Dir, AvlSet};

/// An iterator over the elements of an [`AvlSet`], in ascending order.
///
/// Each step follows parent and child links from the previous node, so advancing costs
/// _O(1)_ amortized and _O(log(n))_ in the worst case.
pub struct Iter<'set, T> {
    set: &'set AvlSet<T>,

    // Next node to yield from the front.
    front: NodeId,
    // Last node yielded from the back; starts at the header.
    back: NodeId,

    len: usize,
}

impl<'set, T> Iter<'set, T> {
    pub(crate) fn new(set: &'set AvlSet<T>) -> Self {
        Iter {
            set,
            front: set.begin().node(),
            back: set.end().node(),
            len: set.len(),
        }
    }
}

impl<'set, T> Iterator for Iter<'set, T> {
    type Item = &'set T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let cur = self.front;
        self.front = self
            .set
            .step(cur, Dir::Right)
            .expect("a real node is always followed by a node or the header");
        self.len -= 1;

        Some(self.set.value(cur))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'set, T> DoubleEndedIterator for Iter<'set, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        self.back = self
            .set
            .step(self.back, Dir::Left)
            .expect("nodes remain before the back cursor");
        self.len -= 1;

        Some(self.set.value(self.back))
    }
}

impl<'set, T> ExactSizeIterator for Iter<'set, T> {}

impl<'set, T> FusedIterator for Iter<'set, T> {}

impl<'set, T> Clone for Iter<'set, T> {
    fn clone(&self) -> Self {
        Iter {
            set: self.set,
            front: self.front,
            back: self.back,
            len: self.len,
        }
    }
}

/// An owning iterator over the elements of an [`AvlSet`], in ascending order.
pub struct IntoIter<T> {
    set: AvlSet<T>,
}

impl<T> IntoIter<T> {
    pub(crate) fn new(set: AvlSet<T>) -> Self {
        IntoIter { set }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.set.pop_first()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.set.len(), Some(self.set.len()))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.set.pop_last()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}
