use core::{mem, ops::Not};

use crate::arena::NodeId;

pub(crate) type Link = Option<NodeId>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Dir {
    Left = 0,
    Right = 1,
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

/// A tree vertex.
///
/// `value` is `None` only for the header node, which is the parent of the real root and the
/// identity of the end position. The header never takes part in height or size accounting.
#[derive(Clone, Debug)]
pub(crate) struct Node<T> {
    pub(crate) value: Option<T>,
    pub(crate) height: u32,
    pub(crate) size: usize,
    pub(crate) parent: Link,
    children: [Link; 2],
}

impl<T> Node<T> {
    pub(crate) fn new(value: T) -> Node<T> {
        Node {
            value: Some(value),
            height: 1,
            size: 1,
            parent: None,
            children: [None; 2],
        }
    }

    pub(crate) fn header() -> Node<T> {
        Node {
            value: None,
            height: 1,
            size: 1,
            parent: None,
            children: [None; 2],
        }
    }

    #[inline]
    pub(crate) fn child(&self, dir: Dir) -> Link {
        self.children[dir as usize]
    }

    #[inline]
    pub(crate) fn left(&self) -> Link {
        self.child(Dir::Left)
    }

    #[inline]
    pub(crate) fn right(&self) -> Link {
        self.child(Dir::Right)
    }

    /// Overwrites one child link, returning the old one. The child's parent link is untouched.
    #[inline]
    pub(crate) fn set_child(&mut self, dir: Dir, child: Link) -> Link {
        mem::replace(&mut self.children[dir as usize], child)
    }

    #[inline]
    pub(crate) fn clear_children(&mut self) {
        self.children = [None; 2];
    }
}
