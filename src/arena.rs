//! Slot storage for tree nodes.
//!
//! Every node of an [`AvlSet`](crate::AvlSet) lives in a slot of an [`Arena`]. Links between
//! nodes are [`NodeId`]s rather than references, so parent links do not fight with the
//! ownership of child links. Freed slots go onto a free list and are reused by later
//! allocations; each slot carries a generation that is bumped on free, so a handle to a freed
//! node is detected instead of silently aliasing whatever node reuses the slot.

use core::ops::{Index, IndexMut};
use std::vec::Vec;

/// A checked handle to a slot in an [`Arena`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeId {
    index: usize,
    generation: u32,
}

#[derive(Clone)]
enum Slot<T> {
    Occupied { generation: u32, value: T },
    Vacant { generation: u32, next_free: Option<usize> },
}

#[derive(Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<usize>,
    len: usize,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Arena {
            slots: Vec::new(),
            free_head: None,
            len: 0,
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Arena {
            slots: Vec::with_capacity(capacity),
            free_head: None,
            len: 0,
        }
    }

    /// Returns the number of occupied slots.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Stores `value` in a free slot, reusing a vacant one if possible.
    pub(crate) fn allocate(&mut self, value: T) -> NodeId {
        self.len += 1;

        let Some(index) = self.free_head else {
            self.slots.push(Slot::Occupied {
                generation: 0,
                value,
            });

            return NodeId {
                index: self.slots.len() - 1,
                generation: 0,
            };
        };

        let (generation, next_free) = match self.slots[index] {
            Slot::Vacant {
                generation,
                next_free,
            } => (generation, next_free),
            Slot::Occupied { .. } => unreachable!("free list points at an occupied slot"),
        };

        self.free_head = next_free;
        self.slots[index] = Slot::Occupied { generation, value };

        NodeId { index, generation }
    }

    /// Frees the slot referenced by `id` and returns its value.
    ///
    /// Returns `None` if `id` is stale or out of bounds.
    pub(crate) fn free(&mut self, id: NodeId) -> Option<T> {
        if !self.contains(id) {
            return None;
        }

        let vacant = Slot::Vacant {
            generation: id.generation.wrapping_add(1),
            next_free: self.free_head,
        };

        match core::mem::replace(&mut self.slots[id.index], vacant) {
            Slot::Occupied { value, .. } => {
                self.free_head = Some(id.index);
                self.len -= 1;
                Some(value)
            }
            Slot::Vacant { .. } => unreachable!("checked above"),
        }
    }

    /// Returns `true` if `id` refers to a live value.
    #[inline]
    pub(crate) fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> Option<&T> {
        match self.slots.get(id.index)? {
            Slot::Occupied { generation, value } if *generation == id.generation => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        match self.slots.get_mut(id.index)? {
            Slot::Occupied { generation, value } if *generation == id.generation => Some(value),
            _ => None,
        }
    }

    /// Frees every value for which `keep` returns `false`.
    pub(crate) fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(NodeId, &T) -> bool,
    {
        for index in 0..self.slots.len() {
            let id = match &self.slots[index] {
                Slot::Occupied { generation, value } => {
                    let id = NodeId {
                        index,
                        generation: *generation,
                    };

                    if keep(id, value) {
                        continue;
                    }

                    id
                }
                Slot::Vacant { .. } => continue,
            };

            self.free(id);
        }
    }
}

impl<T> Index<NodeId> for Arena<T> {
    type Output = T;

    #[inline]
    fn index(&self, id: NodeId) -> &T {
        self.get(id).expect("stale node handle")
    }
}

impl<T> IndexMut<NodeId> for Arena<T> {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        self.get_mut(id).expect("stale node handle")
    }
}
