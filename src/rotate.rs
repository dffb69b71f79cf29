//! Height bookkeeping, rotations and the AVL rebalance.
//!
//! Conventions used below:
//! - `h(x)` is the cached height of `x`, with a missing child counting as 0.
//! - The balance of `x` is `h(right(x)) - h(left(x))`.
//! - A node whose balance is ±2 is out of balance; every other node is in {-1, 0, 1}.
//!
//! Rotations only relink existing nodes. No node is freed or allocated here, which is what keeps
//! positions to untouched values valid across any mutation.

use crate::{
    arena::NodeId,
    node::{Dir, Link},
    AvlSet,
};

impl<T> AvlSet<T> {
    #[inline]
    pub(crate) fn height(&self, link: Link) -> u32 {
        link.map(|n| self.nodes[n].height).unwrap_or(0)
    }

    #[inline]
    pub(crate) fn size(&self, link: Link) -> usize {
        link.map(|n| self.nodes[n].size).unwrap_or(0)
    }

    /// Recomputes the height and size of `node` from its direct children.
    pub(crate) fn recalc(&mut self, node: NodeId) {
        let (left, right) = (self.nodes[node].left(), self.nodes[node].right());
        let height = 1 + self.height(left).max(self.height(right));
        let size = 1 + self.size(left) + self.size(right);

        let node = &mut self.nodes[node];
        node.height = height;
        node.size = size;
    }

    pub(crate) fn balance(&self, node: NodeId) -> i64 {
        let node = &self.nodes[node];
        i64::from(self.height(node.right())) - i64::from(self.height(node.left()))
    }

    // Rotates `node` down in direction `dir`, raising its `!dir` child (the pivot) into its
    // place. Returns the pivot.
    //
    // Both `node` and the pivot are recomputed, in that order, before returning.
    pub(crate) fn rotate(&mut self, node: NodeId, dir: Dir) -> NodeId {
        let pivot = self.nodes[node]
            .child(!dir)
            .expect("rotation requires a child on the far side");
        let parent = self.nodes[node]
            .parent
            .expect("the header is never rotated");

        // - `across` goes from the `dir` child of `pivot` to the `!dir` child of `node`.
        // - `pivot` takes `node`'s place under `parent`.
        // - `node` becomes the `dir` child of `pivot`.
        let across = self.nodes[pivot].child(dir);
        self.link_child(node, !dir, across);
        self.replace_child(parent, node, Some(pivot));
        self.link_child(pivot, dir, Some(node));

        self.recalc(node);
        self.recalc(pivot);

        tracing::trace!(?node, ?pivot, ?dir, "rotated");

        pivot
    }

    /// Restores the balance of `node`, assuming both of its subtrees are balanced and their
    /// heights differ by at most two.
    ///
    /// Returns the root of the subtree that replaced `node`, which is `node` itself if no
    /// rotation was needed.
    pub(crate) fn rebalance(&mut self, node: NodeId) -> NodeId {
        match self.balance(node) {
            2 => {
                let right = self.nodes[node].right().expect("right-heavy node has a right child");

                // Right-left case: straighten the zig-zag first.
                if self.balance(right) == -1 {
                    self.rotate(right, Dir::Right);
                }

                self.rotate(node, Dir::Left)
            }

            -2 => {
                let left = self.nodes[node].left().expect("left-heavy node has a left child");

                // Left-right case.
                if self.balance(left) == 1 {
                    self.rotate(left, Dir::Left);
                }

                self.rotate(node, Dir::Right)
            }

            balance => {
                debug_assert!((-1..=1).contains(&balance), "balance {balance} out of range");
                node
            }
        }
    }

    // Walks from `node` up to the header, recomputing and rebalancing every node on the way.
    pub(crate) fn rebalance_upward(&mut self, node: NodeId) {
        let mut cur = node;

        while cur != self.header {
            self.recalc(cur);

            let subtree_root = self.rebalance(cur);
            if subtree_root != cur {
                tracing::trace!(old = ?cur, new = ?subtree_root, "rebalanced subtree");
            }

            cur = self.nodes[subtree_root]
                .parent
                .expect("every real node has a parent");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{node::Dir, AvlSet};

    // Builds the degenerate chain 1 -> 2 -> 3 by hand, bypassing `insert`'s rebalancing.
    fn right_chain() -> AvlSet<u32> {
        let mut set = AvlSet::new();
        set.insert(1);

        let one = set.find(&1).node();
        let two = set.nodes.allocate(crate::node::Node::new(2));
        let three = set.nodes.allocate(crate::node::Node::new(3));
        set.link_child(one, Dir::Right, Some(two));
        set.link_child(two, Dir::Right, Some(three));
        set.recalc(three);
        set.recalc(two);
        set.recalc(one);
        set
    }

    #[test]
    fn balance_of_chain() {
        let set = right_chain();
        let one = set.find(&1).node();

        assert_eq!(set.balance(one), 2);
        assert_eq!(set.nodes[one].height, 3);
        assert_eq!(set.nodes[one].size, 3);
    }

    #[test]
    fn rotate_left_recomputes_both() {
        let mut set = right_chain();
        let one = set.find(&1).node();

        let pivot = set.rotate(one, Dir::Left);

        assert_eq!(set.nodes[pivot].value, Some(2));
        assert_eq!(set.nodes[pivot].parent, Some(set.header));
        assert_eq!(set.nodes[set.header].left(), Some(pivot));
        assert_eq!(set.nodes[one].parent, Some(pivot));
        assert_eq!(set.nodes[one].height, 1);
        assert_eq!(set.nodes[one].size, 1);
        assert_eq!(set.nodes[pivot].height, 2);
        assert_eq!(set.nodes[pivot].size, 3);
        set.assert_invariants();
    }

    #[test]
    fn rebalance_right_left() {
        let mut set = AvlSet::new();
        set.insert(1);

        let one = set.find(&1).node();
        let three = set.nodes.allocate(crate::node::Node::new(3));
        let two = set.nodes.allocate(crate::node::Node::new(2));
        set.link_child(one, Dir::Right, Some(three));
        set.link_child(three, Dir::Left, Some(two));
        set.recalc(two);
        set.recalc(three);
        set.recalc(one);

        assert_eq!(set.balance(one), 2);
        assert_eq!(set.balance(three), -1);

        // The middle value ends up on top, and node identities are preserved.
        let root = set.rebalance(one);
        assert_eq!(root, two);
        assert_eq!(set.nodes[two].left(), Some(one));
        assert_eq!(set.nodes[two].right(), Some(three));
        set.assert_invariants();
    }

    #[test]
    fn rebalance_noop_when_balanced() {
        let mut set: AvlSet<u32> = (0..3).collect();
        let root = set.nodes[set.header].left().unwrap();

        assert_eq!(set.rebalance(root), root);
    }
}
