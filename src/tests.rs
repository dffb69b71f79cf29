use std::ops::Range;

use proptest::prelude::*;

use crate::model;

use super::*;

fn insert_find_all(keys: &[u32]) {
    let mut set: AvlSet<u32> = AvlSet::new();

    for &key in keys {
        set.insert(key);
        set.assert_invariants();
    }

    for key in keys {
        let pos = set.find(key);
        assert_ne!(pos, set.end(), "item not found");
        assert_eq!(set.get(pos), Some(key));
    }
}

#[test]
fn zero_elems_find() {
    insert_find_all(&[]);
}

#[test]
fn single_elem_find() {
    insert_find_all(&[0]);
}

#[test]
fn two_elems_find() {
    insert_find_all(&[0, 1]);
    insert_find_all(&[1, 0]);
}

#[test]
fn three_elems_find() {
    insert_find_all(&[0, 1, 2]);
    insert_find_all(&[0, 2, 1]);
    insert_find_all(&[1, 0, 2]);
    insert_find_all(&[1, 2, 0]);
    insert_find_all(&[2, 0, 1]);
    insert_find_all(&[2, 1, 0]);
}

// Calls `f` with every permutation of `0..n`.
fn for_each_permutation(n: u32, f: &mut dyn FnMut(&[u32])) {
    fn go(prefix: &mut Vec<u32>, rest: &mut Vec<u32>, f: &mut dyn FnMut(&[u32])) {
        if rest.is_empty() {
            f(prefix);
            return;
        }

        for i in 0..rest.len() {
            let item = rest.remove(i);
            prefix.push(item);
            go(prefix, rest, f);
            prefix.pop();
            rest.insert(i, item);
        }
    }

    go(&mut Vec::new(), &mut (0..n).collect(), f);
}

#[test]
fn four_and_five_elems_find() {
    for_each_permutation(4, &mut |keys| insert_find_all(keys));
    for_each_permutation(5, &mut |keys| insert_find_all(keys));
}

fn insert_remove_all(keys: &[u32]) {
    let mut set: AvlSet<u32> = AvlSet::new();

    for &key in keys {
        set.insert(key);
        set.assert_invariants();
    }

    for key in keys {
        assert_eq!(set.remove(key), Some(*key));
        set.assert_invariants();
    }

    assert_eq!(set.begin(), set.end());

    for &key in keys {
        set.insert(key);
        set.assert_invariants();
    }

    for key in keys.iter().rev() {
        let pos = set.find(key);
        assert_eq!(set.remove_at(pos), Some(*key));
        set.assert_invariants();
    }

    assert!(set.is_empty());
}

#[test]
fn remove_one() {
    insert_remove_all(&[0]);
}

#[test]
fn remove_two() {
    insert_remove_all(&[0, 1]);
    insert_remove_all(&[1, 0]);
}

#[test]
fn remove_three() {
    insert_remove_all(&[0, 1, 2]);
    insert_remove_all(&[0, 2, 1]);
    insert_remove_all(&[1, 0, 2]);
    insert_remove_all(&[1, 2, 0]);
    insert_remove_all(&[2, 0, 1]);
    insert_remove_all(&[2, 1, 0]);
}

#[test]
fn remove_four_to_six() {
    for n in 4..=6 {
        for_each_permutation(n, &mut |keys| insert_remove_all(keys));
    }
}

#[test]
fn empty_set() {
    let set: AvlSet<i32> = AvlSet::new();

    assert_eq!(set.begin(), set.end());
    assert!(set.is_empty());
    assert_eq!(set.first(), None);
    assert_eq!(set.last(), None);
    assert_eq!(set.get(set.end()), None);
    assert_eq!(set.next(set.end()), None);
    assert_eq!(set.prev(set.end()), None);
    set.assert_invariants();
}

#[test]
fn not_found() {
    let mut set = AvlSet::new();
    set.insert(42);

    assert_eq!(set.find(&43), set.end());
    assert!(!set.contains(&43));
}

#[test]
fn insert_duplicate() {
    let mut set = AvlSet::new();
    let (first, inserted) = set.insert(42);
    assert!(inserted);

    let (second, inserted) = set.insert(42);
    assert!(!inserted);
    assert_eq!(first, second);

    let mut count = 0;
    let mut pos = set.begin();
    while pos != set.end() {
        count += 1;
        pos = set.next(pos).unwrap();
    }
    assert_eq!(count, 1);
    assert_eq!(set.len(), 1);
}

#[test]
fn iterate_forward() {
    let mut set = AvlSet::new();
    set.insert(42);
    set.insert(41);
    set.insert(43);

    let mut pos = set.begin();
    for expected in [41, 42, 43] {
        assert_eq!(set.get(pos), Some(&expected));
        pos = set.next(pos).unwrap();
    }
    assert_eq!(pos, set.end());
    assert_eq!(set.next(pos), None);
}

#[test]
fn iterate_backward() {
    let mut set = AvlSet::new();
    set.insert(43);
    set.insert(41);
    set.insert(42);

    let mut pos = set.end();
    for expected in [43, 42, 41] {
        pos = set.prev(pos).unwrap();
        assert_eq!(set.get(pos), Some(&expected));
    }
    assert_eq!(pos, set.begin());
    assert_eq!(set.prev(pos), None);
}

#[test]
fn remove_by_position() {
    let mut set = AvlSet::new();
    set.insert(42);
    set.insert(43);

    assert_eq!(set.remove_at(set.find(&42)), Some(42));
    assert_eq!(set.find(&42), set.end());
    assert_ne!(set.find(&43), set.end());
}

#[test]
fn remove_by_value() {
    let mut set = AvlSet::new();
    set.insert(42);
    set.insert(43);

    assert_eq!(set.remove(&42), Some(42));
    assert_eq!(set.find(&42), set.end());
    assert_ne!(set.find(&43), set.end());
    assert_eq!(set.len(), 1);

    // Absent values are a no-op.
    assert_eq!(set.remove(&42), None);
    assert_eq!(set.len(), 1);
}

#[test]
fn remove_last() {
    let mut set = AvlSet::new();
    set.insert(42);
    set.remove(&42);

    assert_eq!(set.begin(), set.end());
    set.assert_invariants();
}

#[test]
fn remove_end_is_noop() {
    let mut set: AvlSet<u32> = (0..4).collect();
    let end = set.end();

    assert_eq!(set.remove_at(end), None);
    assert_eq!(set.len(), 4);
    set.assert_invariants();
}

#[test]
fn upper_bound() {
    let mut set = AvlSet::new();
    set.insert(10);
    set.insert(20);

    assert_eq!(set.get(set.upper_bound(&15)), Some(&20));
    assert_eq!(set.get(set.upper_bound(&10)), Some(&20));
    assert_eq!(set.get(set.upper_bound(&5)), Some(&10));
    assert_eq!(set.upper_bound(&20), set.end());
    assert_eq!(set.upper_bound(&30), set.end());
}

#[test]
fn lower_bound() {
    let set: AvlSet<i32> = [10, 20].into_iter().collect();

    assert_eq!(set.get(set.lower_bound(&10)), Some(&10));
    assert_eq!(set.get(set.lower_bound(&15)), Some(&20));
    assert_eq!(set.lower_bound(&21), set.end());
}

#[test]
fn strings() {
    let mut set = AvlSet::new();
    set.insert(String::from("DON'T"));
    set.insert(String::from("PANIC"));

    assert_eq!(set.get(set.begin()).map(String::as_str), Some("DON'T"));
    assert_ne!(set.find("PANIC"), set.end());
    assert_eq!(set.remove("PANIC").as_deref(), Some("PANIC"));
}

#[test]
fn clone_is_deep() {
    let mut src = AvlSet::new();
    src.insert(42);
    src.insert(43);
    src.insert(44);

    let mut copy = src.clone();
    copy.insert(45);

    for value in [42, 43, 44] {
        assert_ne!(src.find(&value), src.end());
        assert_ne!(copy.find(&value), copy.end());
    }

    assert_eq!(src.find(&45), src.end());
    assert_ne!(copy.find(&45), copy.end());

    copy.remove(&42);
    assert!(src.contains(&42));
    src.assert_invariants();
    copy.assert_invariants();
}

#[test]
fn take_leaves_source_empty() {
    let mut src = AvlSet::new();
    src.insert(42);
    src.insert(43);
    src.insert(44);

    let dest = src.take();

    for value in [42, 43, 44] {
        assert_eq!(src.find(&value), src.end());
        assert_ne!(dest.find(&value), dest.end());
    }

    assert!(src.is_empty());
    assert_eq!(src.begin(), src.end());
    src.assert_invariants();
    dest.assert_invariants();

    // The source is reusable.
    src.insert(1);
    assert_eq!(src.iter().copied().collect::<Vec<_>>(), [1]);
}

#[test]
fn positions_survive_rebalancing() {
    let mut set = AvlSet::new();
    let positions: Vec<_> = (0..64).map(|v| set.insert(v).0).collect();

    // Insertions and removals of other values rotate the tree around the kept positions.
    for v in 64..128 {
        set.insert(v);
    }
    for v in (0..64).filter(|v| v % 3 == 0) {
        set.remove(&v);
    }
    set.assert_invariants();

    for (v, pos) in positions.into_iter().enumerate() {
        if v % 3 == 0 {
            assert!(!set.is_valid(pos));
        } else {
            assert_eq!(set.get(pos), Some(&(v as i32)));
        }
    }
}

#[test]
fn successor_position_survives_two_child_removal() {
    let mut set: AvlSet<u32> = (0..7).collect();
    let root_value = *set.get(set.select(3)).unwrap();
    let successor = set.next(set.find(&root_value)).unwrap();

    set.remove(&root_value);

    assert_eq!(set.get(successor), Some(&(root_value + 1)));
    set.assert_invariants();
}

#[test]
fn stale_positions_are_rejected() {
    let mut set: AvlSet<u32> = (0..10).collect();
    let pos = set.find(&5);

    assert_eq!(set.remove_at(pos), Some(5));

    assert_eq!(set.get(pos), None);
    assert_eq!(set.next(pos), None);
    assert_eq!(set.prev(pos), None);
    assert_eq!(set.rank(pos), None);
    assert_eq!(set.remove_at(pos), None);
    assert!(set.cursor_at(pos).is_none());

    // The freed slot is reused, but the old position still does not see the new value.
    let (new_pos, _) = set.insert(100);
    assert_ne!(pos, new_pos);
    assert_eq!(set.get(pos), None);
    assert_eq!(set.len(), 10);
}

#[test]
fn clear_keeps_end() {
    let mut set: AvlSet<u32> = (0..10).collect();
    let end = set.end();
    let pos = set.find(&3);

    set.clear();

    assert!(set.is_empty());
    assert_eq!(set.end(), end);
    assert_eq!(set.begin(), end);
    assert_eq!(set.get(pos), None);
    set.assert_invariants();

    set.insert(7);
    assert_eq!(set.first(), Some(&7));
}

#[test]
fn rank_and_select() {
    let set: AvlSet<u32> = (0..100).map(|v| v * 2).collect();

    for (i, v) in set.iter().enumerate() {
        let pos = set.find(v);
        assert_eq!(set.rank(pos), Some(i));
        assert_eq!(set.rank_from_back(pos), Some(set.len() - 1 - i));
        assert_eq!(set.select(i), pos);
    }

    assert_eq!(set.rank(set.end()), None);
    assert_eq!(set.select(100), set.end());
}

#[test]
fn first_last_pop() {
    let mut set: AvlSet<u32> = [5, 1, 9, 3].into_iter().collect();

    assert_eq!(set.first(), Some(&1));
    assert_eq!(set.last(), Some(&9));
    assert_eq!(set.pop_first(), Some(1));
    assert_eq!(set.pop_last(), Some(9));
    assert_eq!(set.first(), Some(&3));
    assert_eq!(set.last(), Some(&5));
    set.assert_invariants();
}

#[test]
fn iterators() {
    let set: AvlSet<u32> = [3, 1, 2, 5, 4].into_iter().collect();

    assert_eq!(set.iter().copied().collect::<Vec<_>>(), [1, 2, 3, 4, 5]);
    assert_eq!(set.iter().rev().copied().collect::<Vec<_>>(), [5, 4, 3, 2, 1]);
    assert_eq!(set.iter().len(), 5);

    let mut iter = set.iter();
    assert_eq!(iter.next(), Some(&1));
    assert_eq!(iter.next_back(), Some(&5));
    assert_eq!(iter.next(), Some(&2));
    assert_eq!(iter.next_back(), Some(&4));
    assert_eq!(iter.next(), Some(&3));
    assert_eq!(iter.next(), None);
    assert_eq!(iter.next_back(), None);

    assert_eq!(set.clone().into_iter().rev().collect::<Vec<_>>(), [5, 4, 3, 2, 1]);
    assert_eq!(format!("{set:?}"), "{1, 2, 3, 4, 5}");
}

#[test]
fn cursor_wraps_through_ghost() {
    let set: AvlSet<u32> = (1..=3).collect();
    let mut cursor = set.cursor_first();

    assert_eq!(cursor.get(), Some(&1));
    assert_eq!(cursor.peek_prev(), None);

    cursor.move_prev();
    assert_eq!(cursor.get(), None);
    assert_eq!(cursor.position(), set.end());
    assert_eq!(cursor.peek_next(), Some(&1));
    assert_eq!(cursor.peek_prev(), Some(&3));

    cursor.move_prev();
    assert_eq!(cursor.get(), Some(&3));
    assert_eq!(cursor.rank(), Some(2));

    cursor.move_next();
    cursor.move_next();
    assert_eq!(cursor.get(), Some(&1));
}

#[test]
fn cursor_mut_removes() {
    let mut set: AvlSet<u32> = (0..6).collect();
    let start = set.find(&2);

    let mut cursor = set.cursor_at_mut(start).unwrap();
    assert_eq!(cursor.remove_current(), Some(2));
    assert_eq!(cursor.get(), Some(&3));
    assert_eq!(cursor.remove_current_and_move_prev(), Some(3));
    assert_eq!(cursor.get(), Some(&1));

    let mut cursor = set.cursor_last_mut();
    assert_eq!(cursor.remove_current(), Some(5));
    assert_eq!(cursor.get(), None);
    assert_eq!(cursor.remove_current(), None);

    assert_eq!(set.iter().copied().collect::<Vec<_>>(), [0, 1, 4]);
    set.assert_invariants();
}

#[test]
fn height_is_logarithmic() {
    let set: AvlSet<u32> = (0..1 << 12).collect();
    let root = set.root().unwrap();

    // An AVL tree of n nodes is at most about 1.44 * log2(n) high.
    assert!(set.nodes[root].height <= 18);
    assert_eq!(set.nodes[root].size, 1 << 12);
}

#[test]
fn invariant_violations_are_reported() {
    let mut set: AvlSet<u32> = (0..8).collect();
    let root = set.root().unwrap();

    set.nodes[root].height += 1;
    assert_eq!(set.check_invariants(), Err(InvariantError::HeightMismatch));
    set.nodes[root].height -= 1;

    set.nodes[root].size += 1;
    assert_eq!(set.check_invariants(), Err(InvariantError::SizeMismatch));
    set.nodes[root].size -= 1;

    assert_eq!(set.check_invariants(), Ok(()));
}

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(ops);
    }

    #[test]
    fn cursor_equivalence(
        values in proptest::collection::vec(0u32..1000, 0..100),
        ops in proptest::collection::vec(model::cursor_op_strategy(), FUZZ_RANGE),
    ) {
        model::run_cursor_equivalence(values, ops);
    }

    #[test]
    fn insert_then_remove_shuffled(
        values in proptest::collection::hash_set(any::<u32>(), 0..300)
            .prop_map(|s| s.into_iter().collect::<Vec<_>>())
            .prop_shuffle(),
        seed in any::<u64>(),
    ) {
        let mut set = AvlSet::new();

        for &v in &values {
            set.insert(v);
            set.assert_invariants();
        }
        prop_assert_eq!(set.len(), values.len());

        // Remove in a different order than insertion.
        let mut order = values.clone();
        let len = order.len();
        for i in 0..len {
            let j = (seed as usize).wrapping_mul(i + 1) % len;
            order.swap(i, j);
        }

        for v in order {
            prop_assert_eq!(set.remove(&v), Some(v));
            prop_assert_eq!(set.find(&v), set.end());
            set.assert_invariants();
        }

        prop_assert!(set.is_empty());
        prop_assert_eq!(set.begin(), set.end());
    }
}
