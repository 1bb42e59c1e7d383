extern crate std;

use std::{ops::Range, prelude::v1::*, sync::Once};

use proptest::prelude::*;

use crate::model;

use super::*;

fn init_tracing() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "arena_avl=warn".into()),
            )
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    });
}

fn tree_of(keys: &[u32]) -> AvlTree<u32, u32> {
    init_tracing();

    let mut tree = AvlTree::new();

    for &key in keys {
        tree.insert(key, key * 10);
        tree.assert_invariants();
    }

    tree
}

fn root_key(tree: &AvlTree<u32, u32>) -> Option<u32> {
    tree.base.root().map(|root| *tree.base.key(root))
}

fn child_key(tree: &AvlTree<u32, u32>, key: u32, dir: Dir) -> Option<u32> {
    let node = tree.base.locate(&key)?;
    tree.base.child(node, dir).map(|child| *tree.base.key(child))
}

fn balance_of(tree: &AvlTree<u32, u32>, key: u32) -> i8 {
    tree.base.balance(tree.base.locate(&key).expect("key not in tree"))
}

fn keys_of(tree: &AvlTree<u32, u32>) -> Vec<u32> {
    tree.keys().copied().collect()
}

fn insert_find_all(keys: &[u32]) {
    let tree = tree_of(keys);

    for key in keys {
        assert_eq!(tree.get(key), Some(&(key * 10)), "item not found");
    }

    let mut sorted = keys.to_vec();
    sorted.sort_unstable();
    assert_eq!(keys_of(&tree), sorted);
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

#[test]
fn four_elems_find() {
    insert_find_all(&[0, 1, 2, 3]);
    insert_find_all(&[0, 1, 3, 2]);
    insert_find_all(&[0, 2, 1, 3]);
    insert_find_all(&[0, 2, 3, 1]);
    insert_find_all(&[0, 3, 1, 2]);
    insert_find_all(&[0, 3, 2, 1]);

    insert_find_all(&[1, 0, 2, 3]);
    insert_find_all(&[1, 0, 3, 2]);
    insert_find_all(&[1, 2, 0, 3]);
    insert_find_all(&[1, 2, 3, 0]);
    insert_find_all(&[1, 3, 0, 2]);
    insert_find_all(&[1, 3, 2, 0]);

    insert_find_all(&[2, 0, 1, 3]);
    insert_find_all(&[2, 0, 3, 1]);
    insert_find_all(&[2, 1, 0, 3]);
    insert_find_all(&[2, 1, 3, 0]);
    insert_find_all(&[2, 3, 0, 1]);
    insert_find_all(&[2, 3, 1, 0]);

    insert_find_all(&[3, 0, 1, 2]);
    insert_find_all(&[3, 0, 2, 1]);
    insert_find_all(&[3, 1, 0, 2]);
    insert_find_all(&[3, 1, 2, 0]);
    insert_find_all(&[3, 2, 0, 1]);
    insert_find_all(&[3, 2, 1, 0]);
}

fn insert_remove_all(keys: &[u32]) {
    let mut tree = tree_of(keys);

    for key in keys {
        assert_eq!(tree.remove(key), Some(key * 10));
        tree.assert_invariants();
    }

    assert!(tree.is_empty());

    for &key in keys {
        tree.insert(key, key);
        tree.assert_invariants();
    }

    for key in keys.iter().rev() {
        assert_eq!(tree.remove(key), Some(*key));
        tree.assert_invariants();
    }

    assert!(tree.is_empty());
    assert_eq!(tree.base.root(), None);
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
fn remove_four() {
    insert_remove_all(&[0, 1, 2, 3]);
    insert_remove_all(&[0, 1, 3, 2]);
    insert_remove_all(&[0, 2, 1, 3]);
    insert_remove_all(&[0, 2, 3, 1]);
    insert_remove_all(&[0, 3, 1, 2]);
    insert_remove_all(&[0, 3, 2, 1]);

    insert_remove_all(&[1, 0, 2, 3]);
    insert_remove_all(&[1, 0, 3, 2]);
    insert_remove_all(&[1, 2, 0, 3]);
    insert_remove_all(&[1, 2, 3, 0]);
    insert_remove_all(&[1, 3, 0, 2]);
    insert_remove_all(&[1, 3, 2, 0]);

    insert_remove_all(&[2, 0, 1, 3]);
    insert_remove_all(&[2, 0, 3, 1]);
    insert_remove_all(&[2, 1, 0, 3]);
    insert_remove_all(&[2, 1, 3, 0]);
    insert_remove_all(&[2, 3, 0, 1]);
    insert_remove_all(&[2, 3, 1, 0]);

    insert_remove_all(&[3, 0, 1, 2]);
    insert_remove_all(&[3, 0, 2, 1]);
    insert_remove_all(&[3, 1, 0, 2]);
    insert_remove_all(&[3, 1, 2, 0]);
    insert_remove_all(&[3, 2, 0, 1]);
    insert_remove_all(&[3, 2, 1, 0]);
}

#[test]
fn ascending_inserts_rotate_left() {
    let tree = tree_of(&[10, 20, 30]);

    assert_eq!(root_key(&tree), Some(20));
    assert_eq!(child_key(&tree, 20, Dir::Left), Some(10));
    assert_eq!(child_key(&tree, 20, Dir::Right), Some(30));

    for key in [10, 20, 30] {
        assert_eq!(balance_of(&tree, key), 0);
    }
}

#[test]
fn right_left_inserts_rotate_twice() {
    let tree = tree_of(&[30, 10, 20]);

    assert_eq!(root_key(&tree), Some(20));
    assert_eq!(child_key(&tree, 20, Dir::Left), Some(10));
    assert_eq!(child_key(&tree, 20, Dir::Right), Some(30));

    for key in [10, 20, 30] {
        assert_eq!(balance_of(&tree, key), 0);
    }
}

#[test]
fn zig_zag_balances_follow_inner_grandchild() {
    // 30 leans left when 40 tips over, so 20 takes both of 30's subtrees and 40 keeps only 50.
    let tree = tree_of(&[40, 20, 50, 10, 30, 25]);

    assert_eq!(root_key(&tree), Some(30));
    assert_eq!(balance_of(&tree, 30), 0);
    assert_eq!(balance_of(&tree, 20), 0);
    assert_eq!(balance_of(&tree, 40), 1);

    let tree = tree_of(&[40, 20, 50, 10, 30, 35]);

    assert_eq!(root_key(&tree), Some(30));
    assert_eq!(balance_of(&tree, 30), 0);
    assert_eq!(balance_of(&tree, 20), -1);
    assert_eq!(balance_of(&tree, 40), 0);
}

#[test]
fn removals_from_complete_tree() {
    let mut tree = tree_of(&[4, 2, 6, 1, 3, 5, 7]);
    assert_eq!(tree.height(), 3);

    assert_eq!(tree.remove(&1), Some(10));
    tree.assert_invariants();
    assert_eq!(balance_of(&tree, 2), 1);

    assert_eq!(tree.remove(&2), Some(20));
    tree.assert_invariants();
    assert_eq!(keys_of(&tree), [3, 4, 5, 6, 7]);
    assert_eq!(balance_of(&tree, 4), 1);
    assert_eq!(child_key(&tree, 4, Dir::Left), Some(3));
}

#[test]
fn remove_rotation_keeping_height_stops() {
    // Removing 1 leaves 2 right-heavy by two with a balanced right child.
    let mut tree = tree_of(&[2, 1, 4, 3, 5]);

    tree.remove(&1);
    tree.assert_invariants();

    assert_eq!(root_key(&tree), Some(4));
    assert_eq!(balance_of(&tree, 4), -1);
    assert_eq!(balance_of(&tree, 2), 1);
}

#[test]
fn remove_propagates_to_root() {
    let keys: Vec<u32> = (0..64).collect();
    let mut tree = tree_of(&keys);

    for key in (0..64).step_by(3) {
        tree.remove(&key);
        tree.assert_invariants();
    }

    let expected: Vec<u32> = (0..64).filter(|k| k % 3 != 0).collect();
    assert_eq!(keys_of(&tree), expected);
}

#[test]
fn remove_absent_is_noop() {
    let mut empty: AvlTree<u32, u32> = AvlTree::new();
    assert_eq!(empty.remove(&7), None);
    assert!(empty.is_empty());

    let mut tree = tree_of(&[4, 2, 6]);
    let before = tree.clone();

    assert_eq!(tree.remove(&5), None);
    assert_eq!(tree, before);
    assert_eq!(root_key(&tree), Some(4));
    tree.assert_invariants();
}

#[test]
fn remove_two_children_takes_predecessor() {
    let mut tree = tree_of(&[5, 3, 8, 1, 4]);

    assert_eq!(tree.remove(&5), Some(50));
    tree.assert_invariants();

    assert_eq!(root_key(&tree), Some(4));
    assert_eq!(child_key(&tree, 4, Dir::Left), Some(3));
    assert_eq!(child_key(&tree, 4, Dir::Right), Some(8));
    assert_eq!(keys_of(&tree), [1, 3, 4, 8]);
    assert!(tree.is_height_balanced());
}

#[test]
fn reinsert_overwrites_in_place() {
    let mut tree = tree_of(&[4, 2, 6, 1, 3]);
    let shape: Vec<_> = [4, 2, 6, 1, 3]
        .iter()
        .map(|&k| (child_key(&tree, k, Dir::Left), child_key(&tree, k, Dir::Right)))
        .collect();

    assert_eq!(tree.insert(2, 99), Some(20));
    assert_eq!(tree.insert(2, 100), Some(99));
    assert_eq!(tree[&2], 100);
    assert_eq!(tree.len(), 5);

    let reshaped: Vec<_> = [4, 2, 6, 1, 3]
        .iter()
        .map(|&k| (child_key(&tree, k, Dir::Left), child_key(&tree, k, Dir::Right)))
        .collect();
    assert_eq!(shape, reshaped);
}

#[test]
fn keyed_access() {
    let mut tree = tree_of(&[1, 2, 3]);

    assert_eq!(tree.try_get(&2), Ok(&20));
    assert_eq!(tree.try_get(&4), Err(Error::KeyNotFound));
    *tree.try_get_mut(&3).unwrap() += 1;
    assert_eq!(tree[&3], 31);
    assert!(tree.contains_key(&1));
    assert!(!tree.contains_key(&0));
    assert_eq!(tree.get_key_value(&1), Some((&1, &10)));
    assert_eq!(tree.try_get_mut(&9), Err(Error::KeyNotFound));
}

#[test]
#[should_panic(expected = "key not found")]
fn index_missing_key_panics() {
    let tree = tree_of(&[1]);
    let _value: u32 = tree[&2];
}

#[test]
fn height_stays_logarithmic() {
    let keys: Vec<u32> = (0..1000).collect();
    let tree = tree_of(&keys);

    let bound = 1.4405 * ((tree.len() + 2) as f64).log2();
    assert!((tree.height() as f64) <= bound);
    assert!(tree.is_height_balanced());
}

#[test]
fn iteration_and_cursors() {
    let tree = tree_of(&[3, 1, 2, 5, 4]);

    assert_eq!(keys_of(&tree), [1, 2, 3, 4, 5]);
    assert_eq!(tree.iter().rev().map(|(k, _)| *k).collect::<Vec<_>>(), [5, 4, 3, 2, 1]);
    assert_eq!(tree.values().copied().collect::<Vec<_>>(), [10, 20, 30, 40, 50]);
    assert_eq!(tree.iter().len(), 5);

    let mut iter = tree.iter();
    assert_eq!(iter.next(), Some((&1, &10)));
    assert_eq!(iter.next_back(), Some((&5, &50)));
    assert_eq!(iter.len(), 3);
    assert_eq!(iter.map(|(k, _)| *k).collect::<Vec<_>>(), [2, 3, 4]);

    let mut visited = Vec::new();
    let mut cur = tree.begin();
    while cur != tree.end() {
        visited.push(*cur.key().unwrap());
        cur.move_next();
    }
    assert_eq!(visited, [1, 2, 3, 4, 5]);

    // Restarting yields the same sequence.
    let mut cur = tree.begin();
    assert_eq!(cur.key(), Some(&1));
    cur.move_prev();
    assert_eq!(cur, tree.end());
    cur.move_prev();
    assert_eq!(cur.key(), Some(&5));

    assert_eq!(tree.find(&3).value(), Some(&30));
    assert_eq!(tree.find(&3).peek_next(), Some((&4, &40)));
    assert_eq!(tree.find(&3).peek_prev(), Some((&2, &20)));
    assert_eq!(tree.find(&6), tree.end());

    let empty: AvlTree<u32, u32> = AvlTree::new();
    assert_eq!(empty.begin(), empty.end());
    assert_eq!(empty.iter().next(), None);
}

#[test]
fn cursor_mut_removes_and_edits() {
    let mut tree = tree_of(&[1, 2, 3, 4, 5, 6, 7]);

    let mut curs = tree.cursor_first_mut();
    curs.move_next();
    *curs.value_mut().unwrap() = 0;
    curs.move_next();
    curs.move_next();
    assert_eq!(curs.get(), Some((&4, &40)));

    // 4 is the root and has two children.
    assert_eq!(curs.remove_current(), Some((4, 40)));
    assert_eq!(curs.get(), Some((&5, &50)));
    assert_eq!(curs.remove_current_and_move_prev(), Some((5, 50)));
    assert_eq!(curs.get(), Some((&3, &30)));
    drop(curs);

    tree.assert_invariants();
    assert_eq!(keys_of(&tree), [1, 2, 3, 6, 7]);
    assert_eq!(tree[&2], 0);

    let mut curs = tree.cursor_last_mut();
    curs.move_next();
    assert_eq!(curs.get(), None);
    assert_eq!(curs.remove_current(), None);
}

#[test]
fn entries() {
    let mut tree: AvlTree<u32, u32> = AvlTree::new();

    for key in [5, 3, 8, 1, 4, 3, 5, 5] {
        *tree.entry(key).or_insert(0) += 1;
        tree.assert_invariants();
    }

    assert_eq!(tree.iter().collect::<Vec<_>>(), [(&1, &1), (&3, &2), (&4, &1), (&5, &3), (&8, &1)]);

    tree.entry(9).and_modify(|v| *v = 100).or_default();
    assert_eq!(tree[&9], 0);
    tree.entry(9).and_modify(|v| *v = 100).or_default();
    assert_eq!(tree[&9], 100);

    match tree.entry(5) {
        Entry::Occupied(mut entry) => {
            assert_eq!(entry.key(), &5);
            assert_eq!(entry.insert(7), 3);
            assert_eq!(entry.remove(), 7);
        }
        Entry::Vacant(_) => panic!("5 should be present"),
    }

    tree.assert_invariants();
    assert!(!tree.contains_key(&5));

    match tree.entry(6) {
        Entry::Vacant(entry) => {
            assert_eq!(entry.key(), &6);
            *entry.insert(60) += 1;
        }
        Entry::Occupied(_) => panic!("6 should be absent"),
    }

    tree.assert_invariants();
    assert_eq!(tree[&6], 61);

    match tree.entry(2) {
        Entry::Vacant(entry) => assert_eq!(entry.into_key(), 2),
        Entry::Occupied(_) => panic!("2 should be absent"),
    }

    assert!(!tree.contains_key(&2));
    assert_eq!(tree.len(), 6);
}

#[test]
fn first_last_and_pops() {
    let mut tree = tree_of(&[2, 4, 1, 3]);

    assert_eq!(tree.first_key_value(), Some((&1, &10)));
    assert_eq!(tree.last_key_value(), Some((&4, &40)));
    assert_eq!(tree.pop_first(), Some((1, 10)));
    assert_eq!(tree.pop_last(), Some((4, 40)));
    tree.assert_invariants();
    assert_eq!(keys_of(&tree), [2, 3]);
}

#[test]
fn collect_extend_and_drain() {
    let mut tree: AvlTree<u32, &str> = [(2, "b"), (1, "a")].into_iter().collect();
    tree.extend([(3, "c"), (1, "z")]);

    assert_eq!(std::format!("{tree:?}"), r#"{1: "z", 2: "b", 3: "c"}"#);
    assert_eq!(tree.remove_entry(&2), Some((2, "b")));

    let drained: Vec<_> = tree.into_iter().collect();
    assert_eq!(drained, [(1, "z"), (3, "c")]);
}

#[test]
fn borrowed_lookups() {
    let mut tree: AvlTree<String, usize> = AvlTree::new();

    for word in ["pear", "apple", "fig"] {
        tree.insert(word.to_string(), word.len());
    }

    assert_eq!(tree.get("fig"), Some(&3));
    assert_eq!(tree.remove("apple"), Some(5));
    assert_eq!(tree.keys().map(String::as_str).collect::<Vec<_>>(), ["fig", "pear"]);
}

#[test]
fn clear_then_reuse() {
    let mut tree = tree_of(&[1, 2, 3, 4]);
    tree.clear();

    assert!(tree.is_empty());
    assert_eq!(tree.height(), 0);
    assert_eq!(tree.check_invariants(), Ok(()));

    tree.insert(9, 90);
    assert_eq!(keys_of(&tree), [9]);
}

#[test]
fn check_invariants_reports_corruption() {
    let mut tree = tree_of(&[2, 1, 3]);
    let root = tree.base.root().unwrap();

    tree.base.set_balance(root, 1);
    assert_eq!(
        tree.check_invariants(),
        Err(Error::InvariantViolation("balance factor does not match heights"))
    );
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
        init_tracing();
        model::run_btree_equivalence(ops);
    }

    #[test]
    fn cursor_equivalence(
        values in proptest::collection::vec(0u32..1000, 0..100),
        ops in proptest::collection::vec(model::cursor_op_strategy(), FUZZ_RANGE),
    ) {
        init_tracing();
        model::run_cursor_equivalence(values, ops);
    }

    #[test]
    fn insert_then_remove_everything(keys in proptest::collection::vec(0u32..500, 0..200)) {
        let mut tree = tree_of(&[]);

        for &key in &keys {
            tree.insert(key, key);
        }
        tree.assert_invariants();

        let mut removal_order = keys.clone();
        removal_order.reverse();
        removal_order.sort_by_key(|k| k % 7);

        for key in removal_order {
            tree.remove(&key);
            tree.assert_invariants();
        }

        prop_assert!(tree.is_empty());
        prop_assert_eq!(tree.height(), 0);
    }
}
