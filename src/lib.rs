//! An arena-backed AVL tree.
#![no_std]

// Conventions used in comments:
// - The height of a subtree `x` is denoted `h(x)`; an empty subtree has height 0.
// - The balance factor of a node `x` is `bf(x) = h(right(x)) - h(left(x))`.
// - A node is left-heavy if `bf(x) < 0` and right-heavy if `bf(x) > 0`.
//
// The fundamental invariants of an AVL tree are:
// 1. Keys are in strict binary search tree order.
// 2. Every node has `bf(x) ∈ {-1, 0, 1}`.
//
// Balance factors are stored, not recomputed. A single link or unlink changes the height of
// exactly one subtree by one, which can push one ancestor to `bf = ±2`. The fix-ups walk up from
// the structural change, adjusting stored balance factors, and rotate at the first ancestor that
// leaves the invariant. `±2` is never observable outside `insert` and `remove`.

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

use core::{borrow::Borrow, mem};

mod base;
mod cursor;
mod entry;
mod error;
mod iter;
mod map;

#[cfg(any(test, feature = "model"))]
pub mod model;

#[cfg(test)]
mod tests;

use base::{BaseTree, Dir, InsertAs, NodeId, Search};
use error::invariant_violation;

pub use cursor::{Cursor, CursorMut};
pub use entry::{Entry, OccupiedEntry, VacantEntry};
pub use error::Error;
pub use iter::{IntoIter, Iter, Keys, Values};

/// An ordered map implemented as an AVL tree.
///
/// Insertion, removal and lookup complete in _O(log(n))_ time. Keys are unique; inserting an
/// existing key overwrites its value in place.
#[derive(Clone)]
pub struct AvlTree<K, V> {
    base: BaseTree<K, V>,
}

impl<K, V> AvlTree<K, V> {
    /// Returns a new empty tree.
    pub const fn new() -> AvlTree<K, V> {
        AvlTree {
            base: BaseTree::new(),
        }
    }

    /// Returns `true` if the tree contains no elements.
    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    /// Returns the number of elements in the tree.
    pub fn len(&self) -> usize {
        self.base.len()
    }

    /// Returns the number of nodes on the longest root-to-leaf path.
    pub fn height(&self) -> usize {
        self.base.height(self.base.root())
    }

    /// Returns `true` if the heights of every node's subtrees differ by at most one.
    ///
    /// This recomputes every height from scratch and never consults stored balance factors. It
    /// exists for validation; the tree does not use it.
    pub fn is_height_balanced(&self) -> bool {
        self.base.is_height_balanced()
    }

    /// Returns the first key-value pair in the tree.
    ///
    /// The returned key is the minimum key in the tree.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        let node = self.base.node(self.base.first()?);
        Some((&node.key, &node.value))
    }

    /// Returns the last key-value pair in the tree.
    ///
    /// The returned key is the maximum key in the tree.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        let node = self.base.node(self.base.last()?);
        Some((&node.key, &node.value))
    }

    /// Removes and returns the first key-value pair in the tree.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let first = self.base.first()?;
        Some(self.remove_at(first))
    }

    /// Removes and returns the last key-value pair in the tree.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let last = self.base.last()?;
        Some(self.remove_at(last))
    }

    /// Clears the tree, removing all elements.
    pub fn clear(&mut self) {
        tracing::debug!(len = self.len(), "clearing tree");
        self.base.clear();
    }

    /// Returns an iterator over the entries of the tree, in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.base)
    }

    /// Returns an iterator over the keys of the tree, in ascending order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values of the tree, in ascending key order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns a cursor pointing at the minimum element.
    ///
    /// For an empty tree this is the same position as [`end`](Self::end).
    pub fn begin(&self) -> Cursor<'_, K, V> {
        Cursor::first(self)
    }

    /// Returns a cursor pointing at the "ghost" non-element past the maximum element.
    pub fn end(&self) -> Cursor<'_, K, V> {
        Cursor::ghost(self)
    }

    /// Returns a mutable cursor pointing at the minimum element.
    pub fn cursor_first_mut(&mut self) -> CursorMut<'_, K, V> {
        CursorMut::first(self)
    }

    /// Returns a mutable cursor pointing at the maximum element.
    pub fn cursor_last_mut(&mut self) -> CursorMut<'_, K, V> {
        CursorMut::last(self)
    }

    /// Verifies every structural and balance invariant of the tree.
    ///
    /// This walks the whole tree and is intended for tests and debugging.
    pub fn check_invariants(&self) -> Result<(), Error>
    where
        K: Ord,
    {
        let Some(root) = self.base.root() else {
            return if self.base.len() == 0 {
                Ok(())
            } else {
                Err(Error::InvariantViolation("empty tree has a nonzero length"))
            };
        };

        if self.base.parent(root).is_some() {
            return Err(Error::InvariantViolation("root has a parent"));
        }

        let mut count = 0;
        self.check_invariants_at(root, None, None, &mut count)?;

        if count != self.base.len() {
            return Err(Error::InvariantViolation("length does not match node count"));
        }

        Ok(())
    }

    // Returns the height of the subtree at `node`, checking that every key lies strictly between
    // `lower` and `upper`.
    fn check_invariants_at(
        &self,
        node: NodeId,
        lower: Option<&K>,
        upper: Option<&K>,
        count: &mut usize,
    ) -> Result<usize, Error>
    where
        K: Ord,
    {
        *count += 1;
        let key = self.base.key(node);

        if lower.is_some_and(|lower| key <= lower) || upper.is_some_and(|upper| key >= upper) {
            return Err(Error::InvariantViolation("keys are out of order"));
        }

        let mut heights = [0; 2];

        for dir in [Dir::Left, Dir::Right] {
            let Some(child) = self.base.child(node, dir) else {
                continue;
            };

            // Ensure child's parent link points to this node.
            if self.base.parent(child) != Some(node) {
                return Err(Error::InvariantViolation("child does not point back at its parent"));
            }

            let (lower, upper) = match dir {
                Dir::Left => (lower, Some(key)),
                Dir::Right => (Some(key), upper),
            };

            heights[dir as usize] = self.check_invariants_at(child, lower, upper, count)?;
        }

        let [left, right] = heights;
        let balance = self.base.balance(node);

        if !(-1..=1).contains(&balance) {
            return Err(Error::InvariantViolation("balance factor out of range"));
        }

        if right as isize - left as isize != isize::from(balance) {
            return Err(Error::InvariantViolation("balance factor does not match heights"));
        }

        Ok(1 + left.max(right))
    }

    /// Panics if [`check_invariants`](Self::check_invariants) finds a violation.
    #[doc(hidden)]
    #[track_caller]
    pub fn assert_invariants(&self)
    where
        K: Ord,
    {
        if let Err(error) = self.check_invariants() {
            panic!("{error}");
        }
    }

    // Links a new node at a vacant position and restores balance along its path.
    pub(crate) fn insert_at(&mut self, at: InsertAs, key: K, value: V) -> NodeId {
        let node = self.base.link(at, key, value);

        if let InsertAs::Child { parent, dir } = at {
            if self.base.balance(parent) != 0 {
                // The new leaf filled the parent's shorter side; its height is unchanged.
                self.base.set_balance(parent, 0);
            } else {
                self.base.update_balance(parent, dir.balance_diff());
                self.insert_fix(parent, node);
            }
        }

        node
    }

    // Propagates a height increase of the subtree at `parent` toward the root.
    //
    // Invariants:
    // - `node` is a child of `parent`.
    // - The subtree at `parent` just grew by one level and `bf(parent) = ±1`.
    fn insert_fix(&mut self, mut parent: NodeId, mut node: NodeId) {
        while let Some(grandparent) = self.base.parent(parent) {
            let dir = self.base.which_child(grandparent, parent);
            self.base.update_balance(grandparent, dir.balance_diff());

            match self.base.balance(grandparent) {
                // The growth filled in the shorter side.
                0 => return,

                // The grandparent grew too. Ascend one level.
                -1 | 1 => (parent, node) = (grandparent, parent),

                -2 | 2 => {
                    self.rebalance_inserted(grandparent, parent, node, dir);
                    return;
                }

                _ => invariant_violation("balance factor out of range after insertion"),
            }
        }
    }

    // Rotates the subtree at `g`, which is too heavy on side `heavy` after an insertion below `n`.
    //
    // Either rotation restores the subtree to its height from before the insertion, so nothing
    // above `g` changes.
    fn rebalance_inserted(&mut self, g: NodeId, p: NodeId, n: NodeId, heavy: Dir) {
        let sign = heavy.balance_diff();

        if self.is_zig_zig(g, p, n) {
            tracing::trace!(?g, ?p, ?n, ?heavy, "insert: zig-zig");

            self.rotate(g, !heavy);
            self.base.set_balance(g, 0);
            self.base.set_balance(p, 0);
        } else {
            debug_assert!(self.is_zig_zag(g, p, n));
            tracing::trace!(?g, ?p, ?n, ?heavy, "insert: zig-zag");

            let n_balance = self.base.balance(n);
            self.rotate(p, heavy);
            self.rotate(g, !heavy);

            // `g` and `p` each inherit one of `n`'s subtrees. Whichever side of `n` was shorter
            // leaves the node that received it leaning away.
            let (g_balance, p_balance) = match n_balance {
                b if b == sign => (-sign, 0),
                0 => (0, 0),
                _ => (0, sign),
            };

            self.base.set_balance(g, g_balance);
            self.base.set_balance(p, p_balance);
            self.base.set_balance(n, 0);
        }
    }

    // Removes the node `node`, returning its key and value.
    pub(crate) fn remove_at(&mut self, node: NodeId) -> (K, V) {
        if self.base.left(node).is_some() && self.base.right(node).is_some() {
            // Trade places with the predecessor, which has no right child. `node` then has at most
            // one child.
            let Some(predecessor) = self.base.predecessor(node) else {
                invariant_violation("node with a left child has no predecessor");
            };

            self.swap_positions(node, predecessor);
        }

        let parent = self.base.parent(node);
        let diff = parent.map_or(0, |p| self.removal_diff(p, node));

        let removed = self.base.splice_out(node);
        self.remove_fix(parent, diff);

        (removed.key, removed.value)
    }

    // The change in `parent`'s balance factor when its `child` subtree loses a level.
    fn removal_diff(&self, parent: NodeId, child: NodeId) -> i8 {
        -self.base.which_child(parent, child).balance_diff()
    }

    // Exchanges the tree positions of two nodes along with their balance factors, so that each
    // position keeps the balance factor its shape requires.
    fn swap_positions(&mut self, a: NodeId, b: NodeId) {
        self.base.swap_positions(a, b);

        let a_balance = self.base.balance(a);
        let b_balance = self.base.balance(b);
        self.base.set_balance(a, b_balance);
        self.base.set_balance(b, a_balance);
    }

    // Propagates a height decrease toward the root, starting at `opt_node`, whose balance factor
    // has not yet been adjusted by `diff`.
    //
    // Unlike insertion, a removal may rotate at every level on the way up.
    fn remove_fix(&mut self, mut opt_node: Option<NodeId>, mut diff: i8) {
        while let Some(node) = opt_node {
            let parent = self.base.parent(node);
            let next_diff = parent.map_or(0, |p| self.removal_diff(p, node));

            let balance = self.base.balance(node) + diff;

            match balance {
                -2 | 2 => {
                    let heavy = if balance < 0 { Dir::Left } else { Dir::Right };

                    if !self.rebalance_removed(node, heavy) {
                        return;
                    }
                }

                // The shorter side shrank; the subtree keeps its height.
                -1 | 1 => {
                    self.base.set_balance(node, balance);
                    return;
                }

                // The taller side shrank; the subtree lost a level.
                0 => self.base.set_balance(node, 0),

                _ => invariant_violation("balance factor out of range after removal"),
            }

            opt_node = parent;
            diff = next_diff;
        }
    }

    // Rotates the subtree at `n`, which is too heavy on side `heavy` after a removal.
    //
    // Returns `true` if the subtree ended up one level shorter than before the removal.
    fn rebalance_removed(&mut self, n: NodeId, heavy: Dir) -> bool {
        let sign = heavy.balance_diff();

        let Some(c) = self.base.child(n, heavy) else {
            invariant_violation("heavy side of an unbalanced node is empty");
        };

        match self.base.balance(c) {
            b if b == sign => {
                tracing::trace!(?n, ?c, ?heavy, "remove: zig-zig");

                self.rotate(n, !heavy);
                self.base.set_balance(n, 0);
                self.base.set_balance(c, 0);
                true
            }

            0 => {
                tracing::trace!(?n, ?c, ?heavy, "remove: single rotation, height kept");

                self.rotate(n, !heavy);
                self.base.set_balance(n, sign);
                self.base.set_balance(c, -sign);
                false
            }

            _ => {
                let Some(g) = self.base.child(c, !heavy) else {
                    invariant_violation("inner grandchild of a zig-zag is missing");
                };

                tracing::trace!(?n, ?c, ?g, ?heavy, "remove: zig-zag");

                let g_balance = self.base.balance(g);
                self.rotate(c, heavy);
                self.rotate(n, !heavy);

                let (n_balance, c_balance) = match g_balance {
                    b if b == sign => (-sign, 0),
                    0 => (0, 0),
                    _ => (0, sign),
                };

                self.base.set_balance(n, n_balance);
                self.base.set_balance(c, c_balance);
                self.base.set_balance(g, 0);
                true
            }
        }
    }

    // Rotates the subtree at `node` in direction `dir`, promoting its `!dir` child.
    fn rotate(&mut self, node: NodeId, dir: Dir) {
        match dir {
            Dir::Left => self.rotate_left(node),
            Dir::Right => self.rotate_right(node),
        }
    }

    fn rotate_left(&mut self, node: NodeId) {
        let Some(up) = self.base.right(node) else {
            invariant_violation("left rotation without a right child");
        };

        self.rotate_at(node, up);
    }

    fn rotate_right(&mut self, node: NodeId) {
        let Some(up) = self.base.left(node) else {
            invariant_violation("right rotation without a left child");
        };

        self.rotate_at(node, up);
    }

    // Performs a rotation, moving `up` up and its parent `down` down.
    //
    // The balance factors of affected nodes are not updated.
    fn rotate_at(&mut self, down: NodeId, up: NodeId) {
        // - `down` becomes the `dir` child of `up`.
        // - `across` goes from the `dir` child of `up` to the `!dir` child of `down`.
        let dir = if self.base.right(down) == Some(up) {
            Dir::Left
        } else {
            Dir::Right
        };

        tracing::trace!(?down, ?up, ?dir, "rotate");

        let parent = self.base.parent(down);
        let across = self.base.child(up, dir);

        self.base.set_child(down, !dir, across);
        self.base.set_child(up, dir, Some(down));
        self.base.replace_child_or_set_root(parent, down, Some(up));
    }

    // `p` and `n` lean the same way below `g`.
    fn is_zig_zig(&self, g: NodeId, p: NodeId, n: NodeId) -> bool {
        (self.base.left(g) == Some(p) && self.base.left(p) == Some(n))
            || (self.base.right(g) == Some(p) && self.base.right(p) == Some(n))
    }

    // `p` and `n` lean opposite ways below `g`.
    fn is_zig_zag(&self, g: NodeId, p: NodeId, n: NodeId) -> bool {
        (self.base.left(g) == Some(p) && self.base.right(p) == Some(n))
            || (self.base.right(g) == Some(p) && self.base.left(p) == Some(n))
    }
}

impl<K: Ord, V> AvlTree<K, V> {
    /// Inserts a key-value pair into the tree.
    ///
    /// If the tree already contains `key`, its value is replaced and the old value is returned.
    /// The tree's shape does not change in that case.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.base.search(&key) {
            Search::Found(node) => Some(mem::replace(&mut self.base.node_mut(node).value, value)),
            Search::Vacant(at) => {
                self.insert_at(at, key, value);
                None
            }
        }
    }

    /// Removes `key` from the tree, returning its value if it was present.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes `key` from the tree, returning the stored key and value if it was present.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.base.locate(key)?;
        Some(self.remove_at(node))
    }

    /// Returns `true` if the tree contains `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.base.locate(key).is_some()
    }

    /// Returns a reference to the value associated with `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.base.locate(key)?;
        Some(&self.base.node(node).value)
    }

    /// Returns a mutable reference to the value associated with `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.base.locate(key)?;
        Some(&mut self.base.node_mut(node).value)
    }

    /// Returns the stored key and the value associated with `key`.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.base.node(self.base.locate(key)?);
        Some((&node.key, &node.value))
    }

    /// Returns a reference to the value associated with `key`, or [`Error::KeyNotFound`].
    pub fn try_get<Q>(&self, key: &Q) -> Result<&V, Error>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).ok_or(Error::KeyNotFound)
    }

    /// Returns a mutable reference to the value associated with `key`, or
    /// [`Error::KeyNotFound`].
    pub fn try_get_mut<Q>(&mut self, key: &Q) -> Result<&mut V, Error>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_mut(key).ok_or(Error::KeyNotFound)
    }

    /// Returns a cursor pointing at `key`, or [`end`](Self::end) if `key` is absent.
    pub fn find<Q>(&self, key: &Q) -> Cursor<'_, K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Cursor::at(self, self.base.locate(key))
    }

    /// Returns the entry for `key`, for in-place insertion or modification.
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V> {
        match self.base.search(&key) {
            Search::Found(node) => Entry::Occupied(OccupiedEntry { tree: self, node }),
            Search::Vacant(at) => Entry::Vacant(VacantEntry {
                tree: self,
                key,
                insert_as: at,
            }),
        }
    }
}
