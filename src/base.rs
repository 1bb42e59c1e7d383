//! The unbalanced binary search tree underneath [`AvlTree`](crate::AvlTree).
//!
//! Nodes live in a slab owned by the tree and refer to each other through [`NodeId`] handles.
//! Every primitive here keeps the parent, child and root links consistent with each other, but
//! none of them looks at balance factors: callers that change the shape of the tree are
//! responsible for fixing those up.

use alloc::vec::Vec;
use core::{borrow::Borrow, cmp::Ordering, mem, ops::Not};

use crate::error::invariant_violation;

/// A stable handle to a node in a [`BaseTree`].
///
/// A node keeps its handle through rotations and position swaps. The handle is released when
/// the node is removed, after which its slot may be reused by a later insertion.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Dir {
    Left = 0,
    Right = 1,
}

impl Dir {
    /// The change in a parent's balance factor when the subtree on this side grows by one level.
    #[inline]
    pub(crate) fn balance_diff(self) -> i8 {
        match self {
            Dir::Left => -1,
            Dir::Right => 1,
        }
    }
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

#[derive(Clone, Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    parent: Option<NodeId>,
    children: [Option<NodeId>; 2],
    balance: i8,
}

#[derive(Clone, Debug)]
enum Slot<K, V> {
    Occupied(Node<K, V>),
    Vacant { next_free: Option<NodeId> },
}

/// Where a key that is not in the tree would be linked.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum InsertAs {
    Root,
    Child { parent: NodeId, dir: Dir },
}

/// The outcome of a binary descent for a key.
pub(crate) enum Search {
    Found(NodeId),
    Vacant(InsertAs),
}

#[derive(Clone, Debug)]
pub(crate) struct BaseTree<K, V> {
    slots: Vec<Slot<K, V>>,
    free: Option<NodeId>,
    root: Option<NodeId>,
    len: usize,
}

impl<K, V> BaseTree<K, V> {
    pub(crate) const fn new() -> Self {
        BaseTree {
            slots: Vec::new(),
            free: None,
            root: None,
            len: 0,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        let empty = self.len == 0;
        debug_assert_eq!(empty, self.root.is_none());
        empty
    }

    #[inline]
    pub(crate) fn root(&self) -> Option<NodeId> {
        self.root
    }

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &Node<K, V> {
        match &self.slots[id.0] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => invariant_violation("node handle refers to a vacant slot"),
        }
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        match &mut self.slots[id.0] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => invariant_violation("node handle refers to a vacant slot"),
        }
    }

    #[inline]
    pub(crate) fn key(&self, id: NodeId) -> &K {
        &self.node(id).key
    }

    #[inline]
    pub(crate) fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    #[inline]
    pub(crate) fn child(&self, id: NodeId, dir: Dir) -> Option<NodeId> {
        self.node(id).children[dir as usize]
    }

    #[inline]
    pub(crate) fn left(&self, id: NodeId) -> Option<NodeId> {
        self.child(id, Dir::Left)
    }

    #[inline]
    pub(crate) fn right(&self, id: NodeId) -> Option<NodeId> {
        self.child(id, Dir::Right)
    }

    #[inline]
    pub(crate) fn balance(&self, id: NodeId) -> i8 {
        self.node(id).balance
    }

    #[inline]
    pub(crate) fn set_balance(&mut self, id: NodeId, balance: i8) {
        self.node_mut(id).balance = balance;
    }

    #[inline]
    pub(crate) fn update_balance(&mut self, id: NodeId, diff: i8) {
        let node = self.node_mut(id);
        node.balance += diff;
        debug_assert!((-2..=2).contains(&node.balance));
    }

    /// Returns which child of `parent` the node `child` is.
    pub(crate) fn which_child(&self, parent: NodeId, child: NodeId) -> Dir {
        if self.left(parent) == Some(child) {
            Dir::Left
        } else if self.right(parent) == Some(child) {
            Dir::Right
        } else {
            invariant_violation("node is not a child of its recorded parent")
        }
    }

    // Sets the `dir` child of `parent` to `child` and points `child` back at `parent`.
    pub(crate) fn set_child(&mut self, parent: NodeId, dir: Dir, child: Option<NodeId>) {
        self.node_mut(parent).children[dir as usize] = child;

        if let Some(child) = child {
            self.node_mut(child).parent = Some(parent);
        }
    }

    // Replaces the link from `parent` to `old_child` with a link to `new_child`. A missing parent
    // means `old_child` is the root.
    pub(crate) fn replace_child_or_set_root(
        &mut self,
        parent: Option<NodeId>,
        old_child: NodeId,
        new_child: Option<NodeId>,
    ) {
        match parent {
            Some(parent) => {
                let dir = self.which_child(parent, old_child);
                self.set_child(parent, dir, new_child);
            }

            None => {
                debug_assert_eq!(self.root, Some(old_child));
                self.root = new_child;

                if let Some(new_child) = new_child {
                    self.node_mut(new_child).parent = None;
                }
            }
        }
    }

    fn alloc(&mut self, node: Node<K, V>) -> NodeId {
        self.len += 1;

        match self.free {
            Some(id) => {
                let slot = mem::replace(&mut self.slots[id.0], Slot::Occupied(node));
                self.free = match slot {
                    Slot::Vacant { next_free } => next_free,
                    Slot::Occupied(_) => invariant_violation("free list points at a live node"),
                };
                id
            }

            None => {
                self.slots.push(Slot::Occupied(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    fn release(&mut self, id: NodeId) -> Node<K, V> {
        let vacant = Slot::Vacant {
            next_free: self.free,
        };

        match mem::replace(&mut self.slots[id.0], vacant) {
            Slot::Occupied(node) => {
                self.free = Some(id);
                self.len -= 1;
                node
            }

            Slot::Vacant { .. } => invariant_violation("released a vacant slot"),
        }
    }

    /// Creates a node with balance 0 and links it at `at`.
    pub(crate) fn link(&mut self, at: InsertAs, key: K, value: V) -> NodeId {
        let id = self.alloc(Node {
            key,
            value,
            parent: None,
            children: [None; 2],
            balance: 0,
        });

        match at {
            InsertAs::Root => {
                debug_assert!(self.root.is_none());
                self.root = Some(id);
            }

            InsertAs::Child { parent, dir } => {
                debug_assert!(self.child(parent, dir).is_none());
                self.set_child(parent, dir, Some(id));
            }
        }

        id
    }

    /// Unlinks a node with at most one child, promoting that child into its place, and frees the
    /// node's slot.
    pub(crate) fn splice_out(&mut self, id: NodeId) -> Node<K, V> {
        let child = match (self.left(id), self.right(id)) {
            (Some(_), Some(_)) => invariant_violation("spliced out a node with two children"),
            (Some(child), None) | (None, Some(child)) => Some(child),
            (None, None) => None,
        };

        let parent = self.parent(id);
        self.replace_child_or_set_root(parent, id, child);

        self.release(id)
    }

    /// Exchanges the structural positions of `a` and `b`.
    ///
    /// Afterwards `a` has the parent, children and root status `b` had before, and vice versa.
    /// Keys, values and balance factors stay with their nodes.
    pub(crate) fn swap_positions(&mut self, a: NodeId, b: NodeId) {
        if a == b {
            return;
        }

        let a_parent = self.parent(a);
        let a_children = self.node(a).children;
        let a_dir = a_parent.map(|p| self.which_child(p, a));

        let b_parent = self.parent(b);
        let b_children = self.node(b).children;
        let b_dir = b_parent.map(|p| self.which_child(p, b));

        // When the two nodes are adjacent, a link between them must be flipped rather than copied.
        let remap = |link: Option<NodeId>| match link {
            Some(x) if x == a => Some(b),
            Some(x) if x == b => Some(a),
            other => other,
        };

        {
            let node = self.node_mut(a);
            node.parent = remap(b_parent);
            node.children = b_children.map(remap);
        }

        {
            let node = self.node_mut(b);
            node.parent = remap(a_parent);
            node.children = a_children.map(remap);
        }

        if let (Some(parent), Some(dir)) = (a_parent, a_dir) {
            if parent != b {
                self.node_mut(parent).children[dir as usize] = Some(b);
            }
        }

        if let (Some(parent), Some(dir)) = (b_parent, b_dir) {
            if parent != a {
                self.node_mut(parent).children[dir as usize] = Some(a);
            }
        }

        for child in a_children.into_iter().flatten().filter(|&c| c != b) {
            self.node_mut(child).parent = Some(b);
        }

        for child in b_children.into_iter().flatten().filter(|&c| c != a) {
            self.node_mut(child).parent = Some(a);
        }

        if self.root == Some(a) {
            self.root = Some(b);
        } else if self.root == Some(b) {
            self.root = Some(a);
        }
    }

    pub(crate) fn min_in_subtree(&self, root: NodeId) -> NodeId {
        let mut cur = root;

        while let Some(left) = self.left(cur) {
            cur = left;
        }

        cur
    }

    pub(crate) fn max_in_subtree(&self, root: NodeId) -> NodeId {
        let mut cur = root;

        while let Some(right) = self.right(cur) {
            cur = right;
        }

        cur
    }

    pub(crate) fn first(&self) -> Option<NodeId> {
        self.root.map(|root| self.min_in_subtree(root))
    }

    pub(crate) fn last(&self) -> Option<NodeId> {
        self.root.map(|root| self.max_in_subtree(root))
    }

    /// Returns the node with the largest key smaller than `id`'s key.
    pub(crate) fn predecessor(&self, id: NodeId) -> Option<NodeId> {
        if let Some(left) = self.left(id) {
            return Some(self.max_in_subtree(left));
        }

        // Ascend until we arrive from a right child.
        let mut cur = id;
        while let Some(parent) = self.parent(cur) {
            if self.right(parent) == Some(cur) {
                return Some(parent);
            }

            cur = parent;
        }

        None
    }

    /// Returns the node with the smallest key larger than `id`'s key.
    pub(crate) fn successor(&self, id: NodeId) -> Option<NodeId> {
        if let Some(right) = self.right(id) {
            return Some(self.min_in_subtree(right));
        }

        // Ascend until we arrive from a left child.
        let mut cur = id;
        while let Some(parent) = self.parent(cur) {
            if self.left(parent) == Some(cur) {
                return Some(parent);
            }

            cur = parent;
        }

        None
    }

    /// Returns the number of nodes on the longest path down from `node`.
    pub(crate) fn height(&self, node: Option<NodeId>) -> usize {
        match node {
            Some(id) => 1 + self.height(self.left(id)).max(self.height(self.right(id))),
            None => 0,
        }
    }

    /// Checks from scratch that every subtree's heights differ by at most one.
    pub(crate) fn is_height_balanced(&self) -> bool {
        self.is_height_balanced_at(self.root).is_some()
    }

    // Returns the subtree height if the subtree is height-balanced.
    fn is_height_balanced_at(&self, node: Option<NodeId>) -> Option<usize> {
        let Some(id) = node else {
            return Some(0);
        };

        let left = self.is_height_balanced_at(self.left(id))?;
        let right = self.is_height_balanced_at(self.right(id))?;

        (left.abs_diff(right) <= 1).then_some(1 + left.max(right))
    }

    /// Drops every node.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free = None;
        self.root = None;
        self.len = 0;
    }
}

impl<K: Ord, V> BaseTree<K, V> {
    /// Descends by key order, returning the node holding `key` or the vacant link where it would
    /// be inserted.
    pub(crate) fn search<Q>(&self, key: &Q) -> Search
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let Some(mut cur) = self.root else {
            return Search::Vacant(InsertAs::Root);
        };

        loop {
            let dir = match key.cmp(self.key(cur).borrow()) {
                Ordering::Less => Dir::Left,
                Ordering::Equal => return Search::Found(cur),
                Ordering::Greater => Dir::Right,
            };

            match self.child(cur, dir) {
                Some(child) => cur = child,
                None => return Search::Vacant(InsertAs::Child { parent: cur, dir }),
            }
        }
    }

    pub(crate) fn locate<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.search(key) {
            Search::Found(id) => Some(id),
            Search::Vacant(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::prelude::v1::*;

    use super::*;

    // Builds an unbalanced tree by plain descent, in the given order.
    fn build(keys: &[u32]) -> BaseTree<u32, ()> {
        let mut tree = BaseTree::new();

        for &key in keys {
            match tree.search(&key) {
                Search::Found(_) => {}
                Search::Vacant(at) => {
                    tree.link(at, key, ());
                }
            }
        }

        tree
    }

    fn in_order(tree: &BaseTree<u32, ()>) -> Vec<u32> {
        let mut keys = Vec::new();
        let mut cur = tree.first();

        while let Some(id) = cur {
            keys.push(*tree.key(id));
            cur = tree.successor(id);
        }

        keys
    }

    fn assert_links(tree: &BaseTree<u32, ()>, node: Option<NodeId>, parent: Option<NodeId>) {
        if let Some(id) = node {
            assert_eq!(tree.parent(id), parent);
            assert_links(tree, tree.left(id), Some(id));
            assert_links(tree, tree.right(id), Some(id));
        }
    }

    #[test]
    fn predecessor_and_successor() {
        let tree = build(&[50, 30, 70, 20, 40, 60, 80, 45]);

        let forty = tree.locate(&40).unwrap();
        let forty_five = tree.locate(&45).unwrap();
        let fifty = tree.locate(&50).unwrap();
        let sixty = tree.locate(&60).unwrap();
        let twenty = tree.locate(&20).unwrap();

        assert_eq!(tree.predecessor(fifty), Some(forty_five));
        assert_eq!(tree.predecessor(forty_five), Some(forty));
        assert_eq!(tree.predecessor(sixty), Some(fifty));
        assert_eq!(tree.predecessor(twenty), None);
        assert_eq!(tree.successor(forty_five), Some(fifty));
        assert_eq!(tree.successor(tree.last().unwrap()), None);
    }

    #[test]
    fn swap_with_left_child() {
        let mut tree = build(&[2, 1, 3]);
        let two = tree.locate(&2).unwrap();
        let one = tree.locate(&1).unwrap();

        tree.swap_positions(two, one);

        assert_eq!(tree.root(), Some(one));
        assert_eq!(tree.left(one), Some(two));
        assert_eq!(tree.right(one).map(|id| *tree.key(id)), Some(3));
        assert_eq!(tree.left(two), None);
        assert_links(&tree, tree.root(), None);
    }

    #[test]
    fn swap_with_distant_predecessor() {
        let mut tree = build(&[50, 30, 70, 20, 40, 45]);
        let fifty = tree.locate(&50).unwrap();
        let forty_five = tree.locate(&45).unwrap();
        let forty = tree.locate(&40).unwrap();

        assert_eq!(tree.predecessor(fifty), Some(forty_five));
        tree.swap_positions(fifty, forty_five);

        assert_eq!(tree.root(), Some(forty_five));
        assert_eq!(tree.right(forty), Some(fifty));
        assert_eq!(tree.left(fifty), None);
        assert_eq!(tree.right(fifty), None);
        assert_links(&tree, tree.root(), None);

        tree.splice_out(fifty);
        assert_eq!(in_order(&tree), [20, 30, 40, 45, 70]);
        assert_links(&tree, tree.root(), None);
    }

    #[test]
    fn swap_siblings() {
        let mut tree = build(&[2, 1, 3]);
        let one = tree.locate(&1).unwrap();
        let three = tree.locate(&3).unwrap();
        let two = tree.locate(&2).unwrap();

        tree.swap_positions(one, three);

        assert_eq!(tree.left(two), Some(three));
        assert_eq!(tree.right(two), Some(one));
        assert_links(&tree, tree.root(), None);
    }

    #[test]
    fn splice_out_promotes_only_child() {
        let mut tree = build(&[10, 5, 3, 4]);
        let five = tree.locate(&5).unwrap();

        let removed = tree.splice_out(five);
        assert_eq!(removed.key, 5);
        assert_eq!(tree.len(), 3);
        assert_eq!(in_order(&tree), [3, 4, 10]);
        assert_links(&tree, tree.root(), None);
    }

    #[test]
    fn released_slots_are_reused() {
        let mut tree = build(&[1, 2]);
        let two = tree.locate(&2).unwrap();
        tree.splice_out(two);

        let Search::Vacant(at) = tree.search(&3) else {
            panic!("3 should be absent");
        };

        assert_eq!(tree.link(at, 3, ()), two);
        assert_eq!(tree.slots.len(), 2);
    }

    #[test]
    fn height_and_balance_check() {
        let degenerate = build(&[1, 2, 3, 4]);
        assert_eq!(degenerate.height(degenerate.root()), 4);
        assert!(!degenerate.is_height_balanced());

        let complete = build(&[4, 2, 6, 1, 3, 5, 7]);
        assert_eq!(complete.height(complete.root()), 3);
        assert!(complete.is_height_balanced());

        let empty = build(&[]);
        assert_eq!(empty.height(empty.root()), 0);
        assert!(empty.is_height_balanced());
        assert!(empty.is_empty());
    }

    #[test]
    fn clear_empties_the_arena() {
        let mut tree = build(&[3, 1, 2]);
        tree.clear();

        assert!(tree.is_empty());
        assert_eq!(tree.first(), None);
        assert_eq!(tree.locate(&1), None);
    }
}
