use core::mem;

use crate::{
    base::{InsertAs, NodeId},
    AvlTree,
};

/// A view into a single entry in an [`AvlTree`], which may be either vacant or occupied.
///
/// Created by [`AvlTree::entry`].
pub enum Entry<'tree, K, V> {
    Vacant(VacantEntry<'tree, K, V>),
    Occupied(OccupiedEntry<'tree, K, V>),
}

impl<'tree, K, V> Entry<'tree, K, V> {
    /// Returns the key of this entry.
    pub fn key(&self) -> &K {
        match self {
            Entry::Vacant(entry) => entry.key(),
            Entry::Occupied(entry) => entry.key(),
        }
    }

    /// Inserts `default` if the entry is vacant, and returns a mutable reference to the value.
    pub fn or_insert(self, default: V) -> &'tree mut V {
        match self {
            Entry::Vacant(entry) => entry.insert(default),
            Entry::Occupied(entry) => entry.into_mut(),
        }
    }

    /// Inserts the result of `default` if the entry is vacant, and returns a mutable reference to
    /// the value.
    pub fn or_insert_with<F: FnOnce() -> V>(self, default: F) -> &'tree mut V {
        match self {
            Entry::Vacant(entry) => entry.insert(default()),
            Entry::Occupied(entry) => entry.into_mut(),
        }
    }

    /// Inserts `V::default()` if the entry is vacant, and returns a mutable reference to the value.
    pub fn or_default(self) -> &'tree mut V
    where
        V: Default,
    {
        self.or_insert_with(V::default)
    }

    /// Calls `f` on the value if the entry is occupied.
    pub fn and_modify<F: FnOnce(&mut V)>(self, f: F) -> Self {
        match self {
            Entry::Vacant(entry) => Entry::Vacant(entry),
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
        }
    }
}

/// A vacant entry: the key is not in the tree.
pub struct VacantEntry<'tree, K, V> {
    pub(crate) tree: &'tree mut AvlTree<K, V>,
    pub(crate) key: K,
    pub(crate) insert_as: InsertAs,
}

impl<'tree, K, V> VacantEntry<'tree, K, V> {
    /// Returns the key that would be inserted.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Takes ownership of the key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts `value` at the key associated with this entry, rebalancing the tree.
    pub fn insert(self, value: V) -> &'tree mut V {
        let tree = self.tree;
        let node = tree.insert_at(self.insert_as, self.key, value);

        &mut tree.base.node_mut(node).value
    }
}

/// An occupied entry: the key is in the tree.
pub struct OccupiedEntry<'tree, K, V> {
    pub(crate) tree: &'tree mut AvlTree<K, V>,
    pub(crate) node: NodeId,
}

impl<'tree, K, V> OccupiedEntry<'tree, K, V> {
    /// Returns the key stored in the tree.
    pub fn key(&self) -> &K {
        self.tree.base.key(self.node)
    }

    /// Returns a reference to the value in the entry.
    pub fn get(&self) -> &V {
        &self.tree.base.node(self.node).value
    }

    /// Returns a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.tree.base.node_mut(self.node).value
    }

    /// Converts the entry into a mutable reference to its value, bound to the tree's borrow.
    pub fn into_mut(self) -> &'tree mut V {
        &mut self.tree.base.node_mut(self.node).value
    }

    /// Replaces the value in the entry, returning the previous value.
    pub fn insert(&mut self, value: V) -> V {
        mem::replace(self.get_mut(), value)
    }

    /// Removes the entry from the tree, returning its value.
    pub fn remove(self) -> V {
        self.remove_entry().1
    }

    /// Removes the entry from the tree, returning the stored key and value.
    pub fn remove_entry(self) -> (K, V) {
        self.tree.remove_at(self.node)
    }
}
