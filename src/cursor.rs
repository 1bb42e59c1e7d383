use core::{fmt, ptr};

use crate::{base::NodeId, AvlTree};

/// A cursor over an [`AvlTree`].
///
/// A cursor points either to an element of the tree or to a "ghost" non-element that connects the
/// last element to the first. The ghost is the tree's [`end`](AvlTree::end) position.
pub struct Cursor<'tree, K, V> {
    tree: &'tree AvlTree<K, V>,
    node: Option<NodeId>,
}

impl<'tree, K, V> Cursor<'tree, K, V> {
    pub(crate) fn first(tree: &'tree AvlTree<K, V>) -> Self {
        Cursor::at(tree, tree.base.first())
    }

    pub(crate) fn ghost(tree: &'tree AvlTree<K, V>) -> Self {
        Cursor::at(tree, None)
    }

    pub(crate) fn at(tree: &'tree AvlTree<K, V>, node: Option<NodeId>) -> Self {
        Cursor { tree, node }
    }

    /// Moves the cursor to the next element of the `AvlTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method moves it to the first
    /// element. If it is pointing to the last element, this method moves it to the "ghost"
    /// non-element.
    pub fn move_next(&mut self) {
        self.node = match self.node {
            Some(node) => self.tree.base.successor(node),
            None => self.tree.base.first(),
        };
    }

    /// Moves the cursor to the previous element of the `AvlTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method moves it to the last
    /// element. If it is pointing to the first element, this method moves it to the "ghost"
    /// non-element.
    pub fn move_prev(&mut self) {
        self.node = match self.node {
            Some(node) => self.tree.base.predecessor(node),
            None => self.tree.base.last(),
        };
    }

    /// Returns the entry pointed to by the cursor.
    ///
    /// This returns `None` if the cursor is currently pointing to the "ghost" non-element.
    pub fn get(&self) -> Option<(&'tree K, &'tree V)> {
        self.node.map(|node| self.entry(node))
    }

    /// Returns the key pointed to by the cursor.
    pub fn key(&self) -> Option<&'tree K> {
        self.get().map(|(key, _)| key)
    }

    /// Returns the value pointed to by the cursor.
    pub fn value(&self) -> Option<&'tree V> {
        self.get().map(|(_, value)| value)
    }

    /// Returns the next entry.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method returns the first element.
    /// If it is pointing to the last element, this method returns `None`.
    pub fn peek_next(&self) -> Option<(&'tree K, &'tree V)> {
        let next = match self.node {
            Some(node) => self.tree.base.successor(node),
            None => self.tree.base.first(),
        };

        next.map(|node| self.entry(node))
    }

    /// Returns the previous entry.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method returns the last element.
    /// If it is pointing to the first element, this method returns `None`.
    pub fn peek_prev(&self) -> Option<(&'tree K, &'tree V)> {
        let prev = match self.node {
            Some(node) => self.tree.base.predecessor(node),
            None => self.tree.base.last(),
        };

        prev.map(|node| self.entry(node))
    }

    fn entry(&self, node: NodeId) -> (&'tree K, &'tree V) {
        let node = self.tree.base.node(node);
        (&node.key, &node.value)
    }
}

impl<K, V> Clone for Cursor<'_, K, V> {
    fn clone(&self) -> Self {
        Cursor { ..*self }
    }
}

impl<K, V> PartialEq for Cursor<'_, K, V> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.tree, other.tree) && self.node == other.node
    }
}

impl<K, V> Eq for Cursor<'_, K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Cursor<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.get()).finish()
    }
}

/// A cursor over an [`AvlTree`] which supports editing operations.
///
/// A cursor points either to an element of the tree or to a "ghost" non-element that connects the
/// last element to the first.
pub struct CursorMut<'tree, K, V> {
    tree: &'tree mut AvlTree<K, V>,
    node: Option<NodeId>,
}

impl<'tree, K, V> CursorMut<'tree, K, V> {
    pub(crate) fn first(tree: &'tree mut AvlTree<K, V>) -> Self {
        let node = tree.base.first();
        CursorMut { tree, node }
    }

    pub(crate) fn last(tree: &'tree mut AvlTree<K, V>) -> Self {
        let node = tree.base.last();
        CursorMut { tree, node }
    }

    /// Returns a read-only cursor pointing to the current element.
    ///
    /// The `CursorMut` remains immutably borrowed for the lifetime of the returned `Cursor`.
    pub fn as_cursor(&self) -> Cursor<'_, K, V> {
        Cursor::at(self.tree, self.node)
    }

    /// Moves the cursor to the next element of the `AvlTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method will move it to the first
    /// element. If it is pointing to the last element, this method will move it to the "ghost"
    /// non-element.
    pub fn move_next(&mut self) {
        self.node = match self.node {
            Some(node) => self.tree.base.successor(node),
            None => self.tree.base.first(),
        };
    }

    /// Moves the cursor to the previous element of the `AvlTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method will move it to the last
    /// element. If it is pointing to the first element, this method will move it to the "ghost"
    /// non-element.
    pub fn move_prev(&mut self) {
        self.node = match self.node {
            Some(node) => self.tree.base.predecessor(node),
            None => self.tree.base.last(),
        };
    }

    /// Returns the entry pointed to by the cursor.
    ///
    /// This returns `None` if the cursor is currently pointing to the "ghost" non-element.
    pub fn get(&self) -> Option<(&K, &V)> {
        let node = self.tree.base.node(self.node?);
        Some((&node.key, &node.value))
    }

    /// Returns a mutable reference to the value pointed to by the cursor.
    ///
    /// Keys cannot be modified through a cursor, so this cannot break the ordering of the tree.
    pub fn value_mut(&mut self) -> Option<&mut V> {
        let node = self.node?;
        Some(&mut self.tree.base.node_mut(node).value)
    }

    /// Returns the next entry.
    pub fn peek_next(&self) -> Option<(&K, &V)> {
        self.as_cursor().peek_next()
    }

    /// Returns the previous entry.
    pub fn peek_prev(&self) -> Option<(&K, &V)> {
        self.as_cursor().peek_prev()
    }

    /// Removes the current element from the tree.
    ///
    /// This returns the removed element and moves the cursor to the next element. If the cursor is
    /// pointing to the "ghost" non-element, this method returns `None`, and neither the tree nor
    /// the cursor is modified.
    pub fn remove_current(&mut self) -> Option<(K, V)> {
        let remove = self.node?;

        // Handles survive the rebalancing, so the neighbor can be picked before the removal.
        self.move_next();

        Some(self.tree.remove_at(remove))
    }

    /// Removes the current element from the tree.
    ///
    /// This returns the removed element and moves the cursor to the previous element. If the
    /// cursor is pointing to the "ghost" non-element, this method returns `None`, and neither the
    /// tree nor the cursor is modified.
    pub fn remove_current_and_move_prev(&mut self) -> Option<(K, V)> {
        let remove = self.node?;

        self.move_prev();

        Some(self.tree.remove_at(remove))
    }
}
