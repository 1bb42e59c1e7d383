use core::iter::FusedIterator;

use crate::{
    base::{BaseTree, NodeId},
    AvlTree,
};

/// An iterator over the entries of an [`AvlTree`], in ascending key order.
///
/// Created by [`AvlTree::iter`].
pub struct Iter<'tree, K, V> {
    tree: &'tree BaseTree<K, V>,

    front: Option<NodeId>,
    back: Option<NodeId>,

    len: usize,
}

impl<'tree, K, V> Iter<'tree, K, V> {
    pub(crate) fn new(tree: &'tree BaseTree<K, V>) -> Self {
        Iter {
            tree,

            front: tree.first(),
            back: tree.last(),
            len: tree.len(),
        }
    }

    fn entry(&self, node: NodeId) -> (&'tree K, &'tree V) {
        let node = self.tree.node(node);
        (&node.key, &node.value)
    }
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter { ..*self }
    }
}

impl<'tree, K, V> Iterator for Iter<'tree, K, V> {
    type Item = (&'tree K, &'tree V);

    fn next(&mut self) -> Option<Self::Item> {
        // The front and back ends meet in the middle; `len` tells when they have crossed.
        if self.len == 0 {
            return None;
        }

        let cur = self.front?;
        self.front = self.tree.successor(cur);
        self.len -= 1;

        Some(self.entry(cur))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let cur = self.back?;
        self.back = self.tree.predecessor(cur);
        self.len -= 1;

        Some(self.entry(cur))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// An iterator over the keys of an [`AvlTree`], in ascending order.
pub struct Keys<'tree, K, V> {
    pub(crate) inner: Iter<'tree, K, V>,
}

impl<'tree, K, V> Iterator for Keys<'tree, K, V> {
    type Item = &'tree K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(key, _)| key)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// An iterator over the values of an [`AvlTree`], in ascending key order.
pub struct Values<'tree, K, V> {
    pub(crate) inner: Iter<'tree, K, V>,
}

impl<'tree, K, V> Iterator for Values<'tree, K, V> {
    type Item = &'tree V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, value)| value)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

impl<K, V> FusedIterator for Values<'_, K, V> {}

/// An owning iterator over the entries of an [`AvlTree`], in ascending key order.
///
/// Created by [`AvlTree::into_iter`](IntoIterator::into_iter).
pub struct IntoIter<K, V> {
    pub(crate) tree: AvlTree<K, V>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.tree.pop_first()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.tree.len(), Some(self.tree.len()))
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.tree.pop_last()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V> FusedIterator for IntoIter<K, V> {}
