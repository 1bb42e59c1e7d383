use thiserror::Error;

/// Errors reported by an [`AvlTree`](crate::AvlTree).
#[derive(Copy, Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A keyed access named a key that is not in the tree.
    #[error("key not found")]
    KeyNotFound,

    /// The tree's structure or balance bookkeeping is corrupt.
    ///
    /// Only [`AvlTree::check_invariants`](crate::AvlTree::check_invariants) returns this. When the
    /// tree itself trips over a corrupt shape while rebalancing it panics with this error's
    /// message instead of continuing.
    #[error("tree invariant violated: {0}")]
    InvariantViolation(&'static str),
}

// Panics on a condition that a well-formed tree can never reach.
#[cold]
#[track_caller]
pub(crate) fn invariant_violation(reason: &'static str) -> ! {
    tracing::error!(reason, "AVL tree invariant violated");
    panic!("{}", Error::InvariantViolation(reason))
}
