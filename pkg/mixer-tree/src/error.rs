/// Result alias for tree operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced when building or querying a Merkle tree
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A path was requested for a position that holds no leaf
    ///
    /// `index` is `None` when the requested index could not be represented as a `usize` at all,
    /// e.g. a negative index
    #[error("leaf index {index:?} is out of range for a tree with {len} leaves")]
    IndexOutOfRange {
        /// The requested index
        index: Option<usize>,
        /// The number of leaves in the tree
        len: usize,
    },

    /// More leaves were supplied than a tree of this height can hold
    #[error("a tree with capacity {capacity} cannot hold {len} leaves")]
    TreeOverflow {
        /// The number of leaves that would be in the tree
        len: usize,
        /// `2^height`
        capacity: usize,
    },
}
