#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::match_bool)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![deny(missing_docs)]

//! Fixed-height, append-only Merkle trees over deposit commitments
//!
//! Leaves are placed left to right in the order they were inserted on the ledger. Positions with no
//! leaf hold the empty-subtree value for their level, derived from
//! [`zero_leaf`][mixer_primitives::zero_leaf]. Two structures share this layout:
//!  - [`Tree`]: an immutable tree rebuilt from a full list of leaves
//!  - [`Accumulator`]: an incrementally updated tree that can produce [`Tree`] snapshots
//!
//! ```rust
//! # use mixer_tree::*;
//! # use mixer_primitives::*;
//! let commitments: Vec<_> = (0..7).map(Element::new).collect();
//! let tree = Tree::<MERKLE_TREE_HEIGHT>::build(commitments.clone()).unwrap();
//!
//! let index = find_leaf_index(&commitments, Element::new(4)).unwrap();
//! let proof = tree.path(index).unwrap();
//!
//! assert_eq!(proof.path_elements.len(), MERKLE_TREE_HEIGHT);
//! assert!(proof.proves(Element::new(4)));
//! ```

mod accumulator;
mod error;
mod hash;
/// Caching of node hashes
pub mod hash_cache;
mod tree;

pub use accumulator::Accumulator;
pub use error::{Error, Result};
pub use hash::empty_subtree_hash;
pub use tree::{find_leaf_index, InclusionProof, Tree};

/// The height of the mixer's commitment tree
///
/// This is compiled into the withdrawal circuit, so it is not configurable at runtime
pub const MERKLE_TREE_HEIGHT: usize = 20;
