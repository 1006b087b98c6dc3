use mixer_primitives::Element;
use rayon::prelude::*;

use crate::{
    empty_subtree_hash,
    hash_cache::{HashCache, NoopHashCache},
    Error, Result,
};

mod path;

pub use path::InclusionProof;

/// An immutable, fixed-height, append-ordered Merkle tree
///
/// The leaves occupy positions `0..len` in insertion order. Every position beyond the last leaf
/// holds an empty subtree (see [`empty_subtree_hash`]), so the root is a pure function of the
/// ordered leaf list and `HEIGHT`:
///
/// ```rust
/// # use mixer_tree::*;
/// # use mixer_primitives::*;
/// let leaves = [Element::new(1), Element::new(2), Element::new(3)];
///
/// let tree = Tree::<4>::build(leaves).unwrap();
/// let again = Tree::<4>::build(leaves).unwrap();
/// assert_eq!(tree.root(), again.root());
///
/// let reordered = Tree::<4>::build([leaves[1], leaves[0], leaves[2]]).unwrap();
/// assert_ne!(tree.root(), reordered.root());
/// ```
///
/// Every node that has at least one leaf beneath it is kept in memory, addressed by
/// `(level, index)`. Nodes with no leaves beneath them are never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree<const HEIGHT: usize> {
    /// `layers[0]` holds the leaves, `layers[HEIGHT]` holds the root (if there are any leaves)
    layers: Vec<Vec<Element>>,
}

impl<const HEIGHT: usize> Default for Tree<HEIGHT> {
    fn default() -> Self {
        Self {
            layers: vec![Vec::new(); HEIGHT + 1],
        }
    }
}

impl<const HEIGHT: usize> Tree<HEIGHT> {
    /// Build a tree from an ordered list of leaves
    ///
    /// Returns [`Error::TreeOverflow`] if there are more than `2^HEIGHT` leaves
    ///
    /// ```rust
    /// # use mixer_tree::*;
    /// # use mixer_primitives::*;
    /// let full = Tree::<2>::build([Element::ONE; 4]);
    /// assert!(full.is_ok());
    ///
    /// let overflow = Tree::<2>::build([Element::ONE; 5]);
    /// assert_eq!(overflow.unwrap_err(), Error::TreeOverflow { len: 5, capacity: 4 });
    /// ```
    #[inline]
    pub fn build(leaves: impl IntoIterator<Item = Element>) -> Result<Self> {
        Self::build_with_cache(leaves, &NoopHashCache)
    }

    /// Build a tree from an ordered list of leaves, routing every node hash through `cache`
    ///
    /// The result is identical to [`Tree::build`]. Each level is hashed in parallel.
    pub fn build_with_cache<C: HashCache>(
        leaves: impl IntoIterator<Item = Element>,
        cache: &C,
    ) -> Result<Self> {
        let leaves: Vec<Element> = leaves.into_iter().collect();
        check_capacity(leaves.len(), HEIGHT)?;

        let mut layers = Vec::with_capacity(HEIGHT + 1);
        layers.push(leaves);

        for level in 0..HEIGHT {
            let empty = empty_subtree_hash(level);
            let parents = layers[level]
                .par_chunks(2)
                .map(|pair| cache.hash(pair[0], pair.get(1).copied().unwrap_or(empty)))
                .collect();

            layers.push(parents);
        }

        let tree = Self { layers };
        tracing::debug!(leaves = tree.len(), root = %tree.root(), "built merkle tree");

        Ok(tree)
    }

    pub(crate) fn from_layers(layers: Vec<Vec<Element>>) -> Self {
        debug_assert_eq!(layers.len(), HEIGHT + 1);
        Self { layers }
    }

    /// The height of this tree (i.e. the number of siblings in each [`InclusionProof`])
    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        HEIGHT
    }

    /// The maximum number of leaves, `2^HEIGHT`
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        capacity(HEIGHT)
    }

    /// The number of leaves in the tree
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers[0].len()
    }

    /// Whether the tree has no leaves
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers[0].is_empty()
    }

    /// The leaves, in insertion order
    #[inline]
    #[must_use]
    pub fn leaves(&self) -> &[Element] {
        &self.layers[0]
    }

    /// The root hash
    ///
    /// An empty tree has the root `empty_subtree_hash(HEIGHT)`
    #[inline]
    #[must_use]
    pub fn root(&self) -> Element {
        self.node(HEIGHT, 0)
    }

    /// Generate an [`InclusionProof`] for the leaf at `index`
    ///
    /// Any integer type can be used as an index. Indices outside `0..len`, including negative
    /// ones, return [`Error::IndexOutOfRange`]:
    ///
    /// ```rust
    /// # use mixer_tree::*;
    /// # use mixer_primitives::*;
    /// let tree = Tree::<4>::build([Element::new(1), Element::new(2)]).unwrap();
    ///
    /// let proof = tree.path(1).unwrap();
    /// assert!(proof.proves(Element::new(2)));
    ///
    /// assert!(matches!(tree.path(2), Err(Error::IndexOutOfRange { .. })));
    /// assert!(matches!(tree.path(-1), Err(Error::IndexOutOfRange { index: None, .. })));
    /// ```
    pub fn path(&self, index: impl TryInto<usize>) -> Result<InclusionProof<HEIGHT>> {
        let len = self.len();
        let index = index
            .try_into()
            .map_err(|_| Error::IndexOutOfRange { index: None, len })?;

        if index >= len {
            return Err(Error::IndexOutOfRange {
                index: Some(index),
                len,
            });
        }

        let path_elements = core::array::from_fn(|level| self.node(level, (index >> level) ^ 1));
        let path_indices = core::array::from_fn(|level| (index >> level) & 1 == 1);

        Ok(InclusionProof {
            root: self.root(),
            leaf_index: index,
            path_elements,
            path_indices,
        })
    }

    /// The hash at `(level, index)`, falling back to the empty subtree value for positions with
    /// no leaves beneath them
    fn node(&self, level: usize, index: usize) -> Element {
        self.layers[level]
            .get(index)
            .copied()
            .unwrap_or_else(|| empty_subtree_hash(level))
    }
}

/// Find the position of the first leaf equal to `target`
///
/// ```rust
/// # use mixer_tree::*;
/// # use mixer_primitives::*;
/// let leaves = [Element::new(5), Element::new(6), Element::new(5)];
///
/// assert_eq!(find_leaf_index(&leaves, Element::new(5)), Some(0));
/// assert_eq!(find_leaf_index(&leaves, Element::new(6)), Some(1));
/// assert_eq!(find_leaf_index(&leaves, Element::new(7)), None);
/// ```
#[inline]
#[must_use]
pub fn find_leaf_index(leaves: &[Element], target: Element) -> Option<usize> {
    leaves.iter().position(|leaf| *leaf == target)
}

/// `2^height`, saturating at `usize::MAX`
pub(crate) fn capacity(height: usize) -> usize {
    u32::try_from(height)
        .ok()
        .and_then(|height| 1usize.checked_shl(height))
        .unwrap_or(usize::MAX)
}

pub(crate) fn check_capacity(len: usize, height: usize) -> Result<()> {
    let capacity = capacity(height);

    match len > capacity {
        true => Err(Error::TreeOverflow { len, capacity }),
        false => Ok(()),
    }
}
