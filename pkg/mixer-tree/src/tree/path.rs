use std::iter::zip;

use mixer_primitives::{compute_merkle_root, Element};

/// A Merkle inclusion proof for a single leaf of a [`Tree`]
///
/// `path_elements[k]` is the sibling at level `k` (leaves are level 0). `path_indices[k]` is
/// `true` when the node on the path at level `k` is a right child, which is exactly bit `k` of
/// `leaf_index`.
///
/// ```rust
/// # use mixer_tree::*;
/// # use mixer_primitives::*;
/// let tree = Tree::<20>::build((0..7).map(Element::new)).unwrap();
/// let proof = tree.path(4).unwrap();
///
/// assert_eq!(proof.path_indices[..3], [false, false, true]);
/// assert_eq!(proof.compute_root(Element::new(4)), tree.root());
/// ```
///
/// [`Tree`]: crate::Tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InclusionProof<const HEIGHT: usize> {
    /// The root of the tree this proof was generated from
    pub root: Element,
    /// The position of the leaf
    pub leaf_index: usize,
    /// Siblings, deepest first
    pub path_elements: [Element; HEIGHT],
    /// Directions, deepest first
    pub path_indices: [bool; HEIGHT],
}

impl<const HEIGHT: usize> InclusionProof<HEIGHT> {
    /// The root obtained by recombining `leaf` with the siblings in this proof
    #[inline]
    #[must_use]
    pub fn compute_root(&self, leaf: Element) -> Element {
        compute_merkle_root(leaf, self.siblings())
    }

    /// Whether `leaf` recombines to [`InclusionProof::root`]
    #[inline]
    #[must_use]
    pub fn proves(&self, leaf: Element) -> bool {
        self.compute_root(leaf) == self.root
    }

    /// Pairs of `(sibling, is_right)`, deepest first
    pub fn siblings(&self) -> impl Iterator<Item = (Element, bool)> + '_ {
        zip(self.path_elements, self.path_indices)
    }

    /// The path indices as field elements (`0` or `1`), the form a circuit consumes
    #[inline]
    #[must_use]
    pub fn path_index_elements(&self) -> [Element; HEIGHT] {
        self.path_indices.map(Element::from)
    }
}
