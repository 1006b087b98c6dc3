use crate::{hash_merge, Element};

/// Compute the root hash of a merkle tree from a leaf and its authentication path
///
/// `siblings` yields tuples of the sibling at each level and a boolean path index, deepest level
/// first. The path index is the direction of the *current* node: `false` (0) means the current
/// node is the left child, so the sibling is on the right; `true` (1) means the current node is
/// the right child.
///
/// For example, consider the following tree:
/// ```text
///            C
///          /   \
///         A     B
///        / \   / \
///       0   1 2   3
/// ```
/// To prove that `2` is in the tree, its sibling `3` is on the right (index 0), and at the next
/// level its sibling `A` is on the left (index 1):
/// ```rust
/// # use mixer_primitives::*;
/// let a = hash_merge([Element::new(0), Element::new(1)]);
/// let b = hash_merge([Element::new(2), Element::new(3)]);
/// let c = hash_merge([a, b]);
///
/// let siblings = [(Element::new(3), false), (a, true)];
///
/// assert_eq!(compute_merkle_root(Element::new(2), siblings), c);
/// assert_ne!(compute_merkle_root(Element::new(4), siblings), c);
/// ```
pub fn compute_merkle_root<I: IntoIterator<Item = (Element, bool)>>(
    mut leaf: Element,
    siblings: I,
) -> Element {
    for (sibling, is_right) in siblings {
        leaf = match is_right {
            false => hash_merge([leaf, sibling]),
            true => hash_merge([sibling, leaf]),
        };
    }

    leaf
}
