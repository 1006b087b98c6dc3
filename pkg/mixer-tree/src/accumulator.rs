use mixer_primitives::Element;

use crate::{
    empty_subtree_hash,
    hash_cache::{HashCache, NoopHashCache},
    tree::{capacity, check_capacity},
    Error, Result, Tree,
};

/// An append-only Merkle accumulator
///
/// Where [`Tree::build`] hashes every level from scratch, an [`Accumulator`] keeps each node
/// addressed by `(level, index)` and, on [`append`][Accumulator::append], only rehashes the
/// `HEIGHT` nodes between the new leaf and the root. Roots and paths are bit-identical to a full
/// rebuild over the same leaves:
///
/// ```rust
/// # use mixer_tree::*;
/// # use mixer_primitives::*;
/// let mut accumulator = Accumulator::<20>::new();
/// accumulator.append(Element::new(1)).unwrap();
/// accumulator.append(Element::new(2)).unwrap();
///
/// let rebuilt = Tree::<20>::build([Element::new(1), Element::new(2)]).unwrap();
/// assert_eq!(accumulator.root(), rebuilt.root());
///
/// // a snapshot is an immutable tree that can be handed to a withdrawal
/// let snapshot = accumulator.snapshot();
/// assert_eq!(snapshot, rebuilt);
/// ```
#[derive(Debug, Clone)]
pub struct Accumulator<const HEIGHT: usize, C = NoopHashCache> {
    layers: Vec<Vec<Element>>,
    cache: C,
}

impl<const HEIGHT: usize, C: Default> Default for Accumulator<HEIGHT, C> {
    fn default() -> Self {
        Self::new_with_cache(C::default())
    }
}

impl<const HEIGHT: usize> Accumulator<HEIGHT> {
    /// Create an empty accumulator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an accumulator holding `leaves`, in order
    pub fn from_leaves(leaves: impl IntoIterator<Item = Element>) -> Result<Self> {
        let mut accumulator = Self::new();
        accumulator.extend(leaves)?;
        Ok(accumulator)
    }
}

impl<const HEIGHT: usize, C> Accumulator<HEIGHT, C> {
    /// Create an empty accumulator that hashes through `cache`
    #[inline]
    #[must_use]
    pub fn new_with_cache(cache: C) -> Self {
        Self {
            layers: vec![Vec::new(); HEIGHT + 1],
            cache,
        }
    }

    /// The cache used by this accumulator
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// The number of leaves appended so far
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers[0].len()
    }

    /// Whether no leaves have been appended
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

    /// The current root
    #[inline]
    #[must_use]
    pub fn root(&self) -> Element {
        match self.layers[HEIGHT].first() {
            Some(root) => *root,
            None => empty_subtree_hash(HEIGHT),
        }
    }

    /// An immutable copy of the current state
    #[must_use]
    pub fn snapshot(&self) -> Tree<HEIGHT> {
        Tree::from_layers(self.layers.clone())
    }
}

impl<const HEIGHT: usize, C: HashCache> Accumulator<HEIGHT, C> {
    /// Append a leaf, returning its index
    ///
    /// Returns [`Error::TreeOverflow`] if the tree already holds `2^HEIGHT` leaves, in which case
    /// the accumulator is unchanged.
    pub fn append(&mut self, leaf: Element) -> Result<usize> {
        let index = self.len();
        check_capacity(index + 1, HEIGHT)?;

        self.layers[0].push(leaf);

        let mut position = index;
        for level in 0..HEIGHT {
            let parent = position / 2;
            let left = self.layers[level][parent * 2];
            let right = self.layers[level]
                .get(parent * 2 + 1)
                .copied()
                .unwrap_or_else(|| empty_subtree_hash(level));

            let hash = self.cache.hash(left, right);
            let above = &mut self.layers[level + 1];

            match above.get_mut(parent) {
                Some(node) => *node = hash,
                None => above.push(hash),
            }

            position = parent;
        }

        Ok(index)
    }

    /// Append every leaf in `leaves`, in order
    ///
    /// The capacity is checked up front when the iterator knows its length, so an oversized batch
    /// is rejected before anything is appended.
    pub fn extend(&mut self, leaves: impl IntoIterator<Item = Element>) -> Result<()> {
        let leaves = leaves.into_iter();

        let (lower_bound, _) = leaves.size_hint();
        if let Some(total) = self.len().checked_add(lower_bound) {
            check_capacity(total, HEIGHT)?;
        }

        for leaf in leaves {
            self.append(leaf)?;
        }

        Ok(())
    }

    /// Whether another leaf can be appended
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len() >= capacity(HEIGHT)
    }
}

impl<const HEIGHT: usize, C: HashCache> TryFrom<Vec<Element>> for Accumulator<HEIGHT, C>
where
    C: Default,
{
    type Error = Error;

    fn try_from(leaves: Vec<Element>) -> Result<Self> {
        let mut accumulator = Self::default();
        accumulator.extend(leaves)?;
        Ok(accumulator)
    }
}

#[cfg(feature = "serde")]
mod serde_impls {
    use mixer_primitives::Element;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::Accumulator;
    use crate::hash_cache::HashCache;

    /// Only the leaves are written, every other node is recomputed on load
    impl<const HEIGHT: usize, C> Serialize for Accumulator<HEIGHT, C> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            self.leaves().serialize(serializer)
        }
    }

    impl<'de, const HEIGHT: usize, C: HashCache + Default> Deserialize<'de>
        for Accumulator<HEIGHT, C>
    {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let leaves = Vec::<Element>::deserialize(deserializer)?;
            Self::try_from(leaves).map_err(serde::de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::{collection::vec, prelude::*};
    use test_strategy::proptest;

    use super::*;
    use crate::hash_cache::SimpleHashCache;

    #[proptest(cases = 32)]
    fn incremental_matches_rebuild(#[strategy(vec(any::<Element>(), 0..=16))] leaves: Vec<Element>) {
        let mut accumulator = Accumulator::<4>::new();

        for (i, leaf) in leaves.iter().enumerate() {
            prop_assert_eq!(accumulator.append(*leaf).unwrap(), i);

            let rebuilt = Tree::<4>::build(leaves[..=i].iter().copied()).unwrap();
            prop_assert_eq!(accumulator.root(), rebuilt.root());
        }

        let snapshot = accumulator.snapshot();
        let rebuilt = Tree::<4>::build(leaves.clone()).unwrap();
        prop_assert_eq!(&snapshot, &rebuilt);

        for index in 0..leaves.len() {
            prop_assert_eq!(snapshot.path(index).unwrap(), rebuilt.path(index).unwrap());
        }
    }

    #[test]
    fn append_hashes_one_node_per_level() {
        let cache = SimpleHashCache::new();
        let mut accumulator = Accumulator::<20, _>::new_with_cache(cache.clone());

        accumulator.append(Element::new(1)).unwrap();
        assert_eq!(cache.metrics().hashes(), 20);

        accumulator.append(Element::new(2)).unwrap();
        assert_eq!(cache.metrics().hashes(), 40);
    }

    #[test]
    fn full_accumulator_rejects_appends() {
        let mut accumulator = Accumulator::<2>::from_leaves((0..4).map(Element::new)).unwrap();
        let root = accumulator.root();

        assert!(accumulator.is_full());
        assert_eq!(
            accumulator.append(Element::new(4)).unwrap_err(),
            Error::TreeOverflow {
                len: 5,
                capacity: 4
            }
        );
        assert_eq!(accumulator.len(), 4);
        assert_eq!(accumulator.root(), root);
    }

    #[test]
    fn oversized_batch_is_rejected_up_front() {
        let mut accumulator = Accumulator::<2>::new();
        accumulator.append(Element::ONE).unwrap();

        let result = accumulator.extend(vec![Element::ZERO; 4]);

        assert!(matches!(result, Err(Error::TreeOverflow { .. })));
        assert_eq!(accumulator.len(), 1);
    }

    #[test]
    fn snapshots_are_independent() {
        let mut accumulator = Accumulator::<8>::from_leaves([Element::new(1)]).unwrap();
        let snapshot = accumulator.snapshot();

        accumulator.append(Element::new(2)).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_ne!(snapshot.root(), accumulator.root());
    }

    #[test]
    fn serde_keeps_only_leaves() {
        let accumulator = Accumulator::<8>::from_leaves((0..5).map(Element::new)).unwrap();

        let json = serde_json::to_value(&accumulator).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 5);

        let restored: Accumulator<8> = serde_json::from_value(json).unwrap();
        assert_eq!(restored.root(), accumulator.root());
        assert_eq!(restored.leaves(), accumulator.leaves());
    }
}
