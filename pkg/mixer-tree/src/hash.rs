use std::sync::OnceLock;

use mixer_primitives::{hash_merge, zero_leaf, Element};

const CACHED_LEVELS: usize = 64;

/// The root of a completely empty subtree whose leaves are `level` edges below it
///
/// Defined recursively:
///  - `empty_subtree_hash(0) = zero_leaf()`
///  - `empty_subtree_hash(k) = hash_merge([empty_subtree_hash(k - 1), empty_subtree_hash(k - 1)])`
///
/// The first 64 levels are computed once and cached, later calls are a table lookup. Deeper levels
/// are derived from the last cached value on each call.
///
/// ```rust
/// # use mixer_tree::*;
/// # use mixer_primitives::*;
/// assert_eq!(empty_subtree_hash(0), zero_leaf());
///
/// let one = empty_subtree_hash(1);
/// assert_eq!(one, hash_merge([zero_leaf(), zero_leaf()]));
/// ```
#[inline]
#[must_use]
pub fn empty_subtree_hash(level: usize) -> Element {
    let table = table();

    match table.get(level) {
        Some(hash) => *hash,
        None => {
            tracing::warn!(level, "computing empty subtree hash beyond the cached levels");
            (CACHED_LEVELS..=level).fold(table[CACHED_LEVELS - 1], |hash, _| {
                hash_merge([hash, hash])
            })
        }
    }
}

fn table() -> &'static [Element] {
    static TABLE: OnceLock<Vec<Element>> = OnceLock::new();

    TABLE.get_or_init(|| {
        let mut levels = Vec::with_capacity(CACHED_LEVELS);
        let mut hash = zero_leaf();
        levels.push(hash);

        for _ in 1..CACHED_LEVELS {
            hash = hash_merge([hash, hash]);
            levels.push(hash);
        }

        levels
    })
}

#[cfg(test)]
mod tests {
    use core::str::FromStr;

    use super::*;

    #[test]
    fn levels_match_contract_zeros() {
        let zeros = [
            "0x2fe54c60d3acabf3343a35b6eba15db4821b340f76e741e2249685ed4899af6c",
            "0x256a6135777eee2fd26f54b8b7037a25439d5235caee224154186d2b8a52e31d",
            "0x1151949895e82ab19924de92c40a3d6f7bcb60d92b00504b8199613683f0c200",
            "0x20121ee811489ff8d61f09fb89e313f14959a0f28bb428a20dba6b0b068b3bdb",
            "0x0a89ca6ffa14cc462cfedb842c30ed221a50a3d6bf022a6a57dc82ab24c157c9",
        ];

        for (level, zero) in zeros.into_iter().enumerate() {
            let zero = Element::from_str(zero).unwrap();
            assert_eq!(empty_subtree_hash(level), zero, "level {level}");
        }

        assert_eq!(
            empty_subtree_hash(20),
            Element::from_str("0x29d7ed391256ccc3ea596c86e933b89ff339d25ea8ddced975ae2fe30b5296d4")
                .unwrap()
        );
    }

    #[test]
    fn levels_chain() {
        for level in 1..10 {
            let below = empty_subtree_hash(level - 1);
            assert_eq!(empty_subtree_hash(level), hash_merge([below, below]));
        }
    }

    #[test]
    fn fallback_continues_the_table() {
        let last = empty_subtree_hash(CACHED_LEVELS - 1);
        let next = empty_subtree_hash(CACHED_LEVELS);
        assert_eq!(next, hash_merge([last, last]));

        let after = empty_subtree_hash(CACHED_LEVELS + 1);
        assert_eq!(after, hash_merge([next, next]));
    }
}
