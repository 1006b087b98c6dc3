use std::sync::OnceLock;

use sha3::{Digest, Keccak256};

use crate::{mimc, pedersen, Element, MAX_PEDERSEN_BYTES};

/// Hash `N` elements together with the MiMC sponge (220 rounds, exponent 5, key 0)
///
/// Merkle nodes are computed as `parent = hash_merge([left, right])`, the same way the mixer
/// contract's `hashLeftRight` does.
///
/// ```rust
/// # use mixer_primitives::*;
/// let a = Element::new(1);
/// let b = Element::new(2);
///
/// // the operation is not symmetric
/// assert_ne!(hash_merge([a, b]), hash_merge([b, a]));
/// ```
#[inline]
#[must_use]
pub fn hash_merge<const N: usize>(elements: [Element; N]) -> Element {
    Element::from_base(mimc::sponge(elements.map(Element::to_base)))
}

/// The x coordinate of the Pedersen hash of `bytes` on Baby Jubjub
///
/// Used for commitments and nullifier hashes. Inputs longer than [`MAX_PEDERSEN_BYTES`] are
/// rejected at compile time.
///
/// ```rust
/// # use mixer_primitives::*;
/// assert_ne!(hash_field(&[1, 2, 3]), hash_field(&[1, 2, 4]));
/// assert!(hash_field(&[0xff; 62]).is_canonical());
/// ```
///
/// ```compile_fail
/// # use mixer_primitives::*;
/// hash_field(&[0; 251]);
/// ```
#[must_use]
pub fn hash_field<const N: usize>(bytes: &[u8; N]) -> Element {
    let () = InputFits::<N>::OK;

    Element::from_base(pedersen::pedersen(bytes).x)
}

struct InputFits<const N: usize>;

impl<const N: usize> InputFits<N> {
    const OK: () = assert!(N <= MAX_PEDERSEN_BYTES, "input is longer than the generators cover");
}

/// The value of an empty leaf: `keccak256("tornado") mod p`
#[must_use]
pub fn zero_leaf() -> Element {
    static ZERO_LEAF: OnceLock<Element> = OnceLock::new();

    *ZERO_LEAF.get_or_init(|| {
        let digest: [u8; 32] = Keccak256::digest(b"tornado").into();
        let mut element = Element::from_be_bytes(digest);
        element.canonicalize();
        element
    })
}

#[cfg(test)]
mod tests {
    use core::str::FromStr;

    use rand_chacha::{rand_core::SeedableRng, ChaChaRng};
    use test_strategy::proptest;

    use super::*;

    fn element(hex: &str) -> Element {
        Element::from_str(hex).unwrap()
    }

    fn le31(value: u64) -> [u8; 31] {
        Element::new(value).to_le_array().unwrap()
    }

    #[test]
    fn hash_merge_matches_mimc_sponge() {
        assert_eq!(
            hash_merge([Element::new(1), Element::new(2)]),
            element("0x2bcea035a1251603f1ceaf73cd4ae89427c47075bb8e3a944039ff1e3d6d2a6f")
        );
    }

    #[test]
    fn hash_merge_outputs_are_canonical() {
        let mut rng = ChaChaRng::from_seed([0; 32]);

        for _ in 0..20 {
            let left = Element::secure_random(&mut rng, 31);
            let right = Element::secure_random(&mut rng, 31);

            assert!(hash_merge([left, right]).is_canonical());
        }
    }

    #[test]
    fn hash_field_matches_pedersen_vectors() {
        let preimage = [le31(1), le31(2)].concat();
        let preimage: [u8; 62] = preimage.try_into().unwrap();

        assert_eq!(
            hash_field(&preimage),
            element("0x25a6bdfb2826d2cebc3db87f0af822d09845a98a4ea3cf15b69ae6eaf0f495cc")
        );
        assert_eq!(
            hash_field(&le31(1)),
            element("0x2194888111860ab912b5a6d814efd264d067023f70916f3c2a5b083d8b7cae48")
        );
        assert_eq!(
            hash_field(&[0; 62]),
            element("0x17731ee23dee1b3a01f4c667052b7898aee8db579cc49748d8fc798d4e769d58")
        );
    }

    #[proptest(cases = 16)]
    fn hash_field_is_deterministic(bytes: [u8; 31]) {
        assert_eq!(hash_field(&bytes), hash_field(&bytes));
    }

    #[test]
    fn zero_leaf_is_reduced_keccak() {
        assert_eq!(
            zero_leaf(),
            element("0x2fe54c60d3acabf3343a35b6eba15db4821b340f76e741e2249685ed4899af6c")
        );
    }
}
