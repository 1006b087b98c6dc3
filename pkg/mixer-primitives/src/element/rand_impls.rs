use rand::{CryptoRng, RngCore};

use crate::Element;

impl Element {
    /// Draw `byte_len` uniformly random bytes and read them as a little-endian integer
    ///
    /// With `byte_len <= 31` the result is always below [`Element::MODULUS`], which is how deposit
    /// secrets are generated.
    ///
    /// ```rust
    /// # use mixer_primitives::*;
    /// let element = Element::secure_random(&mut rand::rngs::OsRng, 31);
    /// assert!(element.fits_in_bytes(31));
    /// assert!(element.is_canonical());
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `byte_len` is greater than 32
    #[must_use]
    pub fn secure_random<R: RngCore + CryptoRng>(rng: &mut R, byte_len: usize) -> Self {
        assert!(byte_len <= 32, "an element holds at most 32 bytes");

        let mut bytes = [0; 32];
        rng.fill_bytes(&mut bytes[..byte_len]);
        Self::from_le_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use rand_chacha::{rand_core::SeedableRng, ChaChaRng};

    use super::*;

    #[test]
    fn random_respects_width() {
        let mut rng = ChaChaRng::from_seed([3; 32]);

        for _ in 0..100 {
            assert!(Element::secure_random(&mut rng, 31).fits_in_bytes(31));
            assert!(Element::secure_random(&mut rng, 4).fits_in_bytes(4));
        }
    }

    #[test]
    fn random_is_seed_deterministic() {
        let a = Element::secure_random(&mut ChaChaRng::from_seed([9; 32]), 31);
        let b = Element::secure_random(&mut ChaChaRng::from_seed([9; 32]), 31);
        let c = Element::secure_random(&mut ChaChaRng::from_seed([10; 32]), 31);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
