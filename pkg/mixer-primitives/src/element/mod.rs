use ethnum::U256;

mod convert;
mod field;
mod fmt;

#[cfg(feature = "rand")]
mod rand_impls;

#[cfg(feature = "serde")]
mod serde;

/// A 256-bit unsigned integer
///
/// This type is a wrapper around a [`U256`], so can represent any value in the range `0..=(2^256 -
/// 1)`. When it is handed to the proving system it is interpreted as a [`Base`] field element,
/// which restricts the set of meaningful values to those below [`Element::MODULUS`].
///
/// Commitments, nullifier hashes, roots and every other hash output are always canonical. Raw
/// secret scalars are 31 bytes wide, so they are canonical by construction.
///
/// [`Base`]: crate::Base
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Element(#[cfg_attr(feature = "serde", serde(with = "serde"))] pub(crate) U256);

impl Element {
    /// The zero element
    pub const ZERO: Self = Self(U256::ZERO);

    /// The one element
    pub const ONE: Self = Self(U256::ONE);

    /// The largest possible element (note that this is not canonical)
    pub const MAX: Self = Self(U256::MAX);

    /// Create a new [`Element`] from a u64
    #[inline]
    #[must_use]
    pub fn new(i: u64) -> Self {
        Self(U256::from(i))
    }

    /// The inner [`U256`]
    #[inline]
    #[must_use]
    pub fn to_u256(self) -> U256 {
        self.0
    }

    /// Convert this [`Element`] to a 64 character big-endian hex string (without a `0x` prefix)
    #[inline]
    #[must_use]
    pub fn to_hex(self) -> String {
        hex::encode(self.to_be_bytes())
    }

    /// If this element is zero, returns true
    #[inline]
    #[must_use]
    pub fn is_zero(self) -> bool {
        self == Self::ZERO
    }

    /// Whether this value can be written into `byte_len` bytes without losing information
    ///
    /// ```rust
    /// # use mixer_primitives::*;
    /// assert!(Element::new(255).fits_in_bytes(1));
    /// assert!(!Element::new(256).fits_in_bytes(1));
    /// assert!(Element::MAX.fits_in_bytes(32));
    /// ```
    #[inline]
    #[must_use]
    pub fn fits_in_bytes(self, byte_len: usize) -> bool {
        match byte_len {
            0 => self.is_zero(),
            1..=31 => self.0.leading_zeros() as usize >= (32 - byte_len) * 8,
            _ => true,
        }
    }
}

#[cfg(any(test, feature = "proptest"))]
pub mod proptest {
    use super::Element;
    use ::proptest::{arbitrary::StrategyFor, prelude::*, strategy::Map};
    use ethnum::U256;

    impl Arbitrary for Element {
        type Strategy = Map<StrategyFor<[u8; 32]>, fn([u8; 32]) -> Self>;
        type Parameters = ();

        fn arbitrary_with((): Self::Parameters) -> Self::Strategy {
            any::<[u8; 32]>().prop_map(|array| Self(U256::from_be_bytes(array)))
        }
    }
}

#[cfg(test)]
mod test {
    use super::Element;

    #[test]
    fn display_is_padded_hex() {
        assert_eq!(Element::new(1).to_string(), format!("0x{}1", "0".repeat(63)));
        assert_eq!(Element::new(123).to_string(), format!("0x{}7b", "0".repeat(62)));
        assert_eq!(format!("{:x}", Element::new(123)), "7b");
        assert_eq!(format!("{:X}", Element::new(123)), "7B");
        assert_eq!(format!("{:?}", Element::MAX), format!("0x{}", "f".repeat(64)));
    }

    #[test]
    fn fits_in_bytes_boundaries() {
        let largest_31 = Element::from_le_slice(&[0xff; 31]).unwrap();

        assert!(largest_31.fits_in_bytes(31));
        assert!(!largest_31.fits_in_bytes(30));
        assert!(!(Element::from_le_slice(&[0xff; 32]).unwrap()).fits_in_bytes(31));
        assert!(Element::ZERO.fits_in_bytes(0));
        assert!(!Element::ONE.fits_in_bytes(0));
    }
}
