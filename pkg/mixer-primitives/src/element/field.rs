use ethnum::U256;
use ff::PrimeField;

use crate::{hash_merge, Base, Element};

impl Element {
    /// The modulus of the BN254 scalar field
    pub const MODULUS: Element = Element(U256::from_words(
        0x3064_4e72_e131_a029_b850_45b6_8181_585d,
        0x2833_e848_79b9_7091_43e1_f593_f000_0001,
    ));

    /// Return the result of hash-merging this value with `other`
    ///
    /// This element is considered to be on the left:
    /// ```rust
    /// # use mixer_primitives::*;
    /// let a = Element::new(1);
    /// let b = Element::new(2);
    ///
    /// assert_eq!(a.hashed_with(b), hash_merge([a, b]));
    /// ```
    #[inline]
    #[must_use = "this function doesn't modify self"]
    pub fn hashed_with(self, other: Element) -> Self {
        hash_merge([self, other])
    }

    /// Convert this [`Element`] to its equivalent [`Base`] representation
    #[inline]
    #[must_use]
    pub fn to_base(self) -> Base {
        Base::from_raw(le_limbs(self.0.to_le_bytes()))
    }

    /// Create an [`Element`] from a [`Base`]
    #[inline]
    #[must_use]
    pub fn from_base(base: Base) -> Element {
        Self(U256::from_le_bytes(base.to_repr()))
    }

    /// Reduce this element modulo [`Element::MODULUS`]
    ///
    /// Elements in canonical form are guaranteed to be unchanged when converting to/from a [`Base`]
    #[inline]
    pub fn canonicalize(&mut self) {
        self.0 %= Self::MODULUS.0;
    }

    /// Whether this [`Element`] is below [`Element::MODULUS`]
    #[inline]
    #[must_use]
    pub fn is_canonical(&self) -> bool {
        self.0 < Self::MODULUS.0
    }
}

impl From<Base> for Element {
    fn from(value: Base) -> Self {
        Element::from_base(value)
    }
}

impl From<Element> for Base {
    fn from(value: Element) -> Self {
        value.to_base()
    }
}

fn le_limbs(bytes: [u8; 32]) -> [u64; 4] {
    core::array::from_fn(|i| {
        let mut limb = [0; 8];
        limb.copy_from_slice(&bytes[i * 8..(i + 1) * 8]);
        u64::from_le_bytes(limb)
    })
}
