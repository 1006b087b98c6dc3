use crate::Element;
use ethnum::U256;
use std::str::FromStr;

impl From<u64> for Element {
    #[inline]
    fn from(value: u64) -> Self {
        Element(U256::from(value))
    }
}

impl From<bool> for Element {
    #[inline]
    fn from(value: bool) -> Self {
        match value {
            false => Self::ZERO,
            true => Self::ONE,
        }
    }
}

/// Parses a hex string, with or without a `0x` prefix
impl FromStr for Element {
    type Err = <U256 as FromStr>::Err;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        Ok(Self(U256::from_str_radix(s, 16)?))
    }
}

impl From<U256> for Element {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl From<Element> for U256 {
    fn from(value: Element) -> Self {
        value.0
    }
}

impl Element {
    /// Convert the [`Element`] to its bytes in big-endian format
    ///
    /// ```rust
    /// # use mixer_primitives::*;
    /// let mut one = [0; 32];
    /// one[31] = 1;
    /// assert_eq!(Element::ONE.to_be_bytes(), one);
    /// ```
    #[inline]
    #[must_use]
    pub fn to_be_bytes(self) -> [u8; 32] {
        self.0.to_be_bytes()
    }

    /// Convert the [`Element`] to its bytes in little-endian format
    #[inline]
    #[must_use]
    pub fn to_le_bytes(self) -> [u8; 32] {
        self.0.to_le_bytes()
    }

    /// Convert big-endian bytes into an [`Element`]
    #[inline]
    #[must_use]
    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Self(U256::from_be_bytes(bytes))
    }

    /// Convert little-endian bytes into an [`Element`]
    #[inline]
    #[must_use]
    pub fn from_le_bytes(bytes: [u8; 32]) -> Self {
        Self(U256::from_le_bytes(bytes))
    }

    /// Write the `N` low-order bytes of this element in little-endian order
    ///
    /// Returns `None` if the value does not fit in `N` bytes. Nothing is ever truncated.
    ///
    /// ```rust
    /// # use mixer_primitives::*;
    /// assert_eq!(Element::new(0x0102).to_le_array::<3>(), Some([2, 1, 0]));
    /// assert_eq!(Element::new(0x010203).to_le_array::<2>(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn to_le_array<const N: usize>(self) -> Option<[u8; N]> {
        if N > 32 || !self.fits_in_bytes(N) {
            return None;
        }

        let bytes = self.to_le_bytes();
        let mut array = [0; N];
        array.copy_from_slice(&bytes[..N]);
        Some(array)
    }

    /// Read up to 32 little-endian bytes into an [`Element`]
    ///
    /// Missing high-order bytes are zero. Returns `None` if `bytes` is longer than 32 bytes.
    #[inline]
    #[must_use]
    pub fn from_le_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() > 32 {
            return None;
        }

        let mut padded = [0; 32];
        padded[..bytes.len()].copy_from_slice(bytes);
        Some(Self::from_le_bytes(padded))
    }

    /// Read up to 32 big-endian bytes into an [`Element`]
    ///
    /// Missing high-order bytes are zero. Returns `None` if `bytes` is longer than 32 bytes.
    ///
    /// ```rust
    /// # use mixer_primitives::*;
    /// let address = [0x11; 20];
    /// let element = Element::from_be_slice(&address).unwrap();
    /// assert_eq!(&element.to_be_bytes()[12..], &address);
    /// ```
    #[inline]
    #[must_use]
    pub fn from_be_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() > 32 {
            return None;
        }

        let mut padded = [0; 32];
        padded[32 - bytes.len()..].copy_from_slice(bytes);
        Some(Self::from_be_bytes(padded))
    }
}
