use core::fmt;

use mixer_primitives::{hash_field, Element};
use rand::{CryptoRng, RngCore};

use crate::{Error, Result, PREIMAGE_BYTES, SCALAR_BYTES};

/// The two random scalars behind a single deposit
///
/// Whoever knows these values can withdraw the deposit, so they are never printed by [`Debug`].
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Secret {
    /// Revealed (hashed) on withdrawal to prevent double spends
    pub nullifier: Element,
    /// Blinds the commitment
    pub secret: Element,
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret").finish_non_exhaustive()
    }
}

impl Secret {
    /// Draw a fresh nullifier and secret, 31 random bytes each
    ///
    /// ```rust
    /// # use mixer_note::*;
    /// let secret = Secret::random(&mut rand::rngs::OsRng);
    /// let deposit = secret.derive().unwrap();
    /// ```
    #[must_use]
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self {
            nullifier: Element::secure_random(rng, SCALAR_BYTES),
            secret: Element::secure_random(rng, SCALAR_BYTES),
        }
    }

    /// Compute the [`Deposit`] for this secret
    #[inline]
    pub fn derive(self) -> Result<Deposit> {
        Deposit::derive(self.nullifier, self.secret)
    }
}

/// The secret material for a deposit, together with its public commitment and nullifier hash
///
/// ```text
/// preimage       = LE31(nullifier) ‖ LE31(secret)
/// commitment     = hash_field(preimage)
/// nullifier_hash = hash_field(LE31(nullifier))
/// ```
///
/// A [`Deposit`] can only be obtained through [`Deposit::derive`], so the derived values always
/// match the scalars.
#[derive(Clone, PartialEq, Eq)]
pub struct Deposit {
    nullifier: Element,
    secret: Element,
    preimage: [u8; PREIMAGE_BYTES],
    commitment: Element,
    nullifier_hash: Element,
}

impl fmt::Debug for Deposit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deposit")
            .field("commitment", &self.commitment)
            .field("nullifier_hash", &self.nullifier_hash)
            .finish_non_exhaustive()
    }
}

impl Deposit {
    /// Derive a deposit from its two scalars
    ///
    /// Deterministic: the same scalars always give the same commitment and nullifier hash. Returns
    /// [`Error::ScalarOutOfRange`] if either scalar needs more than 31 bytes.
    ///
    /// ```rust
    /// # use mixer_note::*;
    /// # use mixer_primitives::*;
    /// let a = Deposit::derive(Element::new(1), Element::new(2)).unwrap();
    /// let b = Deposit::derive(Element::new(1), Element::new(2)).unwrap();
    /// assert_eq!(a.commitment(), b.commitment());
    ///
    /// // the nullifier hash does not depend on the secret
    /// let c = Deposit::derive(Element::new(1), Element::new(3)).unwrap();
    /// assert_eq!(a.nullifier_hash(), c.nullifier_hash());
    /// assert_ne!(a.commitment(), c.commitment());
    ///
    /// assert!(Deposit::derive(Element::MAX, Element::ONE).is_err());
    /// ```
    pub fn derive(nullifier: Element, secret: Element) -> Result<Self> {
        let nullifier_bytes = nullifier
            .to_le_array::<SCALAR_BYTES>()
            .ok_or(Error::ScalarOutOfRange { name: "nullifier" })?;
        let secret_bytes = secret
            .to_le_array::<SCALAR_BYTES>()
            .ok_or(Error::ScalarOutOfRange { name: "secret" })?;

        let mut preimage = [0; PREIMAGE_BYTES];
        preimage[..SCALAR_BYTES].copy_from_slice(&nullifier_bytes);
        preimage[SCALAR_BYTES..].copy_from_slice(&secret_bytes);

        Ok(Self {
            nullifier,
            secret,
            preimage,
            commitment: hash_field(&preimage),
            nullifier_hash: hash_field(&nullifier_bytes),
        })
    }

    /// The nullifier scalar
    #[inline]
    #[must_use]
    pub fn nullifier(&self) -> Element {
        self.nullifier
    }

    /// The secret scalar
    #[inline]
    #[must_use]
    pub fn secret(&self) -> Element {
        self.secret
    }

    /// Both scalars
    #[inline]
    #[must_use]
    pub fn to_secret(&self) -> Secret {
        Secret {
            nullifier: self.nullifier,
            secret: self.secret,
        }
    }

    /// `LE31(nullifier) ‖ LE31(secret)`
    #[inline]
    #[must_use]
    pub fn preimage(&self) -> &[u8; PREIMAGE_BYTES] {
        &self.preimage
    }

    /// The value inserted into the ledger's tree
    #[inline]
    #[must_use]
    pub fn commitment(&self) -> Element {
        self.commitment
    }

    /// The value published on withdrawal
    #[inline]
    #[must_use]
    pub fn nullifier_hash(&self) -> Element {
        self.nullifier_hash
    }
}
