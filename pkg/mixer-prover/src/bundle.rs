use ethereum_types::Address;
use mixer_primitives::Element;
use serde::{Deserialize, Serialize};

use crate::CircuitInput;

/// An opaque zero-knowledge proof, as produced by the proving system
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof(#[serde(with = "hex::serde")] Vec<u8>);

impl core::fmt::Debug for Proof {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Proof({} bytes)", self.0.len())
    }
}

impl Proof {
    /// Wrap raw proof bytes
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The raw proof bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// `0x`-prefixed hex
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }
}

/// The public inputs of a withdrawal, in the order the verifier expects them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicArgs {
    /// Merkle root the proof was generated against
    pub root: Element,
    /// Marks the deposit as spent
    pub nullifier_hash: Element,
    /// Receives the withdrawn value
    pub recipient: Address,
    /// Receives the fee
    pub relayer: Address,
    /// Paid to the relayer
    pub fee: Element,
    /// Paid to the recipient by the relayer
    pub refund: Element,
}

impl<const HEIGHT: usize> From<&CircuitInput<HEIGHT>> for PublicArgs {
    fn from(input: &CircuitInput<HEIGHT>) -> Self {
        Self {
            root: input.root,
            nullifier_hash: input.nullifier_hash,
            recipient: input.recipient,
            relayer: input.relayer,
            fee: input.fee,
            refund: input.refund,
        }
    }
}

impl PublicArgs {
    /// `[root, nullifierHash, recipient, relayer, fee, refund]` as `0x`-prefixed, zero-padded hex
    ///
    /// Field elements are 32 bytes (64 hex chars), addresses are 20 bytes (40 hex chars)
    ///
    /// ```rust
    /// # use mixer_prover::*;
    /// # use mixer_primitives::*;
    /// # use ethereum_types::Address;
    /// let args = PublicArgs {
    ///     root: Element::new(1),
    ///     nullifier_hash: Element::new(2),
    ///     recipient: Address::repeat_byte(0xab),
    ///     relayer: Address::zero(),
    ///     fee: Element::ZERO,
    ///     refund: Element::ZERO,
    /// };
    ///
    /// let hex = args.to_hex_args();
    /// assert_eq!(hex[0], format!("0x{}1", "0".repeat(63)));
    /// assert_eq!(hex[2], format!("0x{}", "ab".repeat(20)));
    /// assert_eq!(hex[3].len(), 42);
    /// assert_eq!(hex[5].len(), 66);
    /// ```
    #[must_use]
    pub fn to_hex_args(&self) -> [String; 6] {
        let element = |e: Element| format!("0x{}", e.to_hex());
        let address = |a: Address| format!("0x{}", hex::encode(a.as_bytes()));

        [
            element(self.root),
            element(self.nullifier_hash),
            address(self.recipient),
            address(self.relayer),
            element(self.fee),
            element(self.refund),
        ]
    }

    /// The arguments as the verifier's input vector: every value as a field element
    #[must_use]
    pub fn to_elements(&self) -> [Element; 6] {
        [
            self.root,
            self.nullifier_hash,
            crate::address_to_element(self.recipient),
            crate::address_to_element(self.relayer),
            self.fee,
            self.refund,
        ]
    }
}

/// A proof together with the public arguments it was generated for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofBundle {
    /// The zero-knowledge proof
    pub proof: Proof,
    /// The public arguments
    pub public_args: PublicArgs,
}

/// The wire form of a [`ProofBundle`]: `{ "proof": "0x...", "args": ["0x...", ...] }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofBundleHex {
    /// `0x`-prefixed proof bytes
    pub proof: String,
    /// See [`PublicArgs::to_hex_args`]
    pub args: [String; 6],
}

impl ProofBundle {
    /// The fixed-width hex wire format
    #[must_use]
    pub fn to_hex(&self) -> ProofBundleHex {
        ProofBundleHex {
            proof: self.proof.to_hex(),
            args: self.public_args.to_hex_args(),
        }
    }
}
