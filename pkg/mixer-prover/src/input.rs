use ethereum_types::Address;
use mixer_note::Deposit;
use mixer_primitives::Element;
use mixer_tree::InclusionProof;
use serde_json::{json, Value};

use crate::{Error, Result};

/// The full assignment for the withdrawal circuit
///
/// Public inputs are `root`, `nullifier_hash`, `recipient`, `relayer`, `fee` and `refund`. The rest
/// are private witnesses and never leave the prover.
#[derive(Clone, PartialEq, Eq)]
pub struct CircuitInput<const HEIGHT: usize> {
    /// A root the ledger knows about
    pub root: Element,
    /// `hash_field(LE31(nullifier))`
    pub nullifier_hash: Element,
    /// Receives the withdrawn value
    pub recipient: Address,
    /// Receives `fee`, or the zero address when there is no relayer
    pub relayer: Address,
    /// Paid to `relayer`
    pub fee: Element,
    /// Paid to `recipient` by the relayer
    pub refund: Element,

    /// Private: the deposit's nullifier
    pub nullifier: Element,
    /// Private: the deposit's secret
    pub secret: Element,
    /// Private: siblings from leaf to root
    pub path_elements: [Element; HEIGHT],
    /// Private: `true` where the path node is a right child
    pub path_indices: [bool; HEIGHT],
}

impl<const HEIGHT: usize> core::fmt::Debug for CircuitInput<HEIGHT> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CircuitInput")
            .field("root", &self.root)
            .field("nullifier_hash", &self.nullifier_hash)
            .field("recipient", &self.recipient)
            .field("relayer", &self.relayer)
            .field("fee", &self.fee)
            .field("refund", &self.refund)
            .finish_non_exhaustive()
    }
}

impl<const HEIGHT: usize> CircuitInput<HEIGHT> {
    /// Combine an inclusion proof with the deposit it proves
    ///
    /// `fee` and `refund` must be valid field elements, otherwise [`Error::InputOutOfRange`] is
    /// returned
    pub fn new(
        proof: &InclusionProof<HEIGHT>,
        deposit: &Deposit,
        recipient: Address,
        relayer: Address,
        fee: Element,
        refund: Element,
    ) -> Result<Self> {
        if !fee.is_canonical() {
            return Err(Error::InputOutOfRange { name: "fee" });
        }

        if !refund.is_canonical() {
            return Err(Error::InputOutOfRange { name: "refund" });
        }

        Ok(Self {
            root: proof.root,
            nullifier_hash: deposit.nullifier_hash(),
            recipient,
            relayer,
            fee,
            refund,
            nullifier: deposit.nullifier(),
            secret: deposit.secret(),
            path_elements: proof.path_elements,
            path_indices: proof.path_indices,
        })
    }

    /// The witness in the format circuit toolchains consume
    ///
    /// Every field element is a decimal string, path indices are the numbers `0` and `1`, and the
    /// keys use the circuit's signal names (`nullifierHash`, `pathElements`, ...)
    #[must_use]
    pub fn to_json(&self) -> Value {
        let decimal = |element: Element| element.to_u256().to_string();
        let address = |address: Address| decimal(address_to_element(address));

        json!({
            "root": decimal(self.root),
            "nullifierHash": decimal(self.nullifier_hash),
            "recipient": address(self.recipient),
            "relayer": address(self.relayer),
            "fee": decimal(self.fee),
            "refund": decimal(self.refund),
            "nullifier": decimal(self.nullifier),
            "secret": decimal(self.secret),
            "pathElements": self.path_elements.map(decimal).to_vec(),
            "pathIndices": self.path_indices.map(u8::from).to_vec(),
        })
    }
}

/// An address as a field element (the 20 bytes read as a big-endian integer)
#[must_use]
pub fn address_to_element(address: Address) -> Element {
    let mut bytes = [0; 32];
    bytes[12..].copy_from_slice(address.as_bytes());
    Element::from_be_bytes(bytes)
}
