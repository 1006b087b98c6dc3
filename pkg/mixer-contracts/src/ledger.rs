use async_trait::async_trait;
use ethereum_types::{H256, U256};
use mixer_primitives::Element;
use mixer_prover::ProofBundle;

use crate::Result;

/// A commitment insertion, as reported by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositEvent {
    /// The inserted commitment
    pub commitment: Element,
    /// The position the ledger assigned to the commitment
    pub leaf_index: u32,
    /// The block timestamp of the deposit
    pub timestamp: U256,
}

/// The ledger that holds the commitment tree and verifies withdrawals
///
/// Every query goes to the ledger, nothing is cached between calls.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Every deposit event, in the order the ledger returns them
    ///
    /// Callers must not assume the events are sorted by `leaf_index`
    async fn deposit_events(&self) -> Result<Vec<DepositEvent>>;

    /// Whether `root` is one of the ledger's recent roots
    async fn is_known_root(&self, root: Element) -> Result<bool>;

    /// Whether a withdrawal with this nullifier hash has already happened
    async fn is_spent(&self, nullifier_hash: Element) -> Result<bool>;

    /// Insert `commitment`, paying the fixed denomination, and wait for it to be included
    async fn deposit(&self, commitment: Element) -> Result<H256>;

    /// Submit a withdrawal and wait for it to be included
    async fn withdraw(&self, bundle: &ProofBundle) -> Result<H256>;

    /// The network id written into notes
    async fn network_id(&self) -> Result<u64>;

    /// Whether withdrawals may carry a nonzero refund
    ///
    /// ETH instances require both the refund and the value of the withdrawal to be zero.
    fn supports_refund(&self) -> bool {
        false
    }
}
