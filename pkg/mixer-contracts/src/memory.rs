use std::collections::{HashSet, VecDeque};

use async_trait::async_trait;
use ethereum_types::{H256, U256};
use mixer_primitives::Element;
use mixer_prover::ProofBundle;
use mixer_tree::{Accumulator, MERKLE_TREE_HEIGHT};
use parking_lot::RwLock;
use sha3::{Digest, Keccak256};

use crate::{DepositEvent, Error, Ledger, Result};

/// The number of recent roots the ledger accepts withdrawals against
pub const ROOT_HISTORY_SIZE: usize = 30;

type Verifier = Box<dyn Fn(&ProofBundle) -> bool + Send + Sync>;

/// A ledger that lives in memory and follows the rules of the mixer contract
///
/// Deposits are appended to an incremental tree, the last [`ROOT_HISTORY_SIZE`] roots are known,
/// and every nullifier hash can be spent once. Proofs are accepted as-is unless a verifier is
/// installed with [`MemoryLedger::with_verifier`].
pub struct MemoryLedger {
    state: RwLock<State>,
    network_id: u64,
    verifier: Option<Verifier>,
    refunds: bool,
}

#[derive(Default)]
struct State {
    tree: Accumulator<MERKLE_TREE_HEIGHT>,
    roots: VecDeque<Element>,
    commitments: HashSet<Element>,
    nullifier_hashes: HashSet<Element>,
    events: Vec<DepositEvent>,
    transactions: u64,
}

impl State {
    fn push_root(&mut self, root: Element) {
        if self.roots.len() == ROOT_HISTORY_SIZE {
            self.roots.pop_front();
        }

        self.roots.push_back(root);
    }

    fn next_txn_hash(&mut self, kind: &str) -> H256 {
        self.transactions += 1;

        let mut hasher = Keccak256::new();
        hasher.update(kind.as_bytes());
        hasher.update(self.transactions.to_be_bytes());
        H256::from_slice(&hasher.finalize())
    }
}

impl core::fmt::Debug for MemoryLedger {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.state.read();

        f.debug_struct("MemoryLedger")
            .field("network_id", &self.network_id)
            .field("deposits", &state.tree.len())
            .field("spent", &state.nullifier_hashes.len())
            .field("verifier", &self.verifier.is_some())
            .field("refunds", &self.refunds)
            .finish()
    }
}

impl MemoryLedger {
    pub fn new(network_id: u64) -> Self {
        let mut state = State::default();
        let empty_root = state.tree.root();
        state.push_root(empty_root);

        Self {
            state: RwLock::new(state),
            network_id,
            verifier: None,
            refunds: false,
        }
    }

    /// Reject withdrawals whose proof does not satisfy `verifier`
    #[must_use]
    pub fn with_verifier(
        self,
        verifier: impl Fn(&ProofBundle) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            verifier: Some(Box::new(verifier)),
            ..self
        }
    }

    /// Accept withdrawals with a nonzero refund, like a token instance
    #[must_use]
    pub fn with_refunds(self) -> Self {
        Self {
            refunds: true,
            ..self
        }
    }

    /// The current root of the commitment tree
    pub fn last_root(&self) -> Element {
        self.state.read().tree.root()
    }

    /// Edit the stored deposit events, e.g. to simulate a node returning bad data
    ///
    /// Only the events are affected, the tree and known roots are left alone.
    pub fn edit_events(&self, f: impl FnOnce(&mut Vec<DepositEvent>)) {
        f(&mut self.state.write().events);
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn deposit_events(&self) -> Result<Vec<DepositEvent>> {
        Ok(self.state.read().events.clone())
    }

    async fn is_known_root(&self, root: Element) -> Result<bool> {
        if root.is_zero() {
            return Ok(false);
        }

        Ok(self.state.read().roots.contains(&root))
    }

    async fn is_spent(&self, nullifier_hash: Element) -> Result<bool> {
        Ok(self.state.read().nullifier_hashes.contains(&nullifier_hash))
    }

    #[tracing::instrument(err, ret, skip(self))]
    async fn deposit(&self, commitment: Element) -> Result<H256> {
        let mut state = self.state.write();

        if state.commitments.contains(&commitment) {
            return Err(Error::DuplicateCommitment(commitment));
        }

        let leaf_index = state.tree.append(commitment).map_err(|_| Error::TreeFull)?;
        let leaf_index = u32::try_from(leaf_index).map_err(|_| Error::TreeFull)?;

        let root = state.tree.root();
        state.push_root(root);
        state.commitments.insert(commitment);

        let timestamp = U256::from(state.transactions + 1);
        state.events.push(DepositEvent {
            commitment,
            leaf_index,
            timestamp,
        });

        Ok(state.next_txn_hash("deposit"))
    }

    #[tracing::instrument(err, ret, skip_all)]
    async fn withdraw(&self, bundle: &ProofBundle) -> Result<H256> {
        let args = &bundle.public_args;
        if !self.refunds && !args.refund.is_zero() {
            return Err(Error::RefundNotSupported);
        }

        let mut state = self.state.write();

        if state.nullifier_hashes.contains(&args.nullifier_hash) {
            return Err(Error::NullifierSpent(args.nullifier_hash));
        }

        if args.root.is_zero() || !state.roots.contains(&args.root) {
            return Err(Error::UnknownRoot(args.root));
        }

        if let Some(verifier) = &self.verifier {
            if !verifier(bundle) {
                return Err(Error::InvalidProof);
            }
        }

        state.nullifier_hashes.insert(args.nullifier_hash);

        Ok(state.next_txn_hash("withdraw"))
    }

    async fn network_id(&self) -> Result<u64> {
        Ok(self.network_id)
    }

    fn supports_refund(&self) -> bool {
        self.refunds
    }
}
