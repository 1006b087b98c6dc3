use std::sync::Arc;

use ethereum_types::{Address, H256};
use mixer_contracts::{DepositEvent, Ledger, MixerContract};
use mixer_note::{Deposit, Note, NoteTag, Secret};
use mixer_primitives::Element;
use mixer_prover::{CircuitInput, CommandProver, ProofBundle, Prover, ProvingSystem};
use mixer_tree::{hash_cache::SimpleHashCache, InclusionProof, Tree, MERKLE_TREE_HEIGHT};
use rand::{CryptoRng, RngCore};

use crate::{Config, Error, Result};

/// Node hashes kept between tree rebuilds before the cache is cleared
const MAX_CACHED_HASHES: usize = 1 << 22;

/// Relayer payment terms of a withdrawal
///
/// The default is a direct withdrawal: no relayer, no fee, no refund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WithdrawOptions {
    /// Receives the fee
    pub relayer: Address,
    /// Paid to the relayer out of the withdrawn value
    pub fee: Element,
    /// Paid to the recipient by the relayer, only where the ledger supports refunds
    pub refund: Element,
}

/// Deposits into and withdraws from a mixer ledger
///
/// Every withdrawal fetches the deposit events again and rebuilds the tree from them. Node hashes
/// are remembered between rebuilds, so only the nodes above new deposits are hashed again. Clones
/// share the same cache.
#[derive(Debug)]
pub struct Mixer<L, P> {
    ledger: Arc<L>,
    prover: Prover<P>,
    hash_cache: SimpleHashCache,
    currency: String,
    amount: String,
    network_id: Option<u64>,
}

impl<L, P> Clone for Mixer<L, P> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            prover: self.prover.clone(),
            hash_cache: self.hash_cache.clone(),
            currency: self.currency.clone(),
            amount: self.amount.clone(),
            network_id: self.network_id,
        }
    }
}

impl Mixer<MixerContract, CommandProver> {
    /// Connect to the contract and load the artifacts named in `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let contract = config.contract()?;
        let artifacts = config.load_artifacts()?;
        let system = config
            .command_prover()
            .ok_or_else(|| Error::InvalidConfig("prover.program is required".into()))?;

        let mixer = Self::new(
            Arc::new(contract),
            Prover::new(Arc::new(artifacts), Arc::new(system)),
            &config.denomination.currency,
            &config.denomination.amount,
        )?;

        Ok(match config.network_id {
            Some(network_id) => mixer.with_network_id(network_id),
            None => mixer,
        })
    }
}

impl<L: Ledger, P: ProvingSystem> Mixer<L, P> {
    /// Create a mixer for deposits of `amount` `currency`, as written in notes
    pub fn new(ledger: Arc<L>, prover: Prover<P>, currency: &str, amount: &str) -> Result<Self> {
        // validates the tag before any deposit is made with it
        NoteTag::new(currency, amount, 0)?;

        Ok(Self {
            ledger,
            prover,
            hash_cache: SimpleHashCache::new(),
            currency: currency.to_owned(),
            amount: amount.to_owned(),
            network_id: None,
        })
    }

    /// Use `network_id` for notes instead of asking the ledger
    #[must_use]
    pub fn with_network_id(self, network_id: u64) -> Self {
        Self {
            network_id: Some(network_id),
            ..self
        }
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    pub fn prover(&self) -> &Prover<P> {
        &self.prover
    }

    pub fn hash_cache(&self) -> &SimpleHashCache {
        &self.hash_cache
    }

    async fn network_id(&self) -> Result<u64> {
        match self.network_id {
            Some(network_id) => Ok(network_id),
            None => Ok(self.ledger.network_id().await?),
        }
    }

    /// Make a deposit with fresh secrets and return the note that can withdraw it
    ///
    /// The note is the only way to recover the deposit, it must be stored before anything else
    /// happens.
    pub async fn deposit<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<Note> {
        let deposit = Secret::random(rng).derive()?;
        let network_id = self.network_id().await?;
        let tag = NoteTag::new(self.currency.as_str(), self.amount.as_str(), network_id)?;

        let txn_hash = self.ledger.deposit(deposit.commitment()).await?;

        tracing::info!(
            ?txn_hash,
            commitment = %deposit.commitment(),
            network_id,
            "deposit submitted"
        );

        Ok(Note::new(tag, deposit))
    }

    /// Rebuild the tree from the ledger's deposit events and prove `deposit` is in it
    ///
    /// Fails if the events are not a contiguous run of leaf indices from zero, if the rebuilt root
    /// is not known to the ledger, if the deposit is already spent, or if its commitment is missing
    /// or duplicated.
    #[tracing::instrument(err, skip_all, fields(commitment = %deposit.commitment()))]
    pub async fn merkle_proof(
        &self,
        deposit: &Deposit,
    ) -> Result<InclusionProof<MERKLE_TREE_HEIGHT>> {
        let events = self.ledger.deposit_events().await?;
        tracing::info!(count = events.len(), "fetched deposit events");

        let leaves = ordered_leaves(events)?;

        if self.hash_cache.len() > MAX_CACHED_HASHES {
            tracing::info!(len = self.hash_cache.len(), "clearing node hash cache");
            self.hash_cache.evict_all();
        }

        let cache = self.hash_cache.clone();
        let tree = tokio::task::spawn_blocking(move || {
            Tree::<MERKLE_TREE_HEIGHT>::build_with_cache(leaves, &cache)
        })
        .await??;

        let root = tree.root();
        let metrics = self.hash_cache.metrics();
        tracing::debug!(
            %root,
            leaves = tree.len(),
            cache_hits = metrics.cache_hits(),
            cache_misses = metrics.cache_misses(),
            "rebuilt merkle tree"
        );

        if !self.ledger.is_known_root(root).await? {
            return Err(Error::TreeCorrupted { root });
        }

        let nullifier_hash = deposit.nullifier_hash();
        if self.ledger.is_spent(nullifier_hash).await? {
            return Err(Error::AlreadySpent(nullifier_hash));
        }

        let leaf_index = unique_leaf_index(tree.leaves(), deposit.commitment())?;
        tracing::info!(leaf_index, "found deposit in the tree");

        Ok(tree.path(leaf_index)?)
    }

    /// Prove a withdrawal of `deposit` to `recipient`
    ///
    /// Proving runs on a blocking thread. Dropping the returned future does not stop it: the
    /// backend (for [`CommandProver`], its child process) runs to completion and the proof is
    /// discarded.
    pub async fn generate_proof(
        &self,
        deposit: &Deposit,
        recipient: Address,
        options: WithdrawOptions,
    ) -> Result<ProofBundle> {
        let merkle_proof = self.merkle_proof(deposit).await?;

        let input = CircuitInput::new(
            &merkle_proof,
            deposit,
            recipient,
            options.relayer,
            options.fee,
            options.refund,
        )?;

        let prover = self.prover.clone();
        let bundle = tokio::task::spawn_blocking(move || prover.prove(&input)).await??;

        Ok(bundle)
    }

    /// Withdraw the deposit in `note` to `recipient`
    #[tracing::instrument(err, skip(self, note, options))]
    pub async fn withdraw(
        &self,
        note: &str,
        recipient: Address,
        options: WithdrawOptions,
    ) -> Result<H256> {
        let note = note.parse::<Note>()?;

        let ledger_network_id = self.network_id().await?;
        if note.tag.network_id() != ledger_network_id {
            return Err(Error::WrongNetwork {
                note: note.tag.network_id(),
                ledger: ledger_network_id,
            });
        }

        if !options.refund.is_zero() && !self.ledger.supports_refund() {
            return Err(Error::Ledger(mixer_contracts::Error::RefundNotSupported));
        }

        let bundle = self.generate_proof(&note.deposit, recipient, options).await?;
        let args = bundle.public_args;

        // proving is slow, the ledger may have moved on in the meantime
        if self.ledger.is_spent(args.nullifier_hash).await? {
            return Err(Error::AlreadySpent(args.nullifier_hash));
        }

        if !self.ledger.is_known_root(args.root).await? {
            return Err(Error::RootExpired(args.root));
        }

        let txn_hash = self
            .ledger
            .withdraw(&bundle)
            .await
            .map_err(|err| match err {
                mixer_contracts::Error::NullifierSpent(nullifier_hash) => {
                    Error::AlreadySpent(nullifier_hash)
                }
                err => Error::Ledger(err),
            })?;

        tracing::info!(?txn_hash, root = %args.root, "withdrawal submitted");

        Ok(txn_hash)
    }

    /// Deposit, then immediately withdraw the new deposit to `recipient`
    pub async fn mix_once<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        recipient: Address,
    ) -> Result<(Note, H256)> {
        let note = self.deposit(rng).await?;
        let txn_hash = self
            .withdraw(&note.to_string(), recipient, WithdrawOptions::default())
            .await?;

        Ok((note, txn_hash))
    }
}

/// The commitments in leaf order
///
/// Events may arrive in any order, but after sorting their leaf indices must be exactly `0..n`.
fn ordered_leaves(mut events: Vec<DepositEvent>) -> Result<Vec<Element>> {
    events.sort_by_key(|event| event.leaf_index);

    events
        .into_iter()
        .enumerate()
        .map(|(expected, event)| match event.leaf_index as usize == expected {
            true => Ok(event.commitment),
            false => Err(Error::InconsistentEvents {
                expected,
                found: event.leaf_index,
            }),
        })
        .collect()
}

fn unique_leaf_index(leaves: &[Element], commitment: Element) -> Result<usize> {
    let leaf_index =
        mixer_tree::find_leaf_index(leaves, commitment).ok_or(Error::LeafNotFound(commitment))?;

    let count = leaves[leaf_index..]
        .iter()
        .filter(|leaf| **leaf == commitment)
        .count();

    match count {
        1 => Ok(leaf_index),
        count => Err(Error::AmbiguousLeaf { commitment, count }),
    }
}
