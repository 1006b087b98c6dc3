use mixer_primitives::Element;

/// Result alias for mixer operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced while depositing or withdrawing
///
/// None of these are retried automatically. [`Error::LeafNotFound`] is usually transient: the
/// deposit may not be visible to the node yet, so fetching the events again later can succeed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The note could not be parsed, or its scalars are out of range
    #[error("note error: {0}")]
    Note(#[from] mixer_note::Error),

    /// The commitment tree could not be built or queried
    #[error("tree error: {0}")]
    Tree(#[from] mixer_tree::Error),

    /// The circuit input could not be built, or the proving system failed
    #[error("prover error: {0}")]
    Prover(#[from] mixer_prover::Error),

    /// The ledger rejected a request, or could not be reached
    #[error("ledger error: {0}")]
    Ledger(#[from] mixer_contracts::Error),

    /// The deposit's commitment is not among the ledger's deposit events
    #[error("commitment {0} was not found in the deposit events")]
    LeafNotFound(Element),

    /// The deposit's commitment appears more than once in the deposit events
    #[error("commitment {commitment} appears {count} times in the deposit events")]
    AmbiguousLeaf {
        /// The duplicated commitment
        commitment: Element,
        /// How many events carry it
        count: usize,
    },

    /// The tree rebuilt from the deposit events has a root the ledger does not know
    #[error("merkle tree is corrupted: root {root} is not known to the ledger")]
    TreeCorrupted {
        /// The root of the rebuilt tree
        root: Element,
    },

    /// The deposit events do not have contiguous leaf indices starting at zero
    #[error("deposit events are inconsistent: expected leaf index {expected}, found {found}")]
    InconsistentEvents {
        /// The leaf index that should be at this position
        expected: usize,
        /// The leaf index that is there
        found: u32,
    },

    /// The note has already been withdrawn
    #[error("the note is already spent (nullifier hash {0})")]
    AlreadySpent(Element),

    /// The root a proof was generated against dropped out of the ledger's history before the
    /// withdrawal was submitted
    #[error("root {0} is no longer known to the ledger")]
    RootExpired(Element),

    /// The note was made on a different network than the ledger is on
    #[error("note is for network {note}, but the ledger is on network {ledger}")]
    WrongNetwork {
        /// The network id in the note
        note: u64,
        /// The ledger's network id
        ledger: u64,
    },

    /// The configuration could not be loaded
    #[error("config error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// A configuration value is present but unusable
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The blocking proving task panicked or was cancelled
    #[error("prover task failed: {0}")]
    ProverTask(#[from] tokio::task::JoinError),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}
