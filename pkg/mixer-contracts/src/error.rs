use ethereum_types::H256;
use mixer_primitives::Element;

/// Errors produced by the ledger adapters
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown transaction: {0}")]
    UnknownTransaction(H256),

    #[error("transaction reverted: {0}")]
    TransactionReverted(H256),

    #[error("web3 error")]
    Web3(#[from] web3::Error),

    #[error("web3 contract error")]
    Web3Contract(#[from] web3::contract::Error),

    #[error("serde_json error")]
    SerdeJson(#[from] serde_json::Error),

    #[error("from hex error")]
    FromHex(#[from] rustc_hex::FromHexError),

    #[error("malformed deposit event: {0}")]
    MalformedEvent(&'static str),

    #[error("network id {0:?} is not a number")]
    MalformedNetworkId(String),

    #[error("no signer configured, the contract is read-only")]
    ReadOnly,

    #[error("root {0} is not known to the ledger")]
    UnknownRoot(Element),

    #[error("nullifier hash {0} has already been spent")]
    NullifierSpent(Element),

    #[error("commitment {0} has already been deposited")]
    DuplicateCommitment(Element),

    #[error("the commitment tree is full")]
    TreeFull,

    #[error("proof was rejected by the verifier")]
    InvalidProof,

    #[error("this instance does not accept withdrawals with a refund")]
    RefundNotSupported,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
