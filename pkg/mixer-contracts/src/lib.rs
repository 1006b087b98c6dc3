#![deny(clippy::disallowed_methods)]

//! The ledger boundary of the mixer: deposit events, root and nullifier queries, and submitting
//! deposits and withdrawals

mod client;
mod contract;
mod error;
mod ledger;
#[cfg(any(test, feature = "test-api"))]
mod memory;
pub mod util;

pub use client::Client;
pub use contract::MixerContract;
pub use error::{Error, Result};
pub use ledger::{DepositEvent, Ledger};
#[cfg(any(test, feature = "test-api"))]
pub use memory::{MemoryLedger, ROOT_HISTORY_SIZE};

pub use web3::{
    signing::SecretKey,
    types::{Address, H256, U256},
};
