#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::match_bool)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

//! Depositing into and withdrawing from a mixer
//!
//! A [`Mixer`] ties together the pieces of a withdrawal: it parses a note, rebuilds the commitment
//! tree from the ledger's deposit events, proves membership of the note's commitment with a
//! [`ProvingSystem`][mixer_prover::ProvingSystem], and submits the proof to the
//! [`Ledger`][mixer_contracts::Ledger]. Deposits go the other way, from fresh random secrets to a
//! commitment on the ledger and a note for the user to keep.

mod config;
mod error;
mod mixer;

pub use config::{ArtifactsConfig, Config, DenominationConfig, ProverConfig, ENV_PREFIX};
pub use error::{Error, Result};
pub use mixer::{Mixer, WithdrawOptions};
