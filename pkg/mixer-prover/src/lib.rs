#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![deny(missing_docs)]

//! Assembling withdrawal circuit inputs and driving a proving backend
//!
//! The circuit itself, and the system that proves it, live outside this crate. A [`CircuitInput`]
//! is built from an [`InclusionProof`][mixer_tree::InclusionProof] and a
//! [`Deposit`][mixer_note::Deposit], handed to a [`ProvingSystem`], and the result is returned as a
//! [`ProofBundle`] whose public arguments are in the order the on-chain verifier expects.

mod artifacts;
mod bundle;
mod error;
mod input;
#[cfg(any(test, feature = "test-api"))]
mod native;
mod prover;

pub use artifacts::Artifacts;
pub use bundle::{Proof, ProofBundle, ProofBundleHex, PublicArgs};
pub use error::{Error, Result};
pub use input::{address_to_element, CircuitInput};
#[cfg(any(test, feature = "test-api"))]
pub use native::NativeProver;
pub use prover::{CommandProver, Prover, ProvingSystem};
