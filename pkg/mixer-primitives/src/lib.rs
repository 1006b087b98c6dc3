#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::match_bool)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![deny(missing_docs)]

//! Field elements and hash functions shared by the mixer's commitment scheme, Merkle tree and
//! proving inputs
//!
//! Commitments and nullifier hashes are Pedersen hashes on Baby Jubjub, Merkle nodes are MiMC
//! sponge hashes, both over the BN254 scalar field. The withdrawal circuit and the mixer contract
//! compute the exact same functions, so nothing in this crate is a free parameter: changing any of
//! it invalidates every existing commitment and proof.

mod babyjubjub;
mod element;
mod hash;
mod mimc;
mod path;
mod pedersen;

pub use element::Element;
pub use hash::{hash_field, hash_merge, zero_leaf};
pub use pedersen::MAX_PEDERSEN_BYTES;
pub use path::compute_merkle_root;

/// The base field used by the proving system
///
/// This is (roughly) an integer modulo `p` where `p` is [`Element::MODULUS`]
pub type Base = poseidon_circuit::Bn256Fr;
