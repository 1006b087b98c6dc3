#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![deny(missing_docs)]

//! Deposit secrets, commitments and the note format
//!
//! A deposit starts as two random 31-byte scalars (a [`Secret`]). From them a [`Deposit`] derives
//! the public commitment that goes into the ledger's tree, and the nullifier hash that is revealed
//! when the deposit is withdrawn. The scalars are kept by the user as a [`Note`] string.

mod deposit;
mod error;
mod note;

pub use deposit::{Deposit, Secret};
pub use error::{Error, Result};
pub use note::{decode, encode, Note, NoteTag};

/// The width of a nullifier or secret, in bytes
pub const SCALAR_BYTES: usize = 31;

/// The width of a deposit preimage: a nullifier followed by a secret
pub const PREIMAGE_BYTES: usize = 2 * SCALAR_BYTES;
