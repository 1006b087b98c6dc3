use std::path::PathBuf;

/// Result alias for proving operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced while assembling circuit inputs or generating proofs
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The proving system could not produce a proof for the given input
    #[error("proof generation failed: {0}")]
    ProofGenerationFailed(String),

    /// A public input is not a valid field element
    #[error("{name} is not below the field modulus")]
    InputOutOfRange {
        /// The circuit's name for the input
        name: &'static str,
    },

    /// An artifact could not be read, or the prover process could not be run
    #[error("io error for {path:?}: {source}")]
    Io {
        /// The file or program involved
        path: PathBuf,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// The circuit input could not be serialized
    #[error("serde_json error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}
