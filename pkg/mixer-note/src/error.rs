/// Result alias for note and commitment operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced when deriving deposits or parsing notes
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The note string does not match `tornado-<currency>-<amount>-<netId>-0x<124 hex chars>`
    #[error("malformed note: {0}")]
    MalformedNote(&'static str),

    /// A nullifier or secret does not fit in 31 bytes
    #[error("{name} does not fit in 31 bytes")]
    ScalarOutOfRange {
        /// Which scalar was out of range
        name: &'static str,
    },

    /// A tag field contains characters that would make the note unparseable
    #[error("invalid note tag: {0}")]
    InvalidTag(&'static str),
}
