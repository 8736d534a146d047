/// Unified error type for primitives operations.
///
/// Covers errors from hashing, hex decoding, and binary deserialization.
#[derive(Debug, thiserror::Error)]
pub enum PrimitivesError {
    /// Invalid hash value.
    #[error("invalid hash: {0}")]
    InvalidHash(String),

    /// Invalid hexadecimal string.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Variable-length integer exceeds maximum size.
    #[error("varint too large")]
    VarIntTooLarge,

    /// Unexpected end of input data.
    #[error("unexpected end of data")]
    UnexpectedEof,

    /// Hex decoding error.
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    /// Catch-all error.
    #[error("{0}")]
    Other(String),
}
