/// Error types for script operations.
///
/// Construction-time failures only: script validity and push
/// canonicality are boolean analyses (`is_valid`,
/// `has_canonical_pushes`), never errors, because consensus accepts
/// scripts that fail them.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// Truncated push length or push body.
    #[error("malformed script: {0}")]
    MalformedScript(String),

    /// Invalid hex string.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Hex decoding error.
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    /// An ASM token that is neither an opcode name nor hex data.
    #[error("unknown token: {0}")]
    UnknownToken(String),

    /// Push data exceeds the wire format's capacity.
    #[error("push data too big: {0} bytes")]
    DataTooBig(usize),
}
