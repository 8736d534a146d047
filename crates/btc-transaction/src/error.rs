/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// Malformed or truncated transaction bytes.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Structurally invalid transaction content.
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    /// Signature combination asked to operate on a script shape it
    /// cannot merge.
    #[error("unsupported script template for combination")]
    UnsupportedTemplate,

    /// Signature combination required a multisig locking script and the
    /// given script does not parse as one.
    #[error("locking script is not a valid multisig script")]
    InvalidMultisigParams,

    /// Error from the script crate.
    #[error("script error: {0}")]
    Script(#[from] btc_script::ScriptError),
}
