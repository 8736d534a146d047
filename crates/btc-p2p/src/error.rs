/// Error types for the wire envelope.
///
/// Framing failures are fatal to the connection: after any of these the
/// caller discards the decoder. An unrecognized command is not a
/// failure; it decodes to `Payload::Unknown`.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Message length field exceeds the 32 MiB ceiling.
    #[error("payload length {0} exceeds maximum")]
    PayloadTooLarge(u32),

    /// Computed payload checksum disagrees with the header.
    #[error("bad checksum: header {header:08x}, computed {computed:08x}")]
    BadChecksum {
        /// Checksum carried in the header.
        header: u32,
        /// Checksum computed over the payload.
        computed: u32,
    },

    /// The expected network magic was not at the front of the stream.
    #[error("bad magic: expected {expected:08x}, read {read:08x}")]
    BadMagic {
        /// The connection's network magic.
        expected: u32,
        /// The bytes actually read.
        read: u32,
    },

    /// The byte source ended mid-header or mid-payload.
    #[error("stream truncated")]
    Truncated,

    /// The cancellation signal fired.
    #[error("cancelled")]
    Cancelled,

    /// A known command's payload bytes do not parse.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Transport error other than clean end-of-stream.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
