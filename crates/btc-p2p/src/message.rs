//! Message framing: encoding and stream decoding.
//!
//! Wire layout, little-endian throughout:
//!
//! | Field    | Size      | Notes                                    |
//! |----------|-----------|------------------------------------------|
//! | magic    | 4 bytes   | network identifier                       |
//! | command  | 12 bytes  | ASCII, NUL right-padded                  |
//! | length   | 4 bytes   | payload size, at most 32 MiB             |
//! | checksum | 4 bytes   | first 4 bytes of SHA256d(payload); only  |
//! |          |           | when the negotiated version carries it   |
//! | payload  | variable  |                                          |
//!
//! Decoding runs the state machine SEEK_MAGIC → READ_HEADER →
//! READ_PAYLOAD → VERIFY_CHECKSUM → DECODE → EMIT. Framing failures are
//! terminal; only a missed magic in scanning mode re-enters SEEK_MAGIC.

use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use btc_primitives::hash::sha256d;
use btc_primitives::util::ByteWriter;

use crate::command::Command;
use crate::payload::{CodecRegistry, Payload};
use crate::{Network, WireError, CHECKSUM_VERSION, MAX_PAYLOAD_SIZE};

/// A framed, decoded message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// The command tag the message was framed under.
    pub command: Command,
    /// The decoded payload.
    pub payload: Payload,
}

/// Cooperative cancellation for blocking reads.
///
/// Cloned into whatever owns the other end of the connection; the
/// decoder checks it at every read boundary and surfaces
/// `WireError::Cancelled` without consuming a partial frame as a
/// message.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether the signal has fired.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The explicit decode context of a connection.
#[derive(Clone, Copy, Debug)]
pub struct DecoderConfig {
    /// The network whose magic frames every message.
    pub network: Network,
    /// The negotiated protocol version; decides checksum presence.
    pub protocol_version: u32,
    /// When set, bytes before the magic are skipped; otherwise a
    /// mismatched magic is fatal.
    pub scan_for_magic: bool,
}

impl DecoderConfig {
    /// A strict-framing config for a network at a protocol version.
    pub fn new(network: Network, protocol_version: u32) -> Self {
        DecoderConfig {
            network,
            protocol_version,
            scan_for_magic: false,
        }
    }

    /// Enable scanning past garbage to the next magic.
    pub fn tolerant(mut self) -> Self {
        self.scan_for_magic = true;
        self
    }

    fn has_checksum(&self) -> bool {
        self.protocol_version >= CHECKSUM_VERSION
    }
}

/// Per-connection message decoder.
///
/// Owns the decode context, the payload codec registry, and one
/// reusable payload buffer. A connection holds exactly one decoder;
/// messages come out in wire order.
pub struct MessageDecoder {
    config: DecoderConfig,
    registry: CodecRegistry,
    payload_buf: Vec<u8>,
}

impl MessageDecoder {
    /// A decoder over the built-in codec registry.
    pub fn new(config: DecoderConfig) -> Self {
        Self::with_registry(config, CodecRegistry::with_builtins())
    }

    /// A decoder over a caller-assembled registry.
    pub fn with_registry(config: DecoderConfig, registry: CodecRegistry) -> Self {
        MessageDecoder {
            config,
            registry,
            payload_buf: Vec::new(),
        }
    }

    /// Read and decode the next message from a blocking byte source.
    ///
    /// Every read boundary honors the cancellation token. Framing
    /// failures (`Truncated`, `PayloadTooLarge`, `BadChecksum`,
    /// `BadMagic`, `Cancelled`) are fatal: the caller discards this
    /// decoder and the connection.
    ///
    /// # Arguments
    /// * `source` - The connection's byte stream.
    /// * `cancel` - The connection's cancellation signal.
    ///
    /// # Returns
    /// The next framed message in wire order.
    pub fn read_message<R: Read>(
        &mut self,
        source: &mut R,
        cancel: &CancelToken,
    ) -> Result<Message, WireError> {
        self.seek_magic(source, cancel)?;

        // Header: command, length, optional checksum.
        let mut tag = [0u8; 12];
        read_exact(source, &mut tag, cancel)?;
        let command = Command::from_wire(tag);

        let mut length_bytes = [0u8; 4];
        read_exact(source, &mut length_bytes, cancel)?;
        let length = u32::from_le_bytes(length_bytes);
        if length > MAX_PAYLOAD_SIZE {
            return Err(WireError::PayloadTooLarge(length));
        }

        let header_checksum = if self.config.has_checksum() {
            let mut checksum_bytes = [0u8; 4];
            read_exact(source, &mut checksum_bytes, cancel)?;
            Some(u32::from_le_bytes(checksum_bytes))
        } else {
            None
        };

        // Payload, into the reusable buffer.
        self.payload_buf.resize(length as usize, 0);
        read_exact(source, &mut self.payload_buf, cancel)?;

        if let Some(header) = header_checksum {
            let computed = payload_checksum(&self.payload_buf);
            if computed != header {
                log::warn!("checksum mismatch on '{}' message", command);
                return Err(WireError::BadChecksum { header, computed });
            }
        }

        // Dispatch by command tag; unknown commands are diagnostic only.
        let payload = match self.registry.lookup(&command) {
            Some(decode) => decode(&self.payload_buf)?,
            None => {
                log::warn!("unknown command '{}' ({} byte payload)", command, length);
                Payload::Unknown {
                    command,
                    bytes: self.payload_buf.clone(),
                }
            }
        };

        Ok(Message { command, payload })
    }

    /// Position the stream just past the network magic.
    ///
    /// Strict mode reads four bytes and requires them to match. In
    /// scanning mode a rolling window advances one byte at a time, so
    /// no more input is consumed than necessary.
    fn seek_magic<R: Read>(&self, source: &mut R, cancel: &CancelToken) -> Result<(), WireError> {
        let expected = self.config.network.magic().to_le_bytes();
        let mut window = [0u8; 4];
        read_exact(source, &mut window, cancel)?;
        if window == expected {
            return Ok(());
        }
        if !self.config.scan_for_magic {
            return Err(WireError::BadMagic {
                expected: self.config.network.magic(),
                read: u32::from_le_bytes(window),
            });
        }
        loop {
            let mut next = [0u8; 1];
            read_exact(source, &mut next, cancel)?;
            window.rotate_left(1);
            window[3] = next[0];
            if window == expected {
                return Ok(());
            }
        }
    }
}

/// Encode one message to a byte sink.
///
/// The checksum field is present iff `protocol_version` is at least the
/// checksum cutoff, mirroring the decoder.
///
/// # Arguments
/// * `sink`             - Destination for the framed bytes.
/// * `network`          - Supplies the magic.
/// * `protocol_version` - The negotiated protocol version.
/// * `payload`          - The payload to frame.
pub fn write_message<W: Write>(
    sink: &mut W,
    network: Network,
    protocol_version: u32,
    payload: &Payload,
) -> Result<(), WireError> {
    let body = payload.to_bytes();

    let mut writer = ByteWriter::with_capacity(24 + body.len());
    writer.write_u32_le(network.magic());
    writer.write_bytes(payload.command().as_bytes());
    writer.write_u32_le(body.len() as u32);
    if protocol_version >= CHECKSUM_VERSION {
        writer.write_u32_le(payload_checksum(&body));
    }
    writer.write_bytes(&body);

    sink.write_all(writer.as_bytes())?;
    Ok(())
}

/// The header checksum: the first four bytes of SHA256d(payload), read
/// little-endian.
fn payload_checksum(payload: &[u8]) -> u32 {
    let digest = sha256d(payload);
    u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// `Read::read_exact` with cancellation at the boundary and clean EOF
/// mapped to `Truncated`.
fn read_exact<R: Read>(
    source: &mut R,
    buf: &mut [u8],
    cancel: &CancelToken,
) -> Result<(), WireError> {
    if cancel.is_cancelled() {
        return Err(WireError::Cancelled);
    }
    source.read_exact(buf).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            WireError::Truncated
        } else {
            WireError::Io(e)
        }
    })
}
