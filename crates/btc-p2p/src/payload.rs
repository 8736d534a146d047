//! Typed message payloads and the codec registry.
//!
//! Every command tag maps to a decoder through a `CodecRegistry` that
//! is populated with the built-in codecs at construction and read-only
//! afterwards, so lookups are safe for concurrent readers. Commands
//! without a registered codec decode to `Payload::Unknown` carrying the
//! raw bytes — receipt of an unrecognized message is diagnostic, not an
//! error.

use std::collections::HashMap;

use btc_primitives::chainhash::Hash;
use btc_primitives::util::{ByteReader, ByteWriter, VarInt};

use crate::command::Command;
use crate::WireError;

/// Largest number of entries accepted in an inventory payload.
pub const MAX_INV_ENTRIES: u64 = 50_000;

/// Inventory type announcing a transaction.
pub const INV_TX: u32 = 1;
/// Inventory type announcing a block.
pub const INV_BLOCK: u32 = 2;

/// One entry of an `inv`/`getdata` payload: an object type and hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InventoryVector {
    /// The announced object type (`INV_TX`, `INV_BLOCK`, ...).
    pub inv_type: u32,
    /// The object's hash.
    pub hash: Hash,
}

/// A decoded message payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    /// Handshake acknowledgement; empty on the wire.
    Verack,
    /// Keepalive probe carrying a nonce.
    Ping(u64),
    /// Keepalive reply echoing the probe's nonce.
    Pong(u64),
    /// Inventory announcement.
    Inv(Vec<InventoryVector>),
    /// Request for announced objects.
    GetData(Vec<InventoryVector>),
    /// Request for the peer's mempool contents; empty on the wire.
    Mempool,
    /// A command with no registered codec, kept as raw bytes.
    Unknown {
        /// The unrecognized command tag.
        command: Command,
        /// The raw payload bytes.
        bytes: Vec<u8>,
    },
}

impl Payload {
    /// The command tag this payload is framed under.
    pub fn command(&self) -> Command {
        match self {
            Payload::Verack => Command::VERACK,
            Payload::Ping(_) => Command::PING,
            Payload::Pong(_) => Command::PONG,
            Payload::Inv(_) => Command::INV,
            Payload::GetData(_) => Command::GETDATA,
            Payload::Mempool => Command::MEMPOOL,
            Payload::Unknown { command, .. } => *command,
        }
    }

    /// Serialize the payload body (everything after the header).
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Payload::Verack | Payload::Mempool => Vec::new(),
            Payload::Ping(nonce) | Payload::Pong(nonce) => nonce.to_le_bytes().to_vec(),
            Payload::Inv(entries) | Payload::GetData(entries) => encode_inventory(entries),
            Payload::Unknown { bytes, .. } => bytes.clone(),
        }
    }
}

// -----------------------------------------------------------------------
// Built-in codecs
// -----------------------------------------------------------------------

fn encode_inventory(entries: &[InventoryVector]) -> Vec<u8> {
    let mut writer = ByteWriter::with_capacity(9 + entries.len() * 36);
    writer.write_varint(VarInt::from(entries.len()));
    for entry in entries {
        writer.write_u32_le(entry.inv_type);
        writer.write_bytes(entry.hash.as_bytes());
    }
    writer.into_bytes()
}

fn decode_inventory(bytes: &[u8]) -> Result<Vec<InventoryVector>, WireError> {
    let mut reader = ByteReader::new(bytes);
    let count = reader
        .read_varint()
        .map_err(|e| WireError::MalformedPayload(format!("inventory count: {}", e)))?;
    if count.value() > MAX_INV_ENTRIES {
        return Err(WireError::MalformedPayload(format!(
            "inventory of {} entries exceeds {}",
            count.value(),
            MAX_INV_ENTRIES
        )));
    }
    let mut entries = Vec::with_capacity(count.value() as usize);
    for _ in 0..count.value() {
        let inv_type = reader
            .read_u32_le()
            .map_err(|e| WireError::MalformedPayload(format!("inventory type: {}", e)))?;
        let hash_bytes = reader
            .read_bytes(32)
            .map_err(|e| WireError::MalformedPayload(format!("inventory hash: {}", e)))?;
        entries.push(InventoryVector {
            inv_type,
            hash: Hash::from_bytes(hash_bytes)
                .map_err(|e| WireError::MalformedPayload(e.to_string()))?,
        });
    }
    if reader.remaining() != 0 {
        return Err(WireError::MalformedPayload(format!(
            "trailing {} bytes after inventory",
            reader.remaining()
        )));
    }
    Ok(entries)
}

fn decode_nonce(bytes: &[u8]) -> Result<u64, WireError> {
    let mut reader = ByteReader::new(bytes);
    reader
        .read_u64_le()
        .map_err(|e| WireError::MalformedPayload(format!("nonce: {}", e)))
}

fn decode_verack(_bytes: &[u8]) -> Result<Payload, WireError> {
    Ok(Payload::Verack)
}

fn decode_ping(bytes: &[u8]) -> Result<Payload, WireError> {
    Ok(Payload::Ping(decode_nonce(bytes)?))
}

fn decode_pong(bytes: &[u8]) -> Result<Payload, WireError> {
    Ok(Payload::Pong(decode_nonce(bytes)?))
}

fn decode_inv(bytes: &[u8]) -> Result<Payload, WireError> {
    Ok(Payload::Inv(decode_inventory(bytes)?))
}

fn decode_getdata(bytes: &[u8]) -> Result<Payload, WireError> {
    Ok(Payload::GetData(decode_inventory(bytes)?))
}

fn decode_mempool(_bytes: &[u8]) -> Result<Payload, WireError> {
    Ok(Payload::Mempool)
}

// -----------------------------------------------------------------------
// Registry
// -----------------------------------------------------------------------

/// A payload decoder: raw body bytes to a typed payload.
pub type DecodeFn = fn(&[u8]) -> Result<Payload, WireError>;

/// Maps command tags to payload decoders.
///
/// Populated once — built-ins at construction, extensions via
/// `register` during startup — then treated as frozen: decoding only
/// performs lookups.
pub struct CodecRegistry {
    codecs: HashMap<[u8; 12], DecodeFn>,
}

impl CodecRegistry {
    /// A registry holding the built-in codecs.
    pub fn with_builtins() -> Self {
        let mut registry = CodecRegistry {
            codecs: HashMap::new(),
        };
        registry.register(Command::VERACK, decode_verack);
        registry.register(Command::PING, decode_ping);
        registry.register(Command::PONG, decode_pong);
        registry.register(Command::INV, decode_inv);
        registry.register(Command::GETDATA, decode_getdata);
        registry.register(Command::MEMPOOL, decode_mempool);
        registry
    }

    /// Register a decoder for a command, replacing any previous one.
    pub fn register(&mut self, command: Command, decode: DecodeFn) {
        self.codecs.insert(*command.as_bytes(), decode);
    }

    /// Look up the decoder for a command tag.
    pub fn lookup(&self, command: &Command) -> Option<DecodeFn> {
        self.codecs.get(command.as_bytes()).copied()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
