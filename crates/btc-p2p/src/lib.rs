//! Bitcoin SDK - Peer-to-peer message framing and payload dispatch.
//!
//! Implements the wire envelope of the peer-to-peer protocol: framing
//! (network magic, 12-byte command, length, checksum), stream decoding
//! with cancellation, and demultiplexing of command tags to typed
//! payloads through a codec registry.

pub mod command;
pub mod payload;
pub mod message;

mod error;
pub use command::Command;
pub use error::WireError;
pub use message::{CancelToken, DecoderConfig, Message, MessageDecoder, write_message};
pub use payload::{CodecRegistry, InventoryVector, Payload};

/// Largest payload a peer may frame: 32 MiB.
pub const MAX_PAYLOAD_SIZE: u32 = 0x0200_0000;

/// Protocol version from which the header carries a payload checksum.
pub const CHECKSUM_VERSION: u32 = 60002;

/// The protocol version this library advertises.
pub const PROTOCOL_VERSION: u32 = 70001;

/// The network a connection speaks, carrying its wire magic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Network {
    /// The production network.
    Mainnet,
    /// The public test network.
    Testnet,
    /// Local regression-test mode.
    Regtest,
}

impl Network {
    /// The 4-byte magic prefixing every message on this network,
    /// as a little-endian u32 (mainnet serializes as f9 be b4 d9).
    pub fn magic(&self) -> u32 {
        match self {
            Network::Mainnet => 0xD9B4_BEF9,
            Network::Testnet => 0x0709_110B,
            Network::Regtest => 0xDAB5_BFFA,
        }
    }
}
