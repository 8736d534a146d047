//! Transaction input referencing a previous output.

use btc_primitives::util::{ByteReader, ByteWriter, VarInt};
use btc_script::Script;

use crate::TransactionError;

/// Default sequence number indicating a finalized input.
pub const DEFAULT_SEQUENCE: u32 = 0xFFFF_FFFF;

/// A single transaction input.
///
/// Each input references an output of a previous transaction by txid
/// and output index, and carries the spending script and sequence
/// number.
///
/// # Wire format
///
/// | Field         | Size          |
/// |---------------|---------------|
/// | prev_txid     | 32 bytes      |
/// | prev_vout     | 4 bytes (LE)  |
/// | script length | VarInt        |
/// | script_sig    | variable      |
/// | sequence      | 4 bytes (LE)  |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionInput {
    /// The 32-byte txid of the output being spent, internal byte order.
    pub prev_txid: [u8; 32],

    /// Index of the output within the previous transaction.
    pub prev_vout: u32,

    /// The spending script (scriptSig). Empty when unsigned.
    pub script_sig: Script,

    /// Sequence number. Defaults to `0xFFFFFFFF` (finalized).
    pub sequence: u32,
}

impl TransactionInput {
    /// Create an input with a zeroed outpoint, empty script, and
    /// finalized sequence.
    pub fn new() -> Self {
        TransactionInput {
            prev_txid: [0u8; 32],
            prev_vout: 0,
            script_sig: Script::new(),
            sequence: DEFAULT_SEQUENCE,
        }
    }

    /// Deserialize an input from a `ByteReader`.
    ///
    /// # Arguments
    /// * `reader` - The reader positioned at the start of an encoded input.
    ///
    /// # Returns
    /// `Ok(TransactionInput)` on success, or an error if the data is
    /// truncated.
    pub fn read_from(reader: &mut ByteReader) -> Result<Self, TransactionError> {
        let txid_bytes = reader.read_bytes(32).map_err(|e| {
            TransactionError::SerializationError(format!("reading prev txid: {}", e))
        })?;
        let mut prev_txid = [0u8; 32];
        prev_txid.copy_from_slice(txid_bytes);

        let prev_vout = reader.read_u32_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading prev vout: {}", e))
        })?;

        let script_len = reader.read_varint().map_err(|e| {
            TransactionError::SerializationError(format!("reading script length: {}", e))
        })?;
        let script_bytes = reader.read_bytes(script_len.value() as usize).map_err(|e| {
            TransactionError::SerializationError(format!("reading script_sig: {}", e))
        })?;

        let sequence = reader.read_u32_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading sequence: {}", e))
        })?;

        Ok(TransactionInput {
            prev_txid,
            prev_vout,
            script_sig: Script::from_bytes(script_bytes),
            sequence,
        })
    }

    /// Serialize this input into a `ByteWriter`.
    pub fn write_to(&self, writer: &mut ByteWriter) {
        writer.write_bytes(&self.prev_txid);
        writer.write_u32_le(self.prev_vout);
        let script_bytes = self.script_sig.to_bytes();
        writer.write_varint(VarInt::from(script_bytes.len()));
        writer.write_bytes(script_bytes);
        writer.write_u32_le(self.sequence);
    }
}

impl Default for TransactionInput {
    fn default() -> Self {
        Self::new()
    }
}
