//! Transaction output with value and locking script.

use btc_primitives::util::{ByteReader, ByteWriter, VarInt};
use btc_script::Script;

use crate::TransactionError;

/// A single transaction output.
///
/// The value is signed: consensus outputs are non-negative, but the
/// SIGHASH_SINGLE digest replaces earlier outputs with a `-1` sentinel
/// that must be representable and serializable.
///
/// # Wire format
///
/// | Field         | Size          |
/// |---------------|---------------|
/// | value         | 8 bytes (LE)  |
/// | script length | VarInt        |
/// | script_pubkey | variable      |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionOutput {
    /// The output value in satoshis.
    pub value: i64,

    /// The locking script (scriptPubKey) defining spending conditions.
    pub script_pubkey: Script,
}

impl TransactionOutput {
    /// Create an output with zero value and an empty script.
    pub fn new() -> Self {
        TransactionOutput {
            value: 0,
            script_pubkey: Script::new(),
        }
    }

    /// The sentinel output used in SIGHASH_SINGLE digests for indices
    /// before the signed input: value -1, empty script.
    pub fn sentinel() -> Self {
        TransactionOutput {
            value: -1,
            script_pubkey: Script::new(),
        }
    }

    /// Deserialize an output from a `ByteReader`.
    ///
    /// # Returns
    /// `Ok(TransactionOutput)` on success, or an error if the data is
    /// truncated.
    pub fn read_from(reader: &mut ByteReader) -> Result<Self, TransactionError> {
        let value = reader.read_i64_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading value: {}", e))
        })?;

        let script_len = reader.read_varint().map_err(|e| {
            TransactionError::SerializationError(format!("reading script length: {}", e))
        })?;
        let script_bytes = reader.read_bytes(script_len.value() as usize).map_err(|e| {
            TransactionError::SerializationError(format!("reading script_pubkey: {}", e))
        })?;

        Ok(TransactionOutput {
            value,
            script_pubkey: Script::from_bytes(script_bytes),
        })
    }

    /// Serialize this output into a `ByteWriter`.
    pub fn write_to(&self, writer: &mut ByteWriter) {
        writer.write_i64_le(self.value);
        let script_bytes = self.script_pubkey.to_bytes();
        writer.write_varint(VarInt::from(script_bytes.len()));
        writer.write_bytes(script_bytes);
    }
}

impl Default for TransactionOutput {
    fn default() -> Self {
        Self::new()
    }
}
