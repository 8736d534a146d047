//! Signature hash computation for transaction signing.
//!
//! Computes the digest a signer binds to when spending an input: the
//! double SHA-256 of the transaction as reshaped by the hash-type mask,
//! followed by the hash type itself. The reshaping is performed as a
//! serialization-time projection — the transaction seen by callers is
//! never mutated and no clone is materialized; the projection emits the
//! exact bytes the reshaped transaction would serialize to.

use btc_primitives::hash::sha256d;
use btc_primitives::util::{ByteWriter, VarInt};
use btc_script::opcodes::OP_CODESEPARATOR;
use btc_script::{OpPredicate, Script};

use crate::input::TransactionInput;
use crate::transaction::Transaction;

// -----------------------------------------------------------------------
// Sighash flag constants
// -----------------------------------------------------------------------

/// Sign all inputs and all outputs (the default).
pub const SIGHASH_ALL: u32 = 0x01;

/// Sign all inputs but no outputs.
pub const SIGHASH_NONE: u32 = 0x02;

/// Sign all inputs and only the output at the signed input's index.
pub const SIGHASH_SINGLE: u32 = 0x03;

/// Combined with a base type: commit only to the signed input, allowing
/// other inputs to be added later.
pub const SIGHASH_ANYONECANPAY: u32 = 0x80;

/// Mask applied to extract the base hash type from the low five bits.
pub const SIGHASH_MASK: u32 = 0x1f;

// -----------------------------------------------------------------------
// Signature hash
// -----------------------------------------------------------------------

/// Compute the signature hash for a given input.
///
/// Out-of-range indices return the sentinel digest `uint256(1)` rather
/// than an error: that value is what historic implementations signed
/// and verified against, and consensus depends on it. Any base type
/// outside NONE and SINGLE — including zero and the unassigned values
/// 4..=31 — behaves as ALL.
///
/// # Arguments
/// * `tx`           - The transaction being signed.
/// * `input_index`  - Index of the input being signed.
/// * `subscript`    - The script being satisfied (scriptCode), typically
///   the previous output's locking script.
/// * `sighash_type` - The combined hash-type flags.
///
/// # Returns
/// A 32-byte double-SHA256 digest.
pub fn signature_hash(
    tx: &Transaction,
    input_index: usize,
    subscript: &Script,
    sighash_type: u32,
) -> [u8; 32] {
    if input_index >= tx.inputs.len() {
        return one_hash();
    }
    let base_type = sighash_type & SIGHASH_MASK;
    if base_type == SIGHASH_SINGLE && input_index >= tx.outputs.len() {
        return one_hash();
    }

    // Signatures never commit to code separators.
    let (subscript, _) = subscript.find_and_delete(&OpPredicate::opcode(OP_CODESEPARATOR));

    let preimage = build_preimage(tx, input_index, &subscript, sighash_type);
    sha256d(&preimage)
}

/// The sentinel digest `uint256(1)`: one followed by 31 zero bytes.
fn one_hash() -> [u8; 32] {
    let mut hash = [0u8; 32];
    hash[0] = 1;
    hash
}

/// Serialize the reshaped transaction followed by the hash type.
///
/// The projection applies, in order: script replacement (every input's
/// script emptied except the signed one, which carries the stripped
/// subscript), base-type output and sequence mutations, and the
/// ANYONECANPAY input collapse.
fn build_preimage(
    tx: &Transaction,
    input_index: usize,
    subscript: &Script,
    sighash_type: u32,
) -> Vec<u8> {
    let base_type = sighash_type & SIGHASH_MASK;
    let anyone_can_pay = sighash_type & SIGHASH_ANYONECANPAY != 0;

    let mut writer = ByteWriter::with_capacity(256);
    writer.write_u32_le(tx.version);

    // Inputs.
    if anyone_can_pay {
        writer.write_varint(VarInt(1));
        let input = &tx.inputs[input_index];
        write_input(&mut writer, input, Some(subscript), input.sequence);
    } else {
        writer.write_varint(VarInt::from(tx.inputs.len()));
        for (j, input) in tx.inputs.iter().enumerate() {
            let script = if j == input_index { Some(subscript) } else { None };
            let sequence = if j != input_index
                && (base_type == SIGHASH_NONE || base_type == SIGHASH_SINGLE)
            {
                0
            } else {
                input.sequence
            };
            write_input(&mut writer, input, script, sequence);
        }
    }

    // Outputs.
    if base_type == SIGHASH_NONE {
        writer.write_varint(VarInt(0));
    } else if base_type == SIGHASH_SINGLE {
        // Truncate to the signed index; earlier outputs become the
        // (-1, empty) sentinel.
        writer.write_varint(VarInt::from(input_index + 1));
        for _ in 0..input_index {
            writer.write_i64_le(-1);
            writer.write_varint(VarInt(0));
        }
        tx.outputs[input_index].write_to(&mut writer);
    } else {
        writer.write_varint(VarInt::from(tx.outputs.len()));
        for output in &tx.outputs {
            output.write_to(&mut writer);
        }
    }

    writer.write_u32_le(tx.lock_time);
    writer.write_u32_le(sighash_type);
    writer.into_bytes()
}

/// Write one input with its script field overridden: `Some` carries the
/// subscript, `None` an empty script.
fn write_input(
    writer: &mut ByteWriter,
    input: &TransactionInput,
    script: Option<&Script>,
    sequence: u32,
) {
    writer.write_bytes(&input.prev_txid);
    writer.write_u32_le(input.prev_vout);
    match script {
        Some(s) => {
            writer.write_varint(VarInt::from(s.len()));
            writer.write_bytes(s.to_bytes());
        }
        None => writer.write_varint(VarInt(0)),
    }
    writer.write_u32_le(sequence);
}
