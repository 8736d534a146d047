//! The Bitcoin `Script` type.
//!
//! Scripts are opaque byte buffers constructed from raw bytes, an
//! operation sequence, a hex string, or ASM text. Equality is byte
//! equality. Beyond construction the type offers the consensus-facing
//! analyses: validity, push-only and canonical-push checks, signature
//! operation counting, and find-and-delete.

use std::fmt;

use crate::op::{push_for, ScriptOp, ScriptReader};
use crate::opcodes::*;
use crate::ScriptError;

/// Signature operations charged for an unsized CHECKMULTISIG.
pub const MAX_PUBKEYS_PER_MULTISIG: usize = 20;

/// A Bitcoin script, represented as a byte vector newtype.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Script(Vec<u8>);

impl Script {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// Create a new empty script.
    pub fn new() -> Self {
        Script(Vec::new())
    }

    /// Create a script from raw bytes (copied).
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Script(bytes.to_vec())
    }

    /// Create a script by adopting a byte vector without copying.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Script(bytes)
    }

    /// Create a script by encoding an operation sequence contiguously.
    pub fn from_ops(ops: &[ScriptOp]) -> Self {
        let mut bytes = Vec::new();
        for op in ops {
            bytes.extend_from_slice(&op.to_bytes());
        }
        Script(bytes)
    }

    /// Create a script from a hex-encoded string.
    ///
    /// # Arguments
    /// * `hex_str` - A hex string (e.g. "76a914...88ac").
    ///
    /// # Returns
    /// A `Script` wrapping the decoded bytes, or an error if the hex is
    /// invalid.
    pub fn from_hex(hex_str: &str) -> Result<Self, ScriptError> {
        let bytes =
            hex::decode(hex_str).map_err(|e| ScriptError::InvalidHex(e.to_string()))?;
        Ok(Script(bytes))
    }

    /// Create a script from its ASM (assembly text) form.
    ///
    /// Tokens are whitespace-separated: known OP_xxx names append their
    /// opcode byte, any other token is parsed as hex data and appended
    /// as a canonical push. The parser is the inverse of `to_asm` for
    /// scripts whose pushes are canonically encoded.
    ///
    /// # Arguments
    /// * `asm` - The whitespace-separated token string.
    ///
    /// # Returns
    /// A `Script`, or an error if any token is neither an opcode name
    /// nor valid hex.
    pub fn from_asm(asm: &str) -> Result<Self, ScriptError> {
        let mut bytes = Vec::new();
        for token in asm.split_whitespace() {
            match string_to_opcode(token) {
                // Push-length opcodes cannot stand alone in ASM.
                Some(op) if op >= OP_PUSHDATA1 && op <= OP_PUSHDATA4 => {
                    return Err(ScriptError::UnknownToken(token.to_string()));
                }
                Some(op) => bytes.push(op),
                None => {
                    let data = hex::decode(token)
                        .map_err(|_| ScriptError::UnknownToken(token.to_string()))?;
                    bytes.extend_from_slice(&push_for(&data).to_bytes());
                }
            }
        }
        Ok(Script(bytes))
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Return a reference to the underlying bytes.
    pub fn to_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Encode the script as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Return the length of the script in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the script is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convert the script to its ASM representation.
    ///
    /// Opcodes appear by name, pushes as hex of their data. A script
    /// that does not parse cleanly renders as an empty string.
    pub fn to_asm(&self) -> String {
        let mut parts = Vec::new();
        for op in self.ops() {
            match op {
                ScriptOp::Push { data, .. } => {
                    if !data.is_empty() {
                        parts.push(hex::encode(&data));
                    }
                }
                ScriptOp::Small(n) => parts.push(opcode_to_string(small_int_op(n)).to_string()),
                ScriptOp::Code(c) => parts.push(opcode_to_string(c).to_string()),
                ScriptOp::Invalid => return String::new(),
            }
        }
        parts.join(" ")
    }

    /// Parse the script into its full operation sequence.
    ///
    /// A malformed script yields its valid prefix followed by a single
    /// trailing `Invalid`.
    pub fn ops(&self) -> Vec<ScriptOp> {
        let mut reader = ScriptReader::new(&self.0);
        let mut ops = Vec::new();
        while let Some(op) = reader.read_next() {
            ops.push(op);
        }
        ops
    }

    // -----------------------------------------------------------------------
    // Analyses
    // -----------------------------------------------------------------------

    /// Check that every operation decodes cleanly (no truncated push).
    pub fn is_valid(&self) -> bool {
        !self.ops().contains(&ScriptOp::Invalid)
    }

    /// Check that the script consists solely of push operations
    /// (anything up to and including OP_16 counts as a push).
    pub fn is_push_only(&self) -> bool {
        self.ops().iter().all(|op| match op {
            ScriptOp::Invalid => false,
            _ => op.opcode_byte() <= OP_16,
        })
    }

    /// Check that every push uses its shortest possible encoding and no
    /// single byte with an opcode form (1..=16, 0x81) was pushed in
    /// direct form.
    pub fn has_canonical_pushes(&self) -> bool {
        self.ops().iter().all(|op| op.is_canonical_push())
    }

    /// Count signature operations in this script.
    ///
    /// CHECKSIG and CHECKSIGVERIFY count 1. CHECKMULTISIG and
    /// CHECKMULTISIGVERIFY count 20, unless `accurate` is set and the
    /// preceding opcode is OP_1..OP_16, in which case they count that
    /// value. Counting stops at a malformed push.
    pub fn sig_op_count(&self, accurate: bool) -> usize {
        let mut count = 0;
        let mut prev: Option<ScriptOp> = None;
        let mut reader = ScriptReader::new(&self.0);
        while let Some(op) = reader.read_next() {
            match op {
                ScriptOp::Code(c) if c == OP_CHECKSIG || c == OP_CHECKSIGVERIFY => {
                    count += 1;
                }
                ScriptOp::Code(c) if c == OP_CHECKMULTISIG || c == OP_CHECKMULTISIGVERIFY => {
                    count += match prev {
                        Some(ScriptOp::Small(n)) if accurate && n >= 1 => n as usize,
                        _ => MAX_PUBKEYS_PER_MULTISIG,
                    };
                }
                ScriptOp::Invalid => break,
                _ => {}
            }
            prev = Some(op);
        }
        count
    }

    /// Count signature operations for a pay-to-script-hash spend.
    ///
    /// The count comes from the redeem script — the last element pushed
    /// by `script_sig` — re-parsed and counted in accurate mode, and
    /// only when `script_sig` is push-only. Anything else counts 0.
    ///
    /// # Arguments
    /// * `script_sig` - The spending script of the P2SH input.
    pub fn p2sh_sig_op_count(script_sig: &Script) -> usize {
        if !script_sig.is_push_only() {
            return 0;
        }
        let mut last_push: Option<Vec<u8>> = None;
        for op in script_sig.ops() {
            if let Some(data) = op.pushed_bytes() {
                last_push = Some(data);
            }
        }
        match last_push {
            Some(redeem) if !redeem.is_empty() => {
                Script::from_vec(redeem).sig_op_count(true)
            }
            _ => 0,
        }
    }

    // -----------------------------------------------------------------------
    // Find-and-delete
    // -----------------------------------------------------------------------

    /// Rebuild the script omitting every operation the predicate matches.
    ///
    /// Operations that survive keep their original wire encoding and
    /// order. When nothing matches, the original buffer is preserved.
    /// A malformed tail is carried over verbatim and never matched.
    ///
    /// # Arguments
    /// * `pred` - The operation predicate to delete by.
    ///
    /// # Returns
    /// The rebuilt script and the number of deleted operations.
    pub fn find_and_delete(&self, pred: &OpPredicate) -> (Script, usize) {
        let mut out = Vec::with_capacity(self.0.len());
        let mut count = 0;
        let mut reader = ScriptReader::new(&self.0);
        loop {
            let start = reader.position();
            let op = match reader.read_next() {
                Some(op) => op,
                None => break,
            };
            if op == ScriptOp::Invalid {
                out.extend_from_slice(&self.0[start..]);
                break;
            }
            if pred.matches(&op) {
                count += 1;
            } else {
                out.extend_from_slice(&self.0[start..reader.position()]);
            }
        }
        if count == 0 {
            (self.clone(), 0)
        } else {
            (Script(out), count)
        }
    }
}

/// A predicate over script operations, used by find-and-delete.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OpPredicate {
    /// Match any operation with the given wire opcode byte.
    Opcode(u8),
    /// Match an operation with the given opcode byte pushing exactly
    /// the given data.
    OpcodeData(u8, Vec<u8>),
    /// Match the canonical push of the given data, whatever bytes it
    /// was spelled with.
    Pushed(Vec<u8>),
}

impl OpPredicate {
    /// Predicate matching every occurrence of an opcode.
    pub fn opcode(op: u8) -> Self {
        OpPredicate::Opcode(op)
    }

    /// Predicate matching an opcode pushing exact data.
    pub fn opcode_data(op: u8, data: &[u8]) -> Self {
        OpPredicate::OpcodeData(op, data.to_vec())
    }

    /// Predicate matching the canonical push of `data`.
    pub fn pushed(data: &[u8]) -> Self {
        OpPredicate::Pushed(data.to_vec())
    }

    /// Test an operation against this predicate.
    pub fn matches(&self, op: &ScriptOp) -> bool {
        if *op == ScriptOp::Invalid {
            return false;
        }
        match self {
            OpPredicate::Opcode(c) => op.opcode_byte() == *c,
            OpPredicate::OpcodeData(c, data) => {
                op.opcode_byte() == *c && op.pushed_bytes().as_deref() == Some(&data[..])
            }
            OpPredicate::Pushed(data) => *op == push_for(data),
        }
    }
}

impl fmt::Display for Script {
    /// Display the script as a lowercase hex string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", self.to_hex())
    }
}

impl serde::Serialize for Script {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Script {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Script::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
