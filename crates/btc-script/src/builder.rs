//! Incremental script construction.
//!
//! `ScriptBuilder` appends operations, canonical data pushes, small
//! integers, or raw bytes, and materializes into a `Script` buffer.

use crate::op::{push_for, ScriptOp};
use crate::opcodes::*;
use crate::Script;

/// Builds a script by appending operations and data.
#[derive(Default)]
pub struct ScriptBuilder {
    bytes: Vec<u8>,
}

impl ScriptBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        ScriptBuilder { bytes: Vec::new() }
    }

    /// Append a single opcode byte.
    ///
    /// Push-length opcodes are appended verbatim; use `push_data` to
    /// emit a well-formed push.
    pub fn op(mut self, opcode: u8) -> Self {
        self.bytes.push(opcode);
        self
    }

    /// Append the canonical push of `data`.
    pub fn push_data(mut self, data: &[u8]) -> Self {
        self.bytes.extend_from_slice(&push_for(data).to_bytes());
        self
    }

    /// Append a small integer 0..=16 as OP_0/OP_1..OP_16.
    pub fn small_int(mut self, n: u8) -> Self {
        self.bytes.push(small_int_op(n));
        self
    }

    /// Append an already-encoded operation.
    pub fn push_op(mut self, op: &ScriptOp) -> Self {
        self.bytes.extend_from_slice(&op.to_bytes());
        self
    }

    /// Append raw bytes without any push framing.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Materialize the accumulated bytes into a `Script`.
    pub fn into_script(self) -> Script {
        Script::from_vec(self.bytes)
    }
}
