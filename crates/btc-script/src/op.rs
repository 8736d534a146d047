//! Script operation model and stream reader.
//!
//! A script decodes into an ordered sequence of operations: data pushes
//! (which remember the wire form they were encoded with, so re-encoding
//! is byte-exact), small-integer pushes, plain opcodes, and an `Invalid`
//! marker where a push length is truncated or overruns the buffer.

use crate::opcodes::*;

/// A single decoded script operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptOp {
    /// A data push. `op` is the opcode byte actually used on the wire:
    /// the length itself for direct pushes (0x01..=0x4b), or one of
    /// OP_PUSHDATA1/2/4.
    Push {
        /// The wire opcode byte of this push.
        op: u8,
        /// The pushed bytes.
        data: Vec<u8>,
    },
    /// OP_0 (empty push) or OP_1..OP_16, holding the value 0..=16.
    Small(u8),
    /// Any other single-byte opcode.
    Code(u8),
    /// A malformed or truncated push; decoding stops here.
    Invalid,
}

impl ScriptOp {
    /// The opcode byte this operation occupies on the wire.
    ///
    /// `Invalid` has no well-defined byte and reports OP_INVALIDOPCODE.
    pub fn opcode_byte(&self) -> u8 {
        match self {
            ScriptOp::Push { op, .. } => *op,
            ScriptOp::Small(n) => small_int_op(*n),
            ScriptOp::Code(c) => *c,
            ScriptOp::Invalid => OP_INVALIDOPCODE,
        }
    }

    /// Return true if this operation pushes data onto the stack
    /// (including small integers and OP_1NEGATE).
    pub fn is_push(&self) -> bool {
        match self {
            ScriptOp::Push { .. } | ScriptOp::Small(_) => true,
            ScriptOp::Code(c) => *c == OP_1NEGATE,
            ScriptOp::Invalid => false,
        }
    }

    /// The bytes this operation pushes, if it is a push.
    ///
    /// OP_0 yields an empty vector, OP_1..OP_16 a single byte, and
    /// OP_1NEGATE the byte 0x81.
    pub fn pushed_bytes(&self) -> Option<Vec<u8>> {
        match self {
            ScriptOp::Push { data, .. } => Some(data.clone()),
            ScriptOp::Small(0) => Some(Vec::new()),
            ScriptOp::Small(n) => Some(vec![*n]),
            ScriptOp::Code(c) if *c == OP_1NEGATE => Some(vec![0x81]),
            _ => None,
        }
    }

    /// Return true if this push uses the shortest possible wire form.
    ///
    /// Non-push operations are trivially canonical; `Invalid` is not.
    pub fn is_canonical_push(&self) -> bool {
        match self {
            ScriptOp::Push { op, data } => {
                let len = data.len();
                if *op >= OP_DATA_1 && *op <= OP_DATA_75 {
                    // A single byte 1..=16 belongs in OP_n form, and
                    // 0x81 in OP_1NEGATE form; a lone zero byte has no
                    // shorter spelling (OP_0 pushes the empty array).
                    !(len == 1 && ((data[0] >= 1 && data[0] <= 16) || data[0] == 0x81))
                } else if *op == OP_PUSHDATA1 {
                    len > OP_DATA_75 as usize
                } else if *op == OP_PUSHDATA2 {
                    len > 0xff
                } else {
                    len > 0xffff
                }
            }
            ScriptOp::Small(_) | ScriptOp::Code(_) => true,
            ScriptOp::Invalid => false,
        }
    }

    /// Re-encode this operation into wire bytes.
    ///
    /// `Invalid` encodes to nothing; callers that need byte fidelity for
    /// malformed tails keep the original buffer instead.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            ScriptOp::Push { op, data } => {
                let mut out = vec![*op];
                match *op {
                    OP_PUSHDATA1 => out.push(data.len() as u8),
                    OP_PUSHDATA2 => out.extend_from_slice(&(data.len() as u16).to_le_bytes()),
                    OP_PUSHDATA4 => out.extend_from_slice(&(data.len() as u32).to_le_bytes()),
                    _ => {}
                }
                out.extend_from_slice(data);
                out
            }
            ScriptOp::Small(n) => vec![small_int_op(*n)],
            ScriptOp::Code(c) => vec![*c],
            ScriptOp::Invalid => Vec::new(),
        }
    }
}

/// Select the canonical (minimal) push operation for a data payload.
///
/// Empty data becomes OP_0; a single byte 1..=16 becomes OP_1..OP_16; the
/// single byte 0x81 becomes OP_1NEGATE; otherwise the shortest of the
/// direct, PUSHDATA1, PUSHDATA2, or PUSHDATA4 forms.
pub fn push_for(data: &[u8]) -> ScriptOp {
    if data.is_empty() {
        return ScriptOp::Small(0);
    }
    if data.len() == 1 {
        if data[0] >= 1 && data[0] <= 16 {
            return ScriptOp::Small(data[0]);
        }
        if data[0] == 0x81 {
            return ScriptOp::Code(OP_1NEGATE);
        }
    }
    let op = if data.len() <= OP_DATA_75 as usize {
        data.len() as u8
    } else if data.len() <= 0xff {
        OP_PUSHDATA1
    } else if data.len() <= 0xffff {
        OP_PUSHDATA2
    } else {
        OP_PUSHDATA4
    };
    ScriptOp::Push {
        op,
        data: data.to_vec(),
    }
}

/// A cursor that stream-decodes script bytes into operations.
///
/// The reader consumes the minimum bytes required for each operation.
/// A truncated push-length prefix or short push body yields
/// `ScriptOp::Invalid` and leaves the cursor at the end of the buffer,
/// so decoding over a fixed buffer is deterministic and terminates.
pub struct ScriptReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ScriptReader<'a> {
    /// Create a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        ScriptReader { data, pos: 0 }
    }

    /// The current byte offset of the cursor.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Decode the next operation, or `None` at the end of the buffer.
    pub fn read_next(&mut self) -> Option<ScriptOp> {
        if self.pos >= self.data.len() {
            return None;
        }
        let op = self.data[self.pos];
        match op {
            OP_0 => {
                self.pos += 1;
                Some(ScriptOp::Small(0))
            }
            _ if op >= OP_DATA_1 && op <= OP_DATA_75 => self.read_push(op, 0, op as usize),
            OP_PUSHDATA1 => {
                if self.pos + 2 > self.data.len() {
                    return Some(self.fail());
                }
                let len = self.data[self.pos + 1] as usize;
                self.read_push(op, 1, len)
            }
            OP_PUSHDATA2 => {
                if self.pos + 3 > self.data.len() {
                    return Some(self.fail());
                }
                let len =
                    u16::from_le_bytes([self.data[self.pos + 1], self.data[self.pos + 2]]) as usize;
                self.read_push(op, 2, len)
            }
            OP_PUSHDATA4 => {
                if self.pos + 5 > self.data.len() {
                    return Some(self.fail());
                }
                let len = u32::from_le_bytes([
                    self.data[self.pos + 1],
                    self.data[self.pos + 2],
                    self.data[self.pos + 3],
                    self.data[self.pos + 4],
                ]) as usize;
                self.read_push(op, 4, len)
            }
            _ if op >= OP_1 && op <= OP_16 => {
                self.pos += 1;
                Some(ScriptOp::Small(op - OP_1 + 1))
            }
            _ => {
                self.pos += 1;
                Some(ScriptOp::Code(op))
            }
        }
    }

    /// Consume a push body of `len` bytes after a `prefix`-byte length
    /// field, or fail if the buffer is short.
    fn read_push(&mut self, op: u8, prefix: usize, len: usize) -> Option<ScriptOp> {
        let body = self.pos + 1 + prefix;
        if body > self.data.len() || len > self.data.len() - body {
            return Some(self.fail());
        }
        let data = self.data[body..body + len].to_vec();
        self.pos = body + len;
        Some(ScriptOp::Push { op, data })
    }

    /// Emit `Invalid` and park the cursor past the remaining bytes.
    fn fail(&mut self) -> ScriptOp {
        self.pos = self.data.len();
        ScriptOp::Invalid
    }
}
