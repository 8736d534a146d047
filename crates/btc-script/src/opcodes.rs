//! Bitcoin script opcode constants and name tables.
//!
//! One constant per single-byte opcode, the name lookup used for ASM
//! output, and the reverse lookup used for ASM parsing.

// -----------------------------------------------------------------------
// Push opcodes
// -----------------------------------------------------------------------

/// Push an empty array onto the stack.
pub const OP_0: u8 = 0x00;
/// Alias for OP_0.
pub const OP_FALSE: u8 = 0x00;
/// First direct data push (1 byte follows).
pub const OP_DATA_1: u8 = 0x01;
/// Direct push of 20 bytes, the size of a Hash160.
pub const OP_DATA_20: u8 = 0x14;
/// Direct push of 32 bytes, the size of a SHA-256 digest.
pub const OP_DATA_32: u8 = 0x20;
/// Last direct data push (75 bytes follow).
pub const OP_DATA_75: u8 = 0x4b;
/// The next byte holds the push length.
pub const OP_PUSHDATA1: u8 = 0x4c;
/// The next two bytes (LE) hold the push length.
pub const OP_PUSHDATA2: u8 = 0x4d;
/// The next four bytes (LE) hold the push length.
pub const OP_PUSHDATA4: u8 = 0x4e;
/// Push the number -1 onto the stack.
pub const OP_1NEGATE: u8 = 0x4f;
/// Reserved; fails the script if executed.
pub const OP_RESERVED: u8 = 0x50;
/// Push the number 1 onto the stack.
pub const OP_1: u8 = 0x51;
/// Alias for OP_1.
pub const OP_TRUE: u8 = 0x51;
/// Push the number 2 onto the stack.
pub const OP_2: u8 = 0x52;
/// Push the number 3 onto the stack.
pub const OP_3: u8 = 0x53;
/// Push the number 4 onto the stack.
pub const OP_4: u8 = 0x54;
/// Push the number 5 onto the stack.
pub const OP_5: u8 = 0x55;
/// Push the number 6 onto the stack.
pub const OP_6: u8 = 0x56;
/// Push the number 7 onto the stack.
pub const OP_7: u8 = 0x57;
/// Push the number 8 onto the stack.
pub const OP_8: u8 = 0x58;
/// Push the number 9 onto the stack.
pub const OP_9: u8 = 0x59;
/// Push the number 10 onto the stack.
pub const OP_10: u8 = 0x5a;
/// Push the number 11 onto the stack.
pub const OP_11: u8 = 0x5b;
/// Push the number 12 onto the stack.
pub const OP_12: u8 = 0x5c;
/// Push the number 13 onto the stack.
pub const OP_13: u8 = 0x5d;
/// Push the number 14 onto the stack.
pub const OP_14: u8 = 0x5e;
/// Push the number 15 onto the stack.
pub const OP_15: u8 = 0x5f;
/// Push the number 16 onto the stack.
pub const OP_16: u8 = 0x60;

// -----------------------------------------------------------------------
// Flow control
// -----------------------------------------------------------------------

/// Does nothing.
pub const OP_NOP: u8 = 0x61;
/// Reserved; fails the script if executed.
pub const OP_VER: u8 = 0x62;
/// Execute the following statements if the top stack value is truthy.
pub const OP_IF: u8 = 0x63;
/// Execute the following statements if the top stack value is falsy.
pub const OP_NOTIF: u8 = 0x64;
/// Always invalid, even inside an unexecuted branch.
pub const OP_VERIF: u8 = 0x65;
/// Always invalid, even inside an unexecuted branch.
pub const OP_VERNOTIF: u8 = 0x66;
/// Execute if the preceding OP_IF/OP_NOTIF branch did not.
pub const OP_ELSE: u8 = 0x67;
/// End an OP_IF/OP_NOTIF block.
pub const OP_ENDIF: u8 = 0x68;
/// Fail the script unless the top stack value is truthy.
pub const OP_VERIFY: u8 = 0x69;
/// Mark the output as unspendable.
pub const OP_RETURN: u8 = 0x6a;

// -----------------------------------------------------------------------
// Stack
// -----------------------------------------------------------------------

/// Move the top item to the alt stack.
pub const OP_TOALTSTACK: u8 = 0x6b;
/// Move the top alt-stack item back to the stack.
pub const OP_FROMALTSTACK: u8 = 0x6c;
/// Drop the top two items.
pub const OP_2DROP: u8 = 0x6d;
/// Duplicate the top two items.
pub const OP_2DUP: u8 = 0x6e;
/// Duplicate the top three items.
pub const OP_3DUP: u8 = 0x6f;
/// Copy the pair of items two spaces back to the front.
pub const OP_2OVER: u8 = 0x70;
/// Move the fifth and sixth items to the top.
pub const OP_2ROT: u8 = 0x71;
/// Swap the top two pairs of items.
pub const OP_2SWAP: u8 = 0x72;
/// Duplicate the top item if it is truthy.
pub const OP_IFDUP: u8 = 0x73;
/// Push the stack depth.
pub const OP_DEPTH: u8 = 0x74;
/// Drop the top item.
pub const OP_DROP: u8 = 0x75;
/// Duplicate the top item.
pub const OP_DUP: u8 = 0x76;
/// Remove the second item.
pub const OP_NIP: u8 = 0x77;
/// Copy the second item to the top.
pub const OP_OVER: u8 = 0x78;
/// Copy the nth item to the top.
pub const OP_PICK: u8 = 0x79;
/// Move the nth item to the top.
pub const OP_ROLL: u8 = 0x7a;
/// Rotate the top three items.
pub const OP_ROT: u8 = 0x7b;
/// Swap the top two items.
pub const OP_SWAP: u8 = 0x7c;
/// Copy the top item before the second item.
pub const OP_TUCK: u8 = 0x7d;

// -----------------------------------------------------------------------
// Splice
// -----------------------------------------------------------------------

/// Concatenate two strings (disabled).
pub const OP_CAT: u8 = 0x7e;
/// Return a section of a string (disabled).
pub const OP_SUBSTR: u8 = 0x7f;
/// Keep only characters left of a point (disabled).
pub const OP_LEFT: u8 = 0x80;
/// Keep only characters right of a point (disabled).
pub const OP_RIGHT: u8 = 0x81;
/// Push the length of the top item.
pub const OP_SIZE: u8 = 0x82;

// -----------------------------------------------------------------------
// Bitwise logic
// -----------------------------------------------------------------------

/// Flip all bits (disabled).
pub const OP_INVERT: u8 = 0x83;
/// Boolean AND of each bit (disabled).
pub const OP_AND: u8 = 0x84;
/// Boolean OR of each bit (disabled).
pub const OP_OR: u8 = 0x85;
/// Boolean XOR of each bit (disabled).
pub const OP_XOR: u8 = 0x86;
/// Push 1 if the top two items are exactly equal, 0 otherwise.
pub const OP_EQUAL: u8 = 0x87;
/// OP_EQUAL followed by OP_VERIFY.
pub const OP_EQUALVERIFY: u8 = 0x88;
/// Reserved; fails the script if executed.
pub const OP_RESERVED1: u8 = 0x89;
/// Reserved; fails the script if executed.
pub const OP_RESERVED2: u8 = 0x8a;

// -----------------------------------------------------------------------
// Arithmetic
// -----------------------------------------------------------------------

/// Add 1 to the top item.
pub const OP_1ADD: u8 = 0x8b;
/// Subtract 1 from the top item.
pub const OP_1SUB: u8 = 0x8c;
/// Multiply the top item by 2 (disabled).
pub const OP_2MUL: u8 = 0x8d;
/// Divide the top item by 2 (disabled).
pub const OP_2DIV: u8 = 0x8e;
/// Negate the top item.
pub const OP_NEGATE: u8 = 0x8f;
/// Absolute value of the top item.
pub const OP_ABS: u8 = 0x90;
/// Push 1 if the top item is 0, else 0.
pub const OP_NOT: u8 = 0x91;
/// Push 0 if the top item is 0, else 1.
pub const OP_0NOTEQUAL: u8 = 0x92;
/// Add the top two items.
pub const OP_ADD: u8 = 0x93;
/// Subtract the top item from the second.
pub const OP_SUB: u8 = 0x94;
/// Multiply the top two items (disabled).
pub const OP_MUL: u8 = 0x95;
/// Divide the second item by the top (disabled).
pub const OP_DIV: u8 = 0x96;
/// Remainder of dividing the second item by the top (disabled).
pub const OP_MOD: u8 = 0x97;
/// Left shift (disabled).
pub const OP_LSHIFT: u8 = 0x98;
/// Right shift (disabled).
pub const OP_RSHIFT: u8 = 0x99;
/// Push 1 if both inputs are non-zero.
pub const OP_BOOLAND: u8 = 0x9a;
/// Push 1 if either input is non-zero.
pub const OP_BOOLOR: u8 = 0x9b;
/// Push 1 if the numbers are equal.
pub const OP_NUMEQUAL: u8 = 0x9c;
/// OP_NUMEQUAL followed by OP_VERIFY.
pub const OP_NUMEQUALVERIFY: u8 = 0x9d;
/// Push 1 if the numbers are not equal.
pub const OP_NUMNOTEQUAL: u8 = 0x9e;
/// Push 1 if the second item is less than the top.
pub const OP_LESSTHAN: u8 = 0x9f;
/// Push 1 if the second item is greater than the top.
pub const OP_GREATERTHAN: u8 = 0xa0;
/// Push 1 if the second item is less than or equal to the top.
pub const OP_LESSTHANOREQUAL: u8 = 0xa1;
/// Push 1 if the second item is greater than or equal to the top.
pub const OP_GREATERTHANOREQUAL: u8 = 0xa2;
/// Push the smaller of the top two items.
pub const OP_MIN: u8 = 0xa3;
/// Push the larger of the top two items.
pub const OP_MAX: u8 = 0xa4;
/// Push 1 if x is within [min, max).
pub const OP_WITHIN: u8 = 0xa5;

// -----------------------------------------------------------------------
// Crypto
// -----------------------------------------------------------------------

/// RIPEMD-160 of the top item.
pub const OP_RIPEMD160: u8 = 0xa6;
/// SHA-1 of the top item.
pub const OP_SHA1: u8 = 0xa7;
/// SHA-256 of the top item.
pub const OP_SHA256: u8 = 0xa8;
/// RIPEMD-160 of the SHA-256 of the top item.
pub const OP_HASH160: u8 = 0xa9;
/// Double SHA-256 of the top item.
pub const OP_HASH256: u8 = 0xaa;
/// Signature-hash boundary marker; signatures only commit to the script
/// after the most recently executed separator.
pub const OP_CODESEPARATOR: u8 = 0xab;
/// Verify a signature against a public key and the transaction digest.
pub const OP_CHECKSIG: u8 = 0xac;
/// OP_CHECKSIG followed by OP_VERIFY.
pub const OP_CHECKSIGVERIFY: u8 = 0xad;
/// Verify m-of-n signatures.
pub const OP_CHECKMULTISIG: u8 = 0xae;
/// OP_CHECKMULTISIG followed by OP_VERIFY.
pub const OP_CHECKMULTISIGVERIFY: u8 = 0xaf;

// -----------------------------------------------------------------------
// Expansion
// -----------------------------------------------------------------------

/// Reserved no-op.
pub const OP_NOP1: u8 = 0xb0;
/// Reserved no-op (OP_CHECKLOCKTIMEVERIFY upgrade slot).
pub const OP_NOP2: u8 = 0xb1;
/// Reserved no-op (OP_CHECKSEQUENCEVERIFY upgrade slot).
pub const OP_NOP3: u8 = 0xb2;
/// Reserved no-op.
pub const OP_NOP4: u8 = 0xb3;
/// Reserved no-op.
pub const OP_NOP5: u8 = 0xb4;
/// Reserved no-op.
pub const OP_NOP6: u8 = 0xb5;
/// Reserved no-op.
pub const OP_NOP7: u8 = 0xb6;
/// Reserved no-op.
pub const OP_NOP8: u8 = 0xb7;
/// Reserved no-op.
pub const OP_NOP9: u8 = 0xb8;
/// Reserved no-op.
pub const OP_NOP10: u8 = 0xb9;

/// Sentinel for an unassigned opcode byte.
pub const OP_INVALIDOPCODE: u8 = 0xff;

// -----------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------

/// Return true if `op` is one of the small-integer opcodes
/// (OP_0 or OP_1..OP_16).
pub fn is_small_int_op(op: u8) -> bool {
    op == OP_0 || (op >= OP_1 && op <= OP_16)
}

/// Decode the numeric value of a small-integer opcode.
///
/// # Returns
/// `Some(0..=16)` for OP_0/OP_1..OP_16, `None` for any other byte.
pub fn small_int_value(op: u8) -> Option<u8> {
    if op == OP_0 {
        Some(0)
    } else if op >= OP_1 && op <= OP_16 {
        Some(op - OP_1 + 1)
    } else {
        None
    }
}

/// Encode a value in 0..=16 as its small-integer opcode.
///
/// # Panics
/// Panics if `n > 16`; callers validate the range.
pub fn small_int_op(n: u8) -> u8 {
    assert!(n <= 16, "small int out of range: {}", n);
    if n == 0 {
        OP_0
    } else {
        OP_1 + n - 1
    }
}

/// Return the canonical OP_xxx name for an opcode byte.
///
/// Direct data pushes render as OP_DATA_n. Unassigned bytes render as
/// OP_UNKNOWN.
pub fn opcode_to_string(op: u8) -> &'static str {
    match op {
        OP_0 => "OP_0",
        0x01..=0x4b => DATA_PUSH_NAMES[(op - 1) as usize],
        OP_PUSHDATA1 => "OP_PUSHDATA1",
        OP_PUSHDATA2 => "OP_PUSHDATA2",
        OP_PUSHDATA4 => "OP_PUSHDATA4",
        OP_1NEGATE => "OP_1NEGATE",
        OP_RESERVED => "OP_RESERVED",
        OP_1 => "OP_1",
        OP_2 => "OP_2",
        OP_3 => "OP_3",
        OP_4 => "OP_4",
        OP_5 => "OP_5",
        OP_6 => "OP_6",
        OP_7 => "OP_7",
        OP_8 => "OP_8",
        OP_9 => "OP_9",
        OP_10 => "OP_10",
        OP_11 => "OP_11",
        OP_12 => "OP_12",
        OP_13 => "OP_13",
        OP_14 => "OP_14",
        OP_15 => "OP_15",
        OP_16 => "OP_16",
        OP_NOP => "OP_NOP",
        OP_VER => "OP_VER",
        OP_IF => "OP_IF",
        OP_NOTIF => "OP_NOTIF",
        OP_VERIF => "OP_VERIF",
        OP_VERNOTIF => "OP_VERNOTIF",
        OP_ELSE => "OP_ELSE",
        OP_ENDIF => "OP_ENDIF",
        OP_VERIFY => "OP_VERIFY",
        OP_RETURN => "OP_RETURN",
        OP_TOALTSTACK => "OP_TOALTSTACK",
        OP_FROMALTSTACK => "OP_FROMALTSTACK",
        OP_2DROP => "OP_2DROP",
        OP_2DUP => "OP_2DUP",
        OP_3DUP => "OP_3DUP",
        OP_2OVER => "OP_2OVER",
        OP_2ROT => "OP_2ROT",
        OP_2SWAP => "OP_2SWAP",
        OP_IFDUP => "OP_IFDUP",
        OP_DEPTH => "OP_DEPTH",
        OP_DROP => "OP_DROP",
        OP_DUP => "OP_DUP",
        OP_NIP => "OP_NIP",
        OP_OVER => "OP_OVER",
        OP_PICK => "OP_PICK",
        OP_ROLL => "OP_ROLL",
        OP_ROT => "OP_ROT",
        OP_SWAP => "OP_SWAP",
        OP_TUCK => "OP_TUCK",
        OP_CAT => "OP_CAT",
        OP_SUBSTR => "OP_SUBSTR",
        OP_LEFT => "OP_LEFT",
        OP_RIGHT => "OP_RIGHT",
        OP_SIZE => "OP_SIZE",
        OP_INVERT => "OP_INVERT",
        OP_AND => "OP_AND",
        OP_OR => "OP_OR",
        OP_XOR => "OP_XOR",
        OP_EQUAL => "OP_EQUAL",
        OP_EQUALVERIFY => "OP_EQUALVERIFY",
        OP_RESERVED1 => "OP_RESERVED1",
        OP_RESERVED2 => "OP_RESERVED2",
        OP_1ADD => "OP_1ADD",
        OP_1SUB => "OP_1SUB",
        OP_2MUL => "OP_2MUL",
        OP_2DIV => "OP_2DIV",
        OP_NEGATE => "OP_NEGATE",
        OP_ABS => "OP_ABS",
        OP_NOT => "OP_NOT",
        OP_0NOTEQUAL => "OP_0NOTEQUAL",
        OP_ADD => "OP_ADD",
        OP_SUB => "OP_SUB",
        OP_MUL => "OP_MUL",
        OP_DIV => "OP_DIV",
        OP_MOD => "OP_MOD",
        OP_LSHIFT => "OP_LSHIFT",
        OP_RSHIFT => "OP_RSHIFT",
        OP_BOOLAND => "OP_BOOLAND",
        OP_BOOLOR => "OP_BOOLOR",
        OP_NUMEQUAL => "OP_NUMEQUAL",
        OP_NUMEQUALVERIFY => "OP_NUMEQUALVERIFY",
        OP_NUMNOTEQUAL => "OP_NUMNOTEQUAL",
        OP_LESSTHAN => "OP_LESSTHAN",
        OP_GREATERTHAN => "OP_GREATERTHAN",
        OP_LESSTHANOREQUAL => "OP_LESSTHANOREQUAL",
        OP_GREATERTHANOREQUAL => "OP_GREATERTHANOREQUAL",
        OP_MIN => "OP_MIN",
        OP_MAX => "OP_MAX",
        OP_WITHIN => "OP_WITHIN",
        OP_RIPEMD160 => "OP_RIPEMD160",
        OP_SHA1 => "OP_SHA1",
        OP_SHA256 => "OP_SHA256",
        OP_HASH160 => "OP_HASH160",
        OP_HASH256 => "OP_HASH256",
        OP_CODESEPARATOR => "OP_CODESEPARATOR",
        OP_CHECKSIG => "OP_CHECKSIG",
        OP_CHECKSIGVERIFY => "OP_CHECKSIGVERIFY",
        OP_CHECKMULTISIG => "OP_CHECKMULTISIG",
        OP_CHECKMULTISIGVERIFY => "OP_CHECKMULTISIGVERIFY",
        OP_NOP1 => "OP_NOP1",
        OP_NOP2 => "OP_NOP2",
        OP_NOP3 => "OP_NOP3",
        OP_NOP4 => "OP_NOP4",
        OP_NOP5 => "OP_NOP5",
        OP_NOP6 => "OP_NOP6",
        OP_NOP7 => "OP_NOP7",
        OP_NOP8 => "OP_NOP8",
        OP_NOP9 => "OP_NOP9",
        OP_NOP10 => "OP_NOP10",
        _ => "OP_UNKNOWN",
    }
}

/// Look up an opcode byte by its OP_xxx name.
///
/// Accepts the aliases OP_FALSE and OP_TRUE. Direct data push names
/// (OP_DATA_n) are intentionally not accepted: ASM data pushes are
/// written as hex, not by opcode name.
pub fn string_to_opcode(name: &str) -> Option<u8> {
    match name {
        "OP_FALSE" => return Some(OP_FALSE),
        "OP_TRUE" => return Some(OP_TRUE),
        _ => {}
    }
    // Scan the name table over the non-push opcode space.
    for op in 0x00..=0xb9u8 {
        if (0x01..=0x4b).contains(&op) {
            continue;
        }
        if opcode_to_string(op) == name {
            return Some(op);
        }
    }
    None
}

/// Names for the 75 direct data push opcodes.
static DATA_PUSH_NAMES: [&str; 75] = [
    "OP_DATA_1", "OP_DATA_2", "OP_DATA_3", "OP_DATA_4", "OP_DATA_5", "OP_DATA_6", "OP_DATA_7",
    "OP_DATA_8", "OP_DATA_9", "OP_DATA_10", "OP_DATA_11", "OP_DATA_12", "OP_DATA_13", "OP_DATA_14",
    "OP_DATA_15", "OP_DATA_16", "OP_DATA_17", "OP_DATA_18", "OP_DATA_19", "OP_DATA_20",
    "OP_DATA_21", "OP_DATA_22", "OP_DATA_23", "OP_DATA_24", "OP_DATA_25", "OP_DATA_26",
    "OP_DATA_27", "OP_DATA_28", "OP_DATA_29", "OP_DATA_30", "OP_DATA_31", "OP_DATA_32",
    "OP_DATA_33", "OP_DATA_34", "OP_DATA_35", "OP_DATA_36", "OP_DATA_37", "OP_DATA_38",
    "OP_DATA_39", "OP_DATA_40", "OP_DATA_41", "OP_DATA_42", "OP_DATA_43", "OP_DATA_44",
    "OP_DATA_45", "OP_DATA_46", "OP_DATA_47", "OP_DATA_48", "OP_DATA_49", "OP_DATA_50",
    "OP_DATA_51", "OP_DATA_52", "OP_DATA_53", "OP_DATA_54", "OP_DATA_55", "OP_DATA_56",
    "OP_DATA_57", "OP_DATA_58", "OP_DATA_59", "OP_DATA_60", "OP_DATA_61", "OP_DATA_62",
    "OP_DATA_63", "OP_DATA_64", "OP_DATA_65", "OP_DATA_66", "OP_DATA_67", "OP_DATA_68",
    "OP_DATA_69", "OP_DATA_70", "OP_DATA_71", "OP_DATA_72", "OP_DATA_73", "OP_DATA_74",
    "OP_DATA_75",
];
