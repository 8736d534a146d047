//! Script verification flags (bitmask).

use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Script verification flags controlling which policy checks a verifier
/// applies on top of consensus rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScriptFlags(pub u32);

impl ScriptFlags {
    /// No flags set.
    pub const NONE: ScriptFlags = ScriptFlags(0);
    /// Evaluate pay-to-script-hash subscripts (BIP16).
    pub const P2SH: ScriptFlags = ScriptFlags(1);
    /// Require strict signature and public key encoding.
    pub const STRICT_ENC: ScriptFlags = ScriptFlags(2);
    /// Require strict DER encoding for signatures.
    pub const DER_SIG: ScriptFlags = ScriptFlags(4);
    /// Require the signature S value in the lower half of the curve order.
    pub const LOW_S: ScriptFlags = ScriptFlags(8);
    /// Require the CHECKMULTISIG dummy element to be empty.
    pub const NULL_DUMMY: ScriptFlags = ScriptFlags(16);
    /// Require the unlocking script to contain only pushes.
    pub const SIG_PUSH_ONLY: ScriptFlags = ScriptFlags(32);
    /// Require minimal encoding for data pushes.
    pub const MINIMAL_DATA: ScriptFlags = ScriptFlags(64);
    /// Reject use of the upgradable NOP opcodes (NOP1..NOP10).
    pub const DISCOURAGE_UPGRADABLE_NOPS: ScriptFlags = ScriptFlags(128);
    /// Require exactly one element on the stack after execution.
    pub const CLEAN_STACK: ScriptFlags = ScriptFlags(256);

    /// Return true if every bit of `flag` is set in this value.
    pub fn has_flag(self, flag: ScriptFlags) -> bool {
        self.0 & flag.0 == flag.0
    }

    /// Set the given flag bits in this value.
    pub fn add_flag(&mut self, flag: ScriptFlags) {
        self.0 |= flag.0;
    }
}

impl BitOr for ScriptFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        ScriptFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for ScriptFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ScriptFlags {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        ScriptFlags(self.0 & rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_values() {
        assert_eq!(ScriptFlags::P2SH.0, 1);
        assert_eq!(ScriptFlags::STRICT_ENC.0, 2);
        assert_eq!(ScriptFlags::DER_SIG.0, 4);
        assert_eq!(ScriptFlags::LOW_S.0, 8);
        assert_eq!(ScriptFlags::NULL_DUMMY.0, 16);
        assert_eq!(ScriptFlags::SIG_PUSH_ONLY.0, 32);
        assert_eq!(ScriptFlags::MINIMAL_DATA.0, 64);
        assert_eq!(ScriptFlags::DISCOURAGE_UPGRADABLE_NOPS.0, 128);
        assert_eq!(ScriptFlags::CLEAN_STACK.0, 256);
    }

    #[test]
    fn test_flag_ops() {
        let mut flags = ScriptFlags::P2SH | ScriptFlags::MINIMAL_DATA;
        assert!(flags.has_flag(ScriptFlags::P2SH));
        assert!(!flags.has_flag(ScriptFlags::LOW_S));
        flags.add_flag(ScriptFlags::LOW_S);
        assert!(flags.has_flag(ScriptFlags::LOW_S));
        assert_eq!((flags & ScriptFlags::P2SH).0, 1);
    }
}
