//! Standard script template recognition and construction.
//!
//! Pattern-matches a script's operation sequence against the standard
//! shapes (P2PK, P2PKH, P2SH, bare multisig, null-data), extracting the
//! shape-specific parameters in the same pass. Also derives the
//! destination id of an output script and the signer id implied by a
//! spending script.

use btc_primitives::hash::hash160;

use crate::op::{push_for, ScriptOp};
use crate::opcodes::*;
use crate::Script;

/// Maximum number of keys in a standard multisig output.
pub const MAX_MULTISIG_KEYS: u8 = 20;

/// A recognized standard script shape with its extracted parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Template {
    /// `<pubkey> CHECKSIG`
    P2pk {
        /// The 33- or 65-byte public key.
        pubkey: Vec<u8>,
    },
    /// `DUP HASH160 <20 bytes> EQUALVERIFY CHECKSIG`
    P2pkh {
        /// Hash160 of the public key.
        pubkey_hash: [u8; 20],
    },
    /// `HASH160 <20 bytes> EQUAL`
    P2sh {
        /// Hash160 of the redeem script.
        script_hash: [u8; 20],
    },
    /// `OP_m <pubkey>... OP_n CHECKMULTISIG` with 1 <= m <= n <= 20.
    Multisig {
        /// Signatures required (m).
        required: usize,
        /// The listed public keys, in declaration order.
        pubkeys: Vec<Vec<u8>>,
    },
    /// `RETURN <push>*`
    NullData {
        /// The pushed payloads after OP_RETURN.
        pushes: Vec<Vec<u8>>,
    },
}

/// The destination or signer id a standard script commits to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptId {
    /// Hash160 of a public key.
    PubKeyHash([u8; 20]),
    /// Hash160 of a redeem script.
    ScriptHash([u8; 20]),
}

impl Template {
    /// Recognize a script's shape and extract its parameters.
    ///
    /// # Returns
    /// `Some(Template)` if the script matches a standard shape,
    /// otherwise `None`.
    pub fn match_script(script: &Script) -> Option<Template> {
        let ops = script.ops();
        if ops.contains(&ScriptOp::Invalid) {
            return None;
        }
        match_p2pkh(&ops)
            .or_else(|| match_p2sh(&ops))
            .or_else(|| match_p2pk(&ops))
            .or_else(|| match_multisig(&ops))
            .or_else(|| match_null_data(&ops))
    }

    /// Check whether a script matches this template's shape, ignoring
    /// the extracted parameters.
    pub fn matches(&self, script: &Script) -> bool {
        matches!(
            (self, Template::match_script(script)),
            (Template::P2pk { .. }, Some(Template::P2pk { .. }))
                | (Template::P2pkh { .. }, Some(Template::P2pkh { .. }))
                | (Template::P2sh { .. }, Some(Template::P2sh { .. }))
                | (Template::Multisig { .. }, Some(Template::Multisig { .. }))
                | (Template::NullData { .. }, Some(Template::NullData { .. }))
        )
    }

    /// Build the locking script for this template.
    pub fn to_script(&self) -> Script {
        match self {
            Template::P2pk { pubkey } => {
                Script::from_ops(&[push_for(pubkey), ScriptOp::Code(OP_CHECKSIG)])
            }
            Template::P2pkh { pubkey_hash } => p2pkh_script(pubkey_hash),
            Template::P2sh { script_hash } => p2sh_script(script_hash),
            Template::Multisig { required, pubkeys } => {
                let mut ops = vec![multisig_int_op(*required as u8)];
                for pk in pubkeys {
                    ops.push(push_for(pk));
                }
                ops.push(multisig_int_op(pubkeys.len() as u8));
                ops.push(ScriptOp::Code(OP_CHECKMULTISIG));
                Script::from_ops(&ops)
            }
            Template::NullData { pushes } => {
                let mut ops = vec![ScriptOp::Code(OP_RETURN)];
                for data in pushes {
                    ops.push(push_for(data));
                }
                Script::from_ops(&ops)
            }
        }
    }
}

/// Build the 25-byte P2PKH locking script for a public key hash.
pub fn p2pkh_script(pubkey_hash: &[u8; 20]) -> Script {
    Script::from_ops(&[
        ScriptOp::Code(OP_DUP),
        ScriptOp::Code(OP_HASH160),
        push_for(pubkey_hash),
        ScriptOp::Code(OP_EQUALVERIFY),
        ScriptOp::Code(OP_CHECKSIG),
    ])
}

/// Build the 23-byte P2SH locking script for a script hash.
pub fn p2sh_script(script_hash: &[u8; 20]) -> Script {
    Script::from_ops(&[
        ScriptOp::Code(OP_HASH160),
        push_for(script_hash),
        ScriptOp::Code(OP_EQUAL),
    ])
}

/// Extract the destination id of an output script.
///
/// P2PKH yields the key hash, P2SH the script hash, and P2PK the
/// Hash160 of the listed public key. Multisig and null-data scripts
/// have no single destination.
pub fn destination(script_pubkey: &Script) -> Option<ScriptId> {
    match Template::match_script(script_pubkey)? {
        Template::P2pkh { pubkey_hash } => Some(ScriptId::PubKeyHash(pubkey_hash)),
        Template::P2sh { script_hash } => Some(ScriptId::ScriptHash(script_hash)),
        Template::P2pk { pubkey } => Some(ScriptId::PubKeyHash(hash160(&pubkey))),
        _ => None,
    }
}

/// Extract the signer id implied by a spending script.
///
/// A P2PKH spend (`<sig> <pubkey>`) yields the Hash160 of the pushed
/// public key. A P2SH spend (`<push>... <redeem>`, where the trailing
/// push is itself a recognized template's locking script) yields the
/// Hash160 of the redeem script.
pub fn signer(script_sig: &Script) -> Option<ScriptId> {
    if !script_sig.is_push_only() {
        return None;
    }
    let ops = script_sig.ops();

    // <sig> <pubkey>
    if ops.len() == 2 {
        if let (ScriptOp::Push { data: sig, .. }, ScriptOp::Push { data: pubkey, .. }) =
            (&ops[0], &ops[1])
        {
            if !sig.is_empty() && is_pubkey(pubkey) {
                return Some(ScriptId::PubKeyHash(hash160(pubkey)));
            }
        }
    }

    // <push>... <redeem script>
    if let Some(ScriptOp::Push { data: redeem, .. }) = ops.last() {
        let redeem_script = Script::from_bytes(redeem);
        if Template::match_script(&redeem_script).is_some() {
            return Some(ScriptId::ScriptHash(hash160(redeem)));
        }
    }

    None
}

// -----------------------------------------------------------------------
// Shape matchers
// -----------------------------------------------------------------------

fn match_p2pkh(ops: &[ScriptOp]) -> Option<Template> {
    match ops {
        [ScriptOp::Code(a), ScriptOp::Code(b), ScriptOp::Push { data, .. }, ScriptOp::Code(c), ScriptOp::Code(d)]
            if *a == OP_DUP
                && *b == OP_HASH160
                && data.len() == 20
                && *c == OP_EQUALVERIFY
                && *d == OP_CHECKSIG =>
        {
            let mut pubkey_hash = [0u8; 20];
            pubkey_hash.copy_from_slice(data);
            Some(Template::P2pkh { pubkey_hash })
        }
        _ => None,
    }
}

fn match_p2sh(ops: &[ScriptOp]) -> Option<Template> {
    match ops {
        [ScriptOp::Code(a), ScriptOp::Push { data, .. }, ScriptOp::Code(b)]
            if *a == OP_HASH160 && data.len() == 20 && *b == OP_EQUAL =>
        {
            let mut script_hash = [0u8; 20];
            script_hash.copy_from_slice(data);
            Some(Template::P2sh { script_hash })
        }
        _ => None,
    }
}

fn match_p2pk(ops: &[ScriptOp]) -> Option<Template> {
    match ops {
        [ScriptOp::Push { data, .. }, ScriptOp::Code(c)]
            if *c == OP_CHECKSIG && is_pubkey(data) =>
        {
            Some(Template::P2pk {
                pubkey: data.clone(),
            })
        }
        _ => None,
    }
}

fn match_multisig(ops: &[ScriptOp]) -> Option<Template> {
    if ops.len() < 4 {
        return None;
    }
    let required = multisig_int(&ops[0])?;
    let total = multisig_int(&ops[ops.len() - 2])?;
    if !matches!(ops[ops.len() - 1], ScriptOp::Code(c) if c == OP_CHECKMULTISIG) {
        return None;
    }
    if required == 0 || required > total || total > MAX_MULTISIG_KEYS {
        return None;
    }
    let key_ops = &ops[1..ops.len() - 2];
    if key_ops.len() != total as usize {
        return None;
    }
    let mut pubkeys = Vec::with_capacity(key_ops.len());
    for op in key_ops {
        match op {
            ScriptOp::Push { data, .. } if !data.is_empty() => pubkeys.push(data.clone()),
            _ => return None,
        }
    }
    Some(Template::Multisig {
        required: required as usize,
        pubkeys,
    })
}

fn match_null_data(ops: &[ScriptOp]) -> Option<Template> {
    match ops.first() {
        Some(ScriptOp::Code(c)) if *c == OP_RETURN => {}
        _ => return None,
    }
    let mut pushes = Vec::new();
    for op in &ops[1..] {
        pushes.push(op.pushed_bytes()?);
    }
    Some(Template::NullData { pushes })
}

// -----------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------

/// Plausible public key: compressed (33 bytes, prefix 02/03) or
/// uncompressed/hybrid (65 bytes, prefix 04/06/07).
fn is_pubkey(data: &[u8]) -> bool {
    match data.len() {
        33 => data[0] == 0x02 || data[0] == 0x03,
        65 => data[0] == 0x04 || data[0] == 0x06 || data[0] == 0x07,
        _ => false,
    }
}

/// Decode a multisig count operand: OP_1..OP_16, or a single-byte push
/// holding 17..=20 for the key counts the small-int opcodes cannot
/// reach.
fn multisig_int(op: &ScriptOp) -> Option<u8> {
    match op {
        ScriptOp::Small(n) if *n >= 1 => Some(*n),
        ScriptOp::Push { data, .. } if data.len() == 1 && data[0] >= 17 && data[0] <= 20 => {
            Some(data[0])
        }
        _ => None,
    }
}

/// Encode a multisig count operand, inverse of `multisig_int`.
fn multisig_int_op(n: u8) -> ScriptOp {
    if n <= 16 {
        ScriptOp::Small(n)
    } else {
        ScriptOp::Push {
            op: 0x01,
            data: vec![n],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compressed_key(fill: u8) -> Vec<u8> {
        let mut key = vec![0x02];
        key.extend_from_slice(&[fill; 32]);
        key
    }

    fn uncompressed_key(fill: u8) -> Vec<u8> {
        let mut key = vec![0x04];
        key.extend_from_slice(&[fill; 64]);
        key
    }

    // -----------------------------------------------------------------------
    // Recognition
    // -----------------------------------------------------------------------

    #[test]
    fn test_match_p2pkh() {
        let script =
            Script::from_hex("76a91403ececf2d12a7f614aef4c82ecf13c303bd9975d88ac").unwrap();
        match Template::match_script(&script) {
            Some(Template::P2pkh { pubkey_hash }) => {
                assert_eq!(
                    hex::encode(pubkey_hash),
                    "03ececf2d12a7f614aef4c82ecf13c303bd9975d"
                );
            }
            other => panic!("expected P2pkh, got {:?}", other),
        }
    }

    #[test]
    fn test_match_p2sh() {
        let script =
            Script::from_hex("a9149de5aeaff9c48431ba4dd6e8af73d51f38e451cb87").unwrap();
        match Template::match_script(&script) {
            Some(Template::P2sh { script_hash }) => {
                assert_eq!(
                    hex::encode(script_hash),
                    "9de5aeaff9c48431ba4dd6e8af73d51f38e451cb"
                );
            }
            other => panic!("expected P2sh, got {:?}", other),
        }
    }

    #[test]
    fn test_match_p2pk_compressed_and_uncompressed() {
        for key in [compressed_key(0x11), uncompressed_key(0x22)] {
            let script = Script::from_ops(&[push_for(&key), ScriptOp::Code(OP_CHECKSIG)]);
            match Template::match_script(&script) {
                Some(Template::P2pk { pubkey }) => assert_eq!(pubkey, key),
                other => panic!("expected P2pk, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_match_p2pk_rejects_bad_prefix() {
        let mut key = vec![0x05];
        key.extend_from_slice(&[0u8; 32]);
        let script = Script::from_ops(&[push_for(&key), ScriptOp::Code(OP_CHECKSIG)]);
        assert_eq!(Template::match_script(&script), None);
    }

    #[test]
    fn test_match_multisig() {
        let keys = vec![compressed_key(1), compressed_key(2), compressed_key(3)];
        let script = Template::Multisig {
            required: 2,
            pubkeys: keys.clone(),
        }
        .to_script();
        match Template::match_script(&script) {
            Some(Template::Multisig { required, pubkeys }) => {
                assert_eq!(required, 2);
                assert_eq!(pubkeys, keys);
            }
            other => panic!("expected Multisig, got {:?}", other),
        }
    }

    #[test]
    fn test_match_multisig_rejects_bad_counts() {
        // m > n
        let script = Script::from_ops(&[
            ScriptOp::Small(3),
            push_for(&compressed_key(1)),
            push_for(&compressed_key(2)),
            ScriptOp::Small(2),
            ScriptOp::Code(OP_CHECKMULTISIG),
        ]);
        assert_eq!(Template::match_script(&script), None);

        // declared n disagrees with the listed keys
        let script = Script::from_ops(&[
            ScriptOp::Small(1),
            push_for(&compressed_key(1)),
            ScriptOp::Small(3),
            ScriptOp::Code(OP_CHECKMULTISIG),
        ]);
        assert_eq!(Template::match_script(&script), None);
    }

    #[test]
    fn test_match_null_data() {
        let script = Script::from_ops(&[ScriptOp::Code(OP_RETURN), push_for(b"memo")]);
        match Template::match_script(&script) {
            Some(Template::NullData { pushes }) => {
                assert_eq!(pushes, vec![b"memo".to_vec()]);
            }
            other => panic!("expected NullData, got {:?}", other),
        }

        // Bare OP_RETURN carries no pushes.
        let script = Script::from_bytes(&[OP_RETURN]);
        assert_eq!(
            Template::match_script(&script),
            Some(Template::NullData { pushes: vec![] })
        );

        // Non-push after OP_RETURN is not null-data.
        let script = Script::from_bytes(&[OP_RETURN, OP_DUP]);
        assert_eq!(Template::match_script(&script), None);
    }

    #[test]
    fn test_match_rejects_invalid_script() {
        let script = Script::from_bytes(&[OP_RETURN, 0x05, 0x01]);
        assert_eq!(Template::match_script(&script), None);
    }

    // -----------------------------------------------------------------------
    // Construction round trips
    // -----------------------------------------------------------------------

    #[test]
    fn test_to_script_roundtrip() {
        let templates = vec![
            Template::P2pk {
                pubkey: compressed_key(9),
            },
            Template::P2pkh {
                pubkey_hash: [0xab; 20],
            },
            Template::P2sh {
                script_hash: [0xcd; 20],
            },
            Template::Multisig {
                required: 1,
                pubkeys: vec![compressed_key(4), compressed_key(5)],
            },
            Template::NullData {
                pushes: vec![b"data".to_vec()],
            },
        ];
        for template in templates {
            let script = template.to_script();
            assert_eq!(Template::match_script(&script), Some(template));
        }
    }

    #[test]
    fn test_p2pkh_script_layout() {
        let script = p2pkh_script(&[0x11; 20]);
        assert_eq!(script.len(), 25);
        let script = p2sh_script(&[0x22; 20]);
        assert_eq!(script.len(), 23);
    }

    // -----------------------------------------------------------------------
    // Destination and signer extraction
    // -----------------------------------------------------------------------

    #[test]
    fn test_destination_ids() {
        assert_eq!(
            destination(&p2pkh_script(&[0x42; 20])),
            Some(ScriptId::PubKeyHash([0x42; 20]))
        );
        assert_eq!(
            destination(&p2sh_script(&[0x43; 20])),
            Some(ScriptId::ScriptHash([0x43; 20]))
        );

        let key = compressed_key(7);
        let p2pk = Script::from_ops(&[push_for(&key), ScriptOp::Code(OP_CHECKSIG)]);
        assert_eq!(
            destination(&p2pk),
            Some(ScriptId::PubKeyHash(hash160(&key)))
        );

        let null_data = Script::from_bytes(&[OP_RETURN]);
        assert_eq!(destination(&null_data), None);
    }

    #[test]
    fn test_signer_p2pkh() {
        let key = compressed_key(3);
        let script_sig = Script::from_ops(&[push_for(&[0x30; 71]), push_for(&key)]);
        assert_eq!(
            signer(&script_sig),
            Some(ScriptId::PubKeyHash(hash160(&key)))
        );
    }

    #[test]
    fn test_signer_p2sh() {
        let redeem = Template::Multisig {
            required: 1,
            pubkeys: vec![compressed_key(8)],
        }
        .to_script();
        let script_sig = Script::from_ops(&[
            ScriptOp::Small(0),
            push_for(&[0x30; 71]),
            push_for(redeem.to_bytes()),
        ]);
        assert_eq!(
            signer(&script_sig),
            Some(ScriptId::ScriptHash(hash160(redeem.to_bytes())))
        );
    }

    #[test]
    fn test_signer_rejects_non_push_and_unknown() {
        assert_eq!(signer(&Script::from_bytes(&[OP_DUP])), None);
        assert_eq!(signer(&Script::from_ops(&[push_for(b"junk")])), None);
        assert_eq!(signer(&Script::new()), None);
    }
}
