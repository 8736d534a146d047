//! Tests for the btc-transaction crate.
//!
//! Covers transaction parsing and serialization round trips, txid
//! computation, coinbase detection, the signature-hash engine's mode
//! coverage and boundary sentinels, and partial signature combination.

use btc_primitives::hash::sha256d;
use btc_script::op::push_for;
use btc_script::opcodes::*;
use btc_script::template::p2pkh_script;
use btc_script::{Script, ScriptOp};

use crate::combine::{combine_multisig, combine_signatures, SignatureVerifier};
use crate::input::TransactionInput;
use crate::output::TransactionOutput;
use crate::sighash::{
    signature_hash, SIGHASH_ALL, SIGHASH_ANYONECANPAY, SIGHASH_NONE, SIGHASH_SINGLE,
};
use crate::transaction::Transaction;
use crate::TransactionError;

// -----------------------------------------------------------------------
// Fixtures
// -----------------------------------------------------------------------

/// The block-170 transaction, the first ever to spend coins.
const BLOCK_170_TX: &str = "0100000001c997a5e56e104102fa209c6a852dd90660a20b2d9c352423edce25857fcd3704000000004847304402204e45e16932b8af514961a1d3a1a25fdf3f4f7732e9d624c6c61548ab5fb8cd410220181522ec8eca07de4860a4acdd12909d831cc56cbbac4622082221a8768d1d0901ffffffff0200ca9a3b00000000434104ae1a62fe09c5f51b13905f07f06b99a2f7159b2225f374cd378d71302fa28414e7aab37397f554a7df5f142c21c1b7303b8a0626f1baded5c72a704f7e6cd84cac00286bee0000000043410411db93e1dcdb8a016b49840f8c53bc1eb68a382e97b1482ecad7b148a6909a5cb2e0eaddfb84ccf9744464f82e160bfa9b8b64f9d4c03f999b8643f656b412a3ac00000000";

/// Build a transaction with `n_in` inputs and `n_out` P2PKH outputs,
/// each field given a distinct recognizable value.
fn sample_tx(n_in: usize, n_out: usize) -> Transaction {
    let mut tx = Transaction::new();
    for i in 0..n_in {
        let mut input = TransactionInput::new();
        input.prev_txid = [i as u8 + 1; 32];
        input.prev_vout = i as u32;
        input.sequence = 0xFFFF_FFFE;
        tx.add_input(input);
    }
    for i in 0..n_out {
        tx.add_output(TransactionOutput {
            value: (i as i64 + 1) * 50_000,
            script_pubkey: p2pkh_script(&[i as u8 + 0x40; 20]),
        });
    }
    tx
}

fn compressed_key(fill: u8) -> Vec<u8> {
    let mut key = vec![0x02];
    key.extend_from_slice(&[fill; 32]);
    key
}

fn fake_sig(fill: u8) -> Vec<u8> {
    let mut sig = vec![0x30, 0x45];
    sig.extend_from_slice(&[fill; 69]);
    sig
}

/// Verifier that accepts a signature for a key iff both carry the same
/// fill byte; EC math is out of scope for these tests.
struct FillVerifier;

impl SignatureVerifier for FillVerifier {
    fn check(
        &self,
        sig: &[u8],
        pubkey: &[u8],
        _subscript: &Script,
        _tx: &Transaction,
        _input_index: usize,
    ) -> bool {
        sig.len() > 2 && pubkey.len() > 1 && sig[2] == pubkey[1]
    }
}

// -----------------------------------------------------------------------
// Parsing and serialization
// -----------------------------------------------------------------------

#[test]
fn test_block_170_roundtrip() {
    let tx = Transaction::from_hex(BLOCK_170_TX).expect("should parse block-170 tx");

    assert_eq!(tx.version, 1);
    assert_eq!(tx.input_count(), 1);
    assert_eq!(tx.output_count(), 2);
    assert_eq!(tx.lock_time, 0);
    assert_eq!(tx.outputs[0].value, 10_0000_0000);
    assert_eq!(tx.outputs[1].value, 40_0000_0000);

    assert_eq!(tx.to_hex(), BLOCK_170_TX);
    assert_eq!(
        tx.tx_id_hex(),
        "f4184fc596403b9d638783cf57adfe4c75c605f6356fbc91338530e9831e9e16"
    );
}

#[test]
fn test_constructed_roundtrip() {
    let tx = sample_tx(3, 2);
    let parsed = Transaction::from_bytes(&tx.to_bytes()).expect("should parse");
    assert_eq!(parsed, tx);
}

#[test]
fn test_trailing_bytes_rejected() {
    let mut bytes = sample_tx(1, 1).to_bytes();
    bytes.push(0x00);
    match Transaction::from_bytes(&bytes) {
        Err(TransactionError::SerializationError(_)) => {}
        other => panic!("expected serialization error, got {:?}", other),
    }
}

#[test]
fn test_truncated_rejected() {
    let bytes = sample_tx(1, 1).to_bytes();
    assert!(Transaction::from_bytes(&bytes[..bytes.len() - 3]).is_err());
}

#[test]
fn test_coinbase_detection() {
    let mut tx = Transaction::new();
    let mut input = TransactionInput::new();
    input.prev_vout = 0xFFFF_FFFF;
    tx.add_input(input);
    assert!(tx.is_coinbase());

    let spending = sample_tx(1, 1);
    assert!(!spending.is_coinbase());
}

// -----------------------------------------------------------------------
// Signature hash: boundaries and sentinel
// -----------------------------------------------------------------------

fn one_hash() -> [u8; 32] {
    let mut hash = [0u8; 32];
    hash[0] = 1;
    hash
}

#[test]
fn test_sighash_input_out_of_range_is_sentinel() {
    let tx = sample_tx(2, 2);
    let subscript = p2pkh_script(&[0x11; 20]);
    assert_eq!(signature_hash(&tx, 2, &subscript, SIGHASH_ALL), one_hash());
    assert_eq!(signature_hash(&tx, 99, &subscript, SIGHASH_ALL), one_hash());
}

#[test]
fn test_sighash_single_past_outputs_is_sentinel() {
    let tx = sample_tx(3, 2);
    let subscript = p2pkh_script(&[0x11; 20]);
    assert_eq!(
        signature_hash(&tx, 2, &subscript, SIGHASH_SINGLE),
        one_hash()
    );
    // The same index is fine under ALL.
    assert_ne!(signature_hash(&tx, 2, &subscript, SIGHASH_ALL), one_hash());
}

// -----------------------------------------------------------------------
// Signature hash: mode coverage
// -----------------------------------------------------------------------

/// Digest expected from the clone-and-mutate formulation: every input
/// script emptied, the signed one set to the subscript, then the given
/// reshaping applied before serializing with the hash type appended.
fn expected_digest(
    tx: &Transaction,
    input_index: usize,
    subscript: &Script,
    sighash_type: u32,
    reshape: impl Fn(&mut Transaction),
) -> [u8; 32] {
    let mut clone = tx.clone();
    for input in &mut clone.inputs {
        input.script_sig = Script::new();
    }
    clone.inputs[input_index].script_sig = subscript.clone();
    reshape(&mut clone);

    let mut bytes = clone.to_bytes();
    bytes.extend_from_slice(&sighash_type.to_le_bytes());
    sha256d(&bytes)
}

#[test]
fn test_sighash_all_one_in_one_out() {
    let tx = sample_tx(1, 1);
    let subscript = p2pkh_script(&[0x7f; 20]);

    let digest = signature_hash(&tx, 0, &subscript, SIGHASH_ALL);
    let expected = expected_digest(&tx, 0, &subscript, SIGHASH_ALL, |_| {});
    assert_eq!(digest, expected);
}

#[test]
fn test_sighash_all_multi_input_clears_other_scripts() {
    let mut tx = sample_tx(3, 2);
    // Give the other inputs non-empty scripts to prove they are cleared.
    tx.inputs[0].script_sig = Script::from_bytes(&[OP_1]);
    tx.inputs[2].script_sig = Script::from_bytes(&[OP_2]);

    let subscript = p2pkh_script(&[0x7f; 20]);
    let digest = signature_hash(&tx, 1, &subscript, SIGHASH_ALL);
    let expected = expected_digest(&tx, 1, &subscript, SIGHASH_ALL, |_| {});
    assert_eq!(digest, expected);
}

#[test]
fn test_sighash_none_clears_outputs_and_sequences() {
    let tx = sample_tx(3, 2);
    let subscript = p2pkh_script(&[0x7f; 20]);

    let digest = signature_hash(&tx, 1, &subscript, SIGHASH_NONE);
    let expected = expected_digest(&tx, 1, &subscript, SIGHASH_NONE, |clone| {
        clone.outputs.clear();
        clone.inputs[0].sequence = 0;
        clone.inputs[2].sequence = 0;
    });
    assert_eq!(digest, expected);
}

#[test]
fn test_sighash_single_truncates_and_blanks_outputs() {
    let tx = sample_tx(3, 3);
    let subscript = p2pkh_script(&[0x7f; 20]);

    let digest = signature_hash(&tx, 1, &subscript, SIGHASH_SINGLE);
    let expected = expected_digest(&tx, 1, &subscript, SIGHASH_SINGLE, |clone| {
        clone.outputs.truncate(2);
        clone.outputs[0] = TransactionOutput::sentinel();
        clone.inputs[0].sequence = 0;
        clone.inputs[2].sequence = 0;
    });
    assert_eq!(digest, expected);
}

#[test]
fn test_sighash_single_anyone_can_pay() {
    // Input 1 of a 3-in 2-out transaction: the projection keeps exactly
    // one input and two outputs, the first of which is the sentinel.
    let tx = sample_tx(3, 2);
    let subscript = p2pkh_script(&[0x7f; 20]);
    let sighash_type = SIGHASH_SINGLE | SIGHASH_ANYONECANPAY;

    let digest = signature_hash(&tx, 1, &subscript, sighash_type);

    let mut clone = tx.clone();
    clone.inputs = vec![clone.inputs[1].clone()];
    clone.inputs[0].script_sig = subscript.clone();
    clone.outputs = vec![TransactionOutput::sentinel(), clone.outputs[1].clone()];
    let mut bytes = clone.to_bytes();
    bytes.extend_from_slice(&sighash_type.to_le_bytes());
    assert_eq!(digest, sha256d(&bytes));
}

#[test]
fn test_sighash_anyone_can_pay_keeps_only_signed_input() {
    let tx = sample_tx(3, 2);
    let subscript = p2pkh_script(&[0x7f; 20]);
    let sighash_type = SIGHASH_ALL | SIGHASH_ANYONECANPAY;

    let digest = signature_hash(&tx, 2, &subscript, sighash_type);

    let mut clone = tx.clone();
    clone.inputs = vec![clone.inputs[2].clone()];
    clone.inputs[0].script_sig = subscript.clone();
    let mut bytes = clone.to_bytes();
    bytes.extend_from_slice(&sighash_type.to_le_bytes());
    assert_eq!(digest, sha256d(&bytes));
}

#[test]
fn test_sighash_unrecognized_modes_behave_as_all() {
    let tx = sample_tx(2, 2);
    let subscript = p2pkh_script(&[0x7f; 20]);

    for sighash_type in [0u32, 4, 17, 31] {
        let digest = signature_hash(&tx, 0, &subscript, sighash_type);
        // Same reshaping as ALL, same (unrecognized) type appended.
        let expected = expected_digest(&tx, 0, &subscript, sighash_type, |_| {});
        assert_eq!(digest, expected, "mode {}", sighash_type);
    }
}

#[test]
fn test_sighash_strips_code_separators() {
    let tx = sample_tx(1, 1);
    let with_separator = Script::from_ops(&[
        ScriptOp::Code(OP_DUP),
        ScriptOp::Code(OP_CODESEPARATOR),
        ScriptOp::Code(OP_CHECKSIG),
    ]);
    let without = Script::from_bytes(&[OP_DUP, OP_CHECKSIG]);

    assert_eq!(
        signature_hash(&tx, 0, &with_separator, SIGHASH_ALL),
        signature_hash(&tx, 0, &without, SIGHASH_ALL)
    );
}

// -----------------------------------------------------------------------
// Signature combination
// -----------------------------------------------------------------------

#[test]
fn test_combine_multisig_merges_partial_signers() {
    let keys = vec![compressed_key(0xA1), compressed_key(0xB2), compressed_key(0xC3)];
    let script_pubkey = btc_script::Template::Multisig {
        required: 2,
        pubkeys: keys,
    }
    .to_script();

    let sig_a = fake_sig(0xA1);
    let sig_b = fake_sig(0xB2);
    let tx = sample_tx(1, 1);

    // One signer produced [OP_0, sig_a, OP_0], the other [OP_0, OP_0, sig_b].
    let first = Script::from_ops(&[ScriptOp::Small(0), push_for(&sig_a), ScriptOp::Small(0)]);
    let second = Script::from_ops(&[ScriptOp::Small(0), ScriptOp::Small(0), push_for(&sig_b)]);

    let combined =
        combine_signatures(&FillVerifier, &tx, 0, &script_pubkey, &first, &second)
            .expect("combine should succeed");
    assert_eq!(
        combined,
        Script::from_ops(&[ScriptOp::Small(0), push_for(&sig_a), push_for(&sig_b)])
    );
}

#[test]
fn test_combine_multisig_pads_missing_slots() {
    let keys = vec![compressed_key(0xA1), compressed_key(0xB2), compressed_key(0xC3)];
    let script_pubkey = btc_script::Template::Multisig {
        required: 2,
        pubkeys: keys,
    }
    .to_script();

    let sig_b = fake_sig(0xB2);
    let tx = sample_tx(1, 1);
    let first = Script::from_ops(&[ScriptOp::Small(0), push_for(&sig_b)]);
    let second = Script::from_ops(&[ScriptOp::Small(0)]);

    let combined =
        combine_signatures(&FillVerifier, &tx, 0, &script_pubkey, &first, &second)
            .expect("combine should succeed");
    // One signature found, one slot padded, plus the extra leading OP_0.
    assert_eq!(
        combined,
        Script::from_ops(&[ScriptOp::Small(0), push_for(&sig_b), ScriptOp::Small(0)])
    );
}

#[test]
fn test_combine_multisig_requires_multisig_script() {
    let tx = sample_tx(1, 1);
    let p2pkh = p2pkh_script(&[0x55; 20]);
    match combine_multisig(&FillVerifier, &tx, 0, &p2pkh, &Script::new(), &Script::new()) {
        Err(TransactionError::InvalidMultisigParams) => {}
        other => panic!("expected InvalidMultisigParams, got {:?}", other),
    }
}

#[test]
fn test_combine_p2pkh_prefers_signed_candidate() {
    let tx = sample_tx(1, 1);
    let script_pubkey = p2pkh_script(&[0x55; 20]);

    let key = compressed_key(0xA1);
    let signed = Script::from_ops(&[push_for(&fake_sig(0xA1)), push_for(&key)]);
    let unsigned = Script::from_ops(&[ScriptOp::Small(0), push_for(&key)]);

    let combined =
        combine_signatures(&FillVerifier, &tx, 0, &script_pubkey, &signed, &unsigned)
            .expect("combine should succeed");
    assert_eq!(combined, signed);

    let combined =
        combine_signatures(&FillVerifier, &tx, 0, &script_pubkey, &unsigned, &signed)
            .expect("combine should succeed");
    assert_eq!(combined, signed);
}

#[test]
fn test_combine_p2sh_recurses_on_redeem_script() {
    let tx = sample_tx(1, 1);
    let redeem = btc_script::Template::Multisig {
        required: 1,
        pubkeys: vec![compressed_key(0xA1)],
    }
    .to_script();
    let script_pubkey = btc_script::template::p2sh_script(
        &btc_primitives::hash::hash160(redeem.to_bytes()),
    );

    let sig = fake_sig(0xA1);
    let first = Script::from_ops(&[
        ScriptOp::Small(0),
        push_for(&sig),
        push_for(redeem.to_bytes()),
    ]);
    let second = Script::from_ops(&[ScriptOp::Small(0), push_for(redeem.to_bytes())]);

    let combined =
        combine_signatures(&FillVerifier, &tx, 0, &script_pubkey, &first, &second)
            .expect("combine should succeed");
    assert_eq!(
        combined,
        Script::from_ops(&[
            ScriptOp::Small(0),
            push_for(&sig),
            push_for(redeem.to_bytes()),
        ])
    );
}

#[test]
fn test_combine_p2sh_rejects_mismatched_redeem() {
    let tx = sample_tx(1, 1);
    let redeem_a = btc_script::Template::Multisig {
        required: 1,
        pubkeys: vec![compressed_key(0xA1)],
    }
    .to_script();
    let redeem_b = btc_script::Template::Multisig {
        required: 1,
        pubkeys: vec![compressed_key(0xB2)],
    }
    .to_script();
    let script_pubkey = btc_script::template::p2sh_script(
        &btc_primitives::hash::hash160(redeem_a.to_bytes()),
    );

    let first = Script::from_ops(&[ScriptOp::Small(0), push_for(redeem_a.to_bytes())]);
    let second = Script::from_ops(&[ScriptOp::Small(0), push_for(redeem_b.to_bytes())]);

    match combine_signatures(&FillVerifier, &tx, 0, &script_pubkey, &first, &second) {
        Err(TransactionError::UnsupportedTemplate) => {}
        other => panic!("expected UnsupportedTemplate, got {:?}", other),
    }
}

#[test]
fn test_combine_unrecognized_keeps_fuller_candidate() {
    let tx = sample_tx(1, 1);
    let script_pubkey = Script::from_bytes(&[OP_NOP]);

    let fuller = Script::from_ops(&[push_for(b"one"), push_for(b"two")]);
    let sparser = Script::from_ops(&[push_for(b"one")]);

    let combined =
        combine_signatures(&FillVerifier, &tx, 0, &script_pubkey, &sparser, &fuller)
            .expect("combine should succeed");
    assert_eq!(combined, fuller);

    // Ties keep the first candidate.
    let other = Script::from_ops(&[push_for(b"aaa"), push_for(b"bbb")]);
    let combined =
        combine_signatures(&FillVerifier, &tx, 0, &script_pubkey, &fuller, &other)
            .expect("combine should succeed");
    assert_eq!(combined, fuller);
}
