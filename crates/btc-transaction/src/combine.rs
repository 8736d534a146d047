//! Partial signature combination.
//!
//! Merges two candidate spending scripts for the same input into one at
//! least as satisfying as either. The interesting case is multisig,
//! where independent signers each produce a script carrying their own
//! signature and placeholders, and the combined script must order the
//! collected signatures by public key declaration order.
//!
//! Elliptic-curve verification is external: callers supply a
//! `SignatureVerifier` and this module only decides placement.

use btc_script::op::{push_for, ScriptOp, ScriptReader};
use btc_script::{Script, ScriptBuilder, Template};

use crate::transaction::Transaction;
use crate::TransactionError;

/// External signature verification seam.
///
/// Implementations check one candidate signature against one public key
/// for the digest the subscript and hash type imply.
pub trait SignatureVerifier {
    /// Return true if `sig` is a valid signature by `pubkey` over the
    /// digest for `input_index` of `tx` spending into `subscript`.
    fn check(
        &self,
        sig: &[u8],
        pubkey: &[u8],
        subscript: &Script,
        tx: &Transaction,
        input_index: usize,
    ) -> bool;
}

/// Merge two candidate spending scripts against a locking script.
///
/// Recognition drives the strategy:
/// - null-data and unrecognized shapes keep the candidate with more
///   pushed items (ties keep the first);
/// - P2PK and P2PKH keep the first candidate that actually carries a
///   signature;
/// - P2SH candidates must agree on the redeem script; their inner
///   stacks are combined recursively against it;
/// - multisig collects every pushed item of both candidates as a
///   candidate signature and assigns the first that verifies to each
///   public key in declaration order.
///
/// The result is deterministic given the inputs.
///
/// # Arguments
/// * `verifier`      - External signature verification.
/// * `tx`            - The spending transaction.
/// * `input_index`   - The input being satisfied.
/// * `script_pubkey` - The locking script both candidates target.
/// * `first`         - The preferred candidate.
/// * `second`        - The other candidate.
///
/// # Returns
/// The combined spending script, or an error for P2SH candidates with
/// mismatched redeem scripts.
pub fn combine_signatures<V: SignatureVerifier>(
    verifier: &V,
    tx: &Transaction,
    input_index: usize,
    script_pubkey: &Script,
    first: &Script,
    second: &Script,
) -> Result<Script, TransactionError> {
    match Template::match_script(script_pubkey) {
        None | Some(Template::NullData { .. }) => Ok(keep_fuller(first, second)),
        Some(Template::P2pk { .. }) | Some(Template::P2pkh { .. }) => {
            Ok(keep_signed(first, second))
        }
        Some(Template::P2sh { .. }) => {
            combine_p2sh(verifier, tx, input_index, first, second)
        }
        Some(Template::Multisig { .. }) => {
            combine_multisig(verifier, tx, input_index, script_pubkey, first, second)
        }
    }
}

/// Merge two multisig spending scripts against a multisig locking
/// script.
///
/// # Returns
/// The combined script, or `InvalidMultisigParams` if `script_pubkey`
/// does not parse as multisig.
pub fn combine_multisig<V: SignatureVerifier>(
    verifier: &V,
    tx: &Transaction,
    input_index: usize,
    script_pubkey: &Script,
    first: &Script,
    second: &Script,
) -> Result<Script, TransactionError> {
    let (required, pubkeys) = match Template::match_script(script_pubkey) {
        Some(Template::Multisig { required, pubkeys }) => (required, pubkeys),
        _ => return Err(TransactionError::InvalidMultisigParams),
    };

    // Every non-empty pushed item of either candidate is a candidate
    // signature; placeholders (OP_0) drop out here.
    let mut candidates: Vec<Vec<u8>> = Vec::new();
    for script in [first, second] {
        for op in script.ops() {
            if let Some(data) = op.pushed_bytes() {
                if !data.is_empty() && !candidates.contains(&data) {
                    candidates.push(data);
                }
            }
        }
    }

    // Assign signatures to keys in declaration order until m are found.
    let mut sigs: Vec<&Vec<u8>> = Vec::new();
    for pubkey in &pubkeys {
        if sigs.len() == required {
            break;
        }
        if let Some(sig) = candidates.iter().find(|sig| {
            !sigs.iter().any(|taken| taken == sig)
                && verifier.check(sig, pubkey, script_pubkey, tx, input_index)
        }) {
            sigs.push(sig);
        }
    }

    // CHECKMULTISIG pops one element more than it verifies; the leading
    // OP_0 feeds that extra pop.
    let mut builder = ScriptBuilder::new().small_int(0);
    for sig in &sigs {
        builder = builder.push_data(sig);
    }
    for _ in sigs.len()..required {
        builder = builder.small_int(0);
    }
    Ok(builder.into_script())
}

/// Merge two P2SH spending scripts: both must end with the same redeem
/// push; the stacks before it combine recursively against the redeem
/// script, which is then re-appended.
fn combine_p2sh<V: SignatureVerifier>(
    verifier: &V,
    tx: &Transaction,
    input_index: usize,
    first: &Script,
    second: &Script,
) -> Result<Script, TransactionError> {
    let (first_stack, first_redeem) =
        split_redeem(first).ok_or(TransactionError::UnsupportedTemplate)?;
    let (second_stack, second_redeem) =
        split_redeem(second).ok_or(TransactionError::UnsupportedTemplate)?;
    if first_redeem != second_redeem {
        return Err(TransactionError::UnsupportedTemplate);
    }

    let redeem_script = Script::from_bytes(&first_redeem);
    let inner = combine_signatures(
        verifier,
        tx,
        input_index,
        &redeem_script,
        &first_stack,
        &second_stack,
    )?;

    let mut bytes = inner.to_bytes().to_vec();
    bytes.extend_from_slice(&push_for(&first_redeem).to_bytes());
    Ok(Script::from_vec(bytes))
}

/// Split a spending script into everything before its last push and the
/// bytes of that push.
fn split_redeem(script: &Script) -> Option<(Script, Vec<u8>)> {
    let mut reader = ScriptReader::new(script.to_bytes());
    let mut last_start = 0;
    let mut last_op = None;
    loop {
        let start = reader.position();
        match reader.read_next() {
            Some(op) => {
                last_start = start;
                last_op = Some(op);
            }
            None => break,
        }
    }
    match last_op {
        Some(ScriptOp::Push { data, .. }) => Some((
            Script::from_bytes(&script.to_bytes()[..last_start]),
            data,
        )),
        _ => None,
    }
}

/// The candidate with more pushed items; ties keep the first.
fn keep_fuller(first: &Script, second: &Script) -> Script {
    let pushes = |s: &Script| s.ops().iter().filter(|op| op.is_push()).count();
    if pushes(first) >= pushes(second) {
        first.clone()
    } else {
        second.clone()
    }
}

/// The first candidate whose leading push is non-empty, else the
/// second.
fn keep_signed(first: &Script, second: &Script) -> Script {
    let signed = first
        .ops()
        .first()
        .and_then(|op| op.pushed_bytes())
        .map_or(false, |data| !data.is_empty());
    if signed {
        first.clone()
    } else {
        second.clone()
    }
}
