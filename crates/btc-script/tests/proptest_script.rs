use proptest::prelude::*;

use btc_script::op::{push_for, ScriptOp, ScriptReader};
use btc_script::opcodes::OP_CODESEPARATOR;
use btc_script::{OpPredicate, Script};

fn read_all(bytes: &[u8]) -> Vec<ScriptOp> {
    let mut reader = ScriptReader::new(bytes);
    let mut ops = Vec::new();
    while let Some(op) = reader.read_next() {
        ops.push(op);
    }
    ops
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn script_bytes_are_opaque(data in prop::collection::vec(any::<u8>(), 0..512)) {
        let script = Script::from_bytes(&data);
        prop_assert_eq!(script.to_bytes(), &data[..]);
    }

    #[test]
    fn script_hex_roundtrip(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let script = Script::from_bytes(&data);
        let script2 = Script::from_hex(&script.to_hex()).unwrap();
        prop_assert_eq!(script, script2);
    }

    // A cleanly parsing buffer re-encodes to itself, op by op.
    #[test]
    fn clean_parse_reencodes_identically(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let ops = read_all(&data);
        if !ops.contains(&ScriptOp::Invalid) {
            let reencoded: Vec<u8> = ops.iter().flat_map(|op| op.to_bytes()).collect();
            prop_assert_eq!(reencoded, data);
        }
    }

    // decode(encode(op)) == op for every canonical push.
    #[test]
    fn canonical_push_roundtrip(data in prop::collection::vec(any::<u8>(), 0..600)) {
        let op = push_for(&data);
        let encoded = op.to_bytes();
        let decoded = read_all(&encoded);
        prop_assert_eq!(decoded, vec![op]);
    }

    // Every canonical encoder output passes the canonical-push check.
    #[test]
    fn canonical_push_is_accepted(data in prop::collection::vec(any::<u8>(), 0..600)) {
        let script = Script::from_ops(&[push_for(&data)]);
        prop_assert!(script.has_canonical_pushes());
        prop_assert!(script.is_push_only());
        prop_assert!(script.is_valid());
    }

    // find_and_delete leaves no matching op and counts every match.
    #[test]
    fn find_and_delete_law(
        data in prop::collection::vec(any::<u8>(), 0..128),
        seed in prop::collection::vec(any::<u8>(), 1..8),
    ) {
        let script = Script::from_bytes(&data);
        let pred = OpPredicate::pushed(&seed);
        let before = script
            .ops()
            .iter()
            .filter(|op| pred.matches(op))
            .count();
        let (stripped, count) = script.find_and_delete(&pred);
        prop_assert_eq!(count, before);
        prop_assert_eq!(
            stripped.ops().iter().filter(|op| pred.matches(op)).count(),
            0
        );
        if count == 0 {
            prop_assert_eq!(stripped, script);
        }
    }

    // Codeseparator deletion specifically, over arbitrary valid scripts.
    #[test]
    fn codeseparator_never_survives(data in prop::collection::vec(any::<u8>(), 0..128)) {
        let script = Script::from_bytes(&data);
        let pred = OpPredicate::opcode(OP_CODESEPARATOR);
        let (stripped, _) = script.find_and_delete(&pred);
        prop_assert_eq!(
            stripped.ops().iter().filter(|op| pred.matches(op)).count(),
            0
        );
    }

    // The reader is deterministic over a fixed buffer.
    #[test]
    fn reader_is_deterministic(data in prop::collection::vec(any::<u8>(), 0..256)) {
        prop_assert_eq!(read_all(&data), read_all(&data));
    }
}
