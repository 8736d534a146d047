use proptest::prelude::*;

use btc_script::Script;
use btc_transaction::{Transaction, TransactionInput, TransactionOutput};

prop_compose! {
    fn arb_input()(
        txid in prop::array::uniform32(any::<u8>()),
        vout in any::<u32>(),
        script in prop::collection::vec(any::<u8>(), 0..64),
        sequence in any::<u32>(),
    ) -> TransactionInput {
        TransactionInput {
            prev_txid: txid,
            prev_vout: vout,
            script_sig: Script::from_vec(script),
            sequence,
        }
    }
}

prop_compose! {
    fn arb_output()(
        value in 0i64..21_000_000 * 100_000_000,
        script in prop::collection::vec(any::<u8>(), 0..64),
    ) -> TransactionOutput {
        TransactionOutput {
            value,
            script_pubkey: Script::from_vec(script),
        }
    }
}

prop_compose! {
    fn arb_tx()(
        version in 1u32..=2,
        inputs in prop::collection::vec(arb_input(), 0..4),
        outputs in prop::collection::vec(arb_output(), 0..4),
        lock_time in any::<u32>(),
    ) -> Transaction {
        Transaction { version, inputs, outputs, lock_time }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn tx_bytes_roundtrip(tx in arb_tx()) {
        let bytes = tx.to_bytes();
        let parsed = Transaction::from_bytes(&bytes).unwrap();
        prop_assert_eq!(&parsed, &tx);
        prop_assert_eq!(parsed.to_bytes(), bytes);
    }

    #[test]
    fn tx_hex_roundtrip(tx in arb_tx()) {
        let parsed = Transaction::from_hex(&tx.to_hex()).unwrap();
        prop_assert_eq!(parsed, tx);
    }

    #[test]
    fn txid_is_stable(tx in arb_tx()) {
        prop_assert_eq!(tx.tx_id(), Transaction::from_bytes(&tx.to_bytes()).unwrap().tx_id());
    }
}
