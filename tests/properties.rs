use journal_normalizer::{
    aggregate::aggregate,
    data::RawTable,
    normalize::normalize,
    pipeline::process_table,
    registry::{ColumnMapping, SchemaRegistry},
};
use proptest::prelude::*;

fn mapping() -> ColumnMapping {
    ColumnMapping::new("generated")
        .with_alias("伝票番号", "伝票No")
        .with_alias("借方科目", "要素内訳借方勘定科目コード")
        .with_alias("貸方科目", "要素内訳貸方勘定科目コード")
        .with_alias("金額", "借方金額")
}

fn ledger_row() -> impl Strategy<Value = Vec<String>> {
    (
        1u32..20,
        prop_oneof![Just("100"), Just("200"), Just("300")],
        prop_oneof![Just(""), Just("0"), Just("400"), Just("500")],
        prop_oneof![
            4 => (-100_000i64..100_000).prop_map(|v| v.to_string()),
            1 => Just(String::new()),
            1 => Just("n/a".to_string()),
        ],
    )
        .prop_map(|(voucher, debit, credit, amount)| {
            vec![voucher.to_string(), debit.to_string(), credit.to_string(), amount]
        })
}

fn ledger(rows: Vec<Vec<String>>) -> RawTable {
    RawTable::from_strings(["伝票番号", "借方科目", "貸方科目", "金額"], rows)
}

proptest! {
    #[test]
    fn generated_ledgers_always_reconcile(rows in prop::collection::vec(ledger_row(), 1..60)) {
        let registry = SchemaRegistry::from_mappings(vec![mapping()]);
        let raw = ledger(rows);
        let outcome = process_table(&registry, &raw, "generated.csv").expect("pipeline");
        prop_assert!(outcome.report.passed(), "{:?}", outcome.report.reconciliation);
        let output = outcome.output.expect("output table");
        // One row per combination plus the totals row.
        let recon = outcome.report.reconciliation.expect("reconciliation");
        prop_assert_eq!(output.rows.len(), recon.pre_combinations + 1);
    }

    #[test]
    fn aggregated_total_matches_parseable_input(rows in prop::collection::vec(ledger_row(), 1..60)) {
        let expected = rows
            .iter()
            .filter_map(|row| row[3].parse::<i64>().ok())
            .sum::<i64>() as f64;
        let normalized = normalize(&ledger(rows), &mapping());
        let aggregation = aggregate(&normalized.table).expect("aggregate");
        let total = aggregation
            .total_for(journal_normalizer::columns::CanonicalColumn::DebitAmount)
            .expect("debit total");
        prop_assert_eq!(total, expected);
    }

    #[test]
    fn groups_come_out_strictly_ordered(rows in prop::collection::vec(ledger_row(), 1..60)) {
        let row_count = rows.len();
        let normalized = normalize(&ledger(rows), &mapping());
        let aggregation = aggregate(&normalized.table).expect("aggregate");
        prop_assert!(aggregation.group_count() <= row_count);
        for pair in aggregation.rows.windows(2) {
            prop_assert!(pair[0].key < pair[1].key);
        }
    }
}
