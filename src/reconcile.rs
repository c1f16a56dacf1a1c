//! Cross-checks that aggregation neither dropped nor duplicated anything.

use std::collections::HashSet;

use serde::Serialize;

use crate::{
    aggregate::AggregatedRow,
    columns::CanonicalColumn,
    data::{Cell, format_number},
    error::JournalError,
    normalize::CanonicalTable,
};

pub const RELATIVE_TOLERANCE: f64 = 1e-5;
/// Absolute slack added to the relative bound. Totals where debits and
/// credits cancel land near zero with summation-order rounding noise.
pub const ABSOLUTE_TOLERANCE: f64 = 1e-8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmountCheck {
    pub column: CanonicalColumn,
    pub pre_total: f64,
    pub post_total: f64,
    pub matches: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationReport {
    pub pre_combinations: usize,
    pub post_combinations: usize,
    pub combinations_match: bool,
    pub amounts: Vec<AmountCheck>,
}

impl ReconciliationReport {
    pub fn passed(&self) -> bool {
        self.combinations_match && self.amounts.iter().all(|a| a.matches)
    }

    pub fn mismatches(&self) -> Vec<JournalError> {
        let mut found = Vec::new();
        if !self.combinations_match {
            found.push(JournalError::ReconciliationMismatch {
                check: "combination count".to_string(),
                pre: self.pre_combinations.to_string(),
                post: self.post_combinations.to_string(),
            });
        }
        for check in self.amounts.iter().filter(|a| !a.matches) {
            found.push(JournalError::ReconciliationMismatch {
                check: format!("{} total", check.column),
                pre: format_number(check.pre_total),
                post: format_number(check.post_total),
            });
        }
        found
    }
}

/// Compares the normalized rows against the aggregated groups.
///
/// `aggregated` must not contain the totals row. Each row's `sums` is read
/// positionally against `amount_columns`; a row with too few sums counts
/// nothing for the missing columns, which then shows up as a total mismatch.
/// A key column absent from `pre` would be missing on every row, so it is
/// left out of the distinct-key count without changing it.
pub fn reconcile(
    pre: &CanonicalTable,
    group_keys: &[CanonicalColumn],
    aggregated: &[AggregatedRow],
    amount_columns: &[CanonicalColumn],
) -> ReconciliationReport {
    let key_idx = group_keys
        .iter()
        .filter_map(|c| pre.column_index(*c))
        .collect::<Vec<_>>();
    let distinct = pre
        .rows
        .iter()
        .map(|row| key_idx.iter().map(|idx| &row[*idx]).collect::<Vec<&Cell>>())
        .collect::<HashSet<_>>();
    let pre_combinations = distinct.len();
    let post_combinations = aggregated.len();

    let amounts = amount_columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let pre_total = pre
                .column_values(*column)
                .map(|values| values.filter_map(Cell::to_number).sum::<f64>())
                .unwrap_or(0.0);
            let post_total = aggregated
                .iter()
                .filter_map(|row| row.sums.get(i))
                .sum::<f64>();
            AmountCheck {
                column: *column,
                pre_total,
                post_total,
                matches: totals_match(pre_total, post_total),
            }
        })
        .collect();

    ReconciliationReport {
        pre_combinations,
        post_combinations,
        combinations_match: pre_combinations == post_combinations,
        amounts,
    }
}

/// `|pre - post| <= ABSOLUTE_TOLERANCE + RELATIVE_TOLERANCE * |post|`.
pub fn totals_match(pre: f64, post: f64) -> bool {
    (pre - post).abs() <= ABSOLUTE_TOLERANCE + RELATIVE_TOLERANCE * post.abs()
}
