use std::collections::BTreeMap;

use log::debug;

use crate::{
    columns::CanonicalColumn,
    data::Cell,
    error::JournalError,
    normalize::CanonicalTable,
};

/// Values of the group-key columns for one bucket. Missing is a regular,
/// comparable component.
pub type GroupKey = Vec<Cell>;

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRow {
    pub key: GroupKey,
    /// One sum per amount column, aligned with [`Aggregation::amount_columns`].
    pub sums: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub key_columns: Vec<CanonicalColumn>,
    pub amount_columns: Vec<CanonicalColumn>,
    pub rows: Vec<AggregatedRow>,
    /// Grand total per amount column across `rows`.
    pub totals: Vec<f64>,
}

/// Final table handed to the writer: groups followed by the totals row.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// Groups rows by every descriptive column present and sums the amount
/// columns present. Groups come out in ascending key order, missing last.
pub fn aggregate(table: &CanonicalTable) -> Result<Aggregation, JournalError> {
    let key_idx = indexed(table, |c| c.is_descriptive());
    if key_idx.is_empty() {
        return Err(JournalError::NoEligibleGroupColumns {
            columns: table.columns.iter().map(|c| c.name().to_string()).collect(),
        });
    }
    let amount_idx = indexed(table, |c| c.is_amount());

    let mut groups: BTreeMap<GroupKey, Vec<f64>> = BTreeMap::new();
    for row in &table.rows {
        let key = key_idx.iter().map(|(_, idx)| row[*idx].clone()).collect();
        let sums = groups
            .entry(key)
            .or_insert_with(|| vec![0.0; amount_idx.len()]);
        for (slot, (_, idx)) in sums.iter_mut().zip(&amount_idx) {
            *slot += row[*idx].to_number().unwrap_or(0.0);
        }
    }

    let rows = groups
        .into_iter()
        .map(|(key, sums)| AggregatedRow { key, sums })
        .collect::<Vec<_>>();
    let totals = (0..amount_idx.len())
        .map(|i| rows.iter().map(|r| r.sums[i]).sum::<f64>())
        .collect();
    debug!(
        "Aggregated {} row(s) into {} group(s) over {} key column(s)",
        table.row_count(),
        rows.len(),
        key_idx.len()
    );

    Ok(Aggregation {
        key_columns: key_idx.into_iter().map(|(c, _)| c).collect(),
        amount_columns: amount_idx.into_iter().map(|(c, _)| c).collect(),
        rows,
        totals,
    })
}

fn indexed(
    table: &CanonicalTable,
    keep: impl Fn(CanonicalColumn) -> bool,
) -> Vec<(CanonicalColumn, usize)> {
    table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| keep(**c))
        .map(|(idx, c)| (*c, idx))
        .collect()
}

impl Aggregation {
    pub fn group_count(&self) -> usize {
        self.rows.len()
    }

    pub fn total_for(&self, column: CanonicalColumn) -> Option<f64> {
        let idx = self.amount_columns.iter().position(|c| *c == column)?;
        self.totals.get(idx).copied()
    }

    /// Key columns then amount columns (vocabulary order), plus a totals row
    /// whose descriptive cells are empty strings.
    pub fn to_output(&self) -> OutputTable {
        let headers = self
            .key_columns
            .iter()
            .chain(&self.amount_columns)
            .map(|c| c.name().to_string())
            .collect();
        let mut rows = self
            .rows
            .iter()
            .map(|row| {
                row.key
                    .iter()
                    .cloned()
                    .chain(row.sums.iter().map(|s| Cell::Number(*s)))
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        let totals_row = std::iter::repeat_with(|| Cell::text(""))
            .take(self.key_columns.len())
            .chain(self.totals.iter().map(|t| Cell::Number(*t)))
            .collect();
        rows.push(totals_row);
        OutputTable { headers, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::CanonicalColumn::*;

    fn n(value: f64) -> Cell {
        Cell::Number(value)
    }

    fn table(columns: Vec<CanonicalColumn>, rows: Vec<Vec<Cell>>) -> CanonicalTable {
        CanonicalTable { columns, rows }
    }

    #[test]
    fn sums_amounts_per_combination() {
        let t = table(
            vec![DebitAccountCode, CreditAccountCode, DebitAmount, CreditAmount],
            vec![
                vec!["100".into(), "200".into(), n(10.0), n(10.0)],
                vec!["100".into(), "200".into(), n(5.0), n(5.0)],
                vec!["100".into(), "300".into(), n(1.0), n(1.0)],
            ],
        );
        let agg = aggregate(&t).unwrap();
        assert_eq!(agg.key_columns, vec![DebitAccountCode, CreditAccountCode]);
        assert_eq!(agg.group_count(), 2);
        assert_eq!(agg.rows[0].sums, vec![15.0, 15.0]);
        assert_eq!(agg.rows[1].sums, vec![1.0, 1.0]);
        assert_eq!(agg.total_for(DebitAmount), Some(16.0));
    }

    #[test]
    fn missing_keys_group_together_and_sort_last() {
        let t = table(
            vec![DebitAccountCode, DebitDepartmentCode, DebitAmount],
            vec![
                vec!["100".into(), Cell::Missing, n(1.0)],
                vec!["100".into(), "D1".into(), n(2.0)],
                vec!["100".into(), Cell::Missing, n(4.0)],
            ],
        );
        let agg = aggregate(&t).unwrap();
        assert_eq!(agg.group_count(), 2);
        assert_eq!(agg.rows[0].key[1], Cell::text("D1"));
        assert_eq!(agg.rows[1].key[1], Cell::Missing);
        assert_eq!(agg.rows[1].sums, vec![5.0]);
    }

    #[test]
    fn missing_amounts_count_as_zero() {
        let t = table(
            vec![DebitAccountCode, DebitAmount],
            vec![
                vec!["1".into(), Cell::Missing],
                vec!["1".into(), n(3.0)],
            ],
        );
        let agg = aggregate(&t).unwrap();
        assert_eq!(agg.rows[0].sums, vec![3.0]);
    }

    #[test]
    fn no_descriptive_columns_is_reported() {
        let t = table(vec![DebitAmount, Day], vec![vec![n(1.0), n(1.0)]]);
        let err = aggregate(&t).unwrap_err();
        assert_eq!(
            err,
            JournalError::NoEligibleGroupColumns {
                columns: vec!["借方金額".into(), "日".into()],
            }
        );
    }

    #[test]
    fn ordering_columns_are_not_part_of_the_key() {
        let t = table(
            vec![DebitAccountCode, DebitAmount, Day],
            vec![
                vec!["1".into(), n(1.0), n(1.0)],
                vec!["1".into(), n(2.0), n(2.0)],
            ],
        );
        let agg = aggregate(&t).unwrap();
        assert_eq!(agg.group_count(), 1);
        assert_eq!(agg.to_output().headers, vec!["要素内訳借方勘定科目コード", "借方金額"]);
    }

    #[test]
    fn output_appends_totals_row_with_blank_descriptives() {
        let t = table(
            vec![DebitAccountCode, CreditAccountName, DebitAmount, CreditTaxAmount],
            vec![
                vec!["1".into(), "売上".into(), n(100.0), n(8.0)],
                vec!["2".into(), Cell::Missing, n(50.0), n(4.0)],
            ],
        );
        let output = aggregate(&t).unwrap().to_output();
        assert_eq!(output.rows.len(), 3);
        let totals = output.rows.last().unwrap();
        assert_eq!(
            totals,
            &vec![Cell::text(""), Cell::text(""), Cell::Number(150.0), Cell::Number(12.0)]
        );
    }

    #[test]
    fn table_without_amount_columns_still_groups() {
        let t = table(vec![DebitAccountCode], vec![vec!["1".into()], vec!["1".into()]]);
        let agg = aggregate(&t).unwrap();
        assert_eq!(agg.group_count(), 1);
        assert!(agg.totals.is_empty());
        assert_eq!(agg.to_output().rows.len(), 2);
    }
}
