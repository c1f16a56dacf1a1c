//! Renames a raw ledger onto canonical columns and cleans it up.
//!
//! Steps, in order:
//!
//! 1. keep only input columns the format maps onto a canonical column;
//! 2. treat a literal `0` in the credit account/sub-account code as missing;
//! 3. stable-sort by year, month, day and voucher number (whichever exist);
//! 4. forward-fill the credit-side hierarchy over the sorted rows;
//! 5. coerce amount columns to numbers, unparseable cells becoming missing.

use log::debug;

use crate::{
    columns::{
        ALL_COLUMNS, AMOUNT_COLUMNS, CREDIT_HIERARCHY_COLUMNS, CanonicalColumn, ORDERING_COLUMNS,
        ZERO_SENTINEL_COLUMNS,
    },
    data::{Cell, RawTable},
    error::JournalError,
    registry::ColumnMapping,
};

/// Rows keyed by canonical column; `rows[i][j]` belongs to `columns[j]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalTable {
    pub columns: Vec<CanonicalColumn>,
    pub rows: Vec<Vec<Cell>>,
}

impl CanonicalTable {
    pub fn column_index(&self, column: CanonicalColumn) -> Option<usize> {
        self.columns.iter().position(|c| *c == column)
    }

    pub fn has(&self, column: CanonicalColumn) -> bool {
        self.column_index(column).is_some()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Cells of one column in row order, or `None` when the column is absent.
    pub fn column_values(&self, column: CanonicalColumn) -> Option<impl Iterator<Item = &Cell>> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeSummary {
    /// Input header → canonical column, for columns kept.
    pub renamed: Vec<(String, CanonicalColumn)>,
    /// Input headers dropped because the format does not map them onto the
    /// vocabulary, or because an earlier header already supplies their target.
    pub dropped: Vec<String>,
    pub sorted_by: Vec<CanonicalColumn>,
    pub zero_sentinels: usize,
    pub forward_filled: usize,
    pub coercion_failures: Vec<JournalError>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub table: CanonicalTable,
    pub summary: NormalizeSummary,
}

pub fn normalize(raw: &RawTable, mapping: &ColumnMapping) -> Normalized {
    let mut summary = NormalizeSummary::default();
    let sources = resolve_sources(raw, mapping, &mut summary);
    let columns = sources.iter().map(|(column, _)| *column).collect::<Vec<_>>();

    // Source row index travels with each row so warnings can name the input line.
    let mut rows = raw
        .rows
        .iter()
        .enumerate()
        .map(|(row_idx, raw_row)| {
            let cells = sources
                .iter()
                .map(|(_, src)| raw_row.get(*src).cloned().unwrap_or_default())
                .collect::<Vec<_>>();
            (row_idx, cells)
        })
        .collect::<Vec<_>>();

    for column in ZERO_SENTINEL_COLUMNS {
        if let Some(idx) = position(&columns, column) {
            for (_, row) in rows.iter_mut() {
                if row[idx].is_zero_sentinel() {
                    row[idx] = Cell::Missing;
                    summary.zero_sentinels += 1;
                }
            }
        }
    }

    let sort_keys = ORDERING_COLUMNS
        .into_iter()
        .filter_map(|column| position(&columns, column).map(|idx| (column, idx)))
        .collect::<Vec<_>>();
    if !sort_keys.is_empty() {
        rows.sort_by(|(_, a), (_, b)| {
            sort_keys
                .iter()
                .map(|(_, idx)| a[*idx].cmp(&b[*idx]))
                .find(|ord| ord.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        summary.sorted_by = sort_keys.iter().map(|(column, _)| *column).collect();
    }

    for column in CREDIT_HIERARCHY_COLUMNS {
        if let Some(idx) = position(&columns, column) {
            summary.forward_filled += forward_fill(&mut rows, idx);
        }
    }

    for column in AMOUNT_COLUMNS {
        if let Some(idx) = position(&columns, column) {
            for (row_idx, row) in rows.iter_mut() {
                let cell = &mut row[idx];
                if cell.is_missing() {
                    continue;
                }
                match cell.to_number() {
                    Some(value) => *cell = Cell::Number(value),
                    None => {
                        summary
                            .coercion_failures
                            .push(JournalError::NumericCoercionFailure {
                                row: *row_idx + 2,
                                column: column.name().to_string(),
                                value: cell.as_display(),
                            });
                        *cell = Cell::Missing;
                    }
                }
            }
        }
    }

    debug!(
        "Normalized {} row(s): {} sentinel(s) cleared, {} cell(s) forward-filled, {} coercion failure(s)",
        rows.len(),
        summary.zero_sentinels,
        summary.forward_filled,
        summary.coercion_failures.len()
    );

    Normalized {
        table: CanonicalTable {
            columns,
            rows: rows.into_iter().map(|(_, row)| row).collect(),
        },
        summary,
    }
}

/// Canonical columns present in the input, in vocabulary order, with the
/// input column each one is read from. The first input column wins when two
/// map onto the same canonical column.
fn resolve_sources(
    raw: &RawTable,
    mapping: &ColumnMapping,
    summary: &mut NormalizeSummary,
) -> Vec<(CanonicalColumn, usize)> {
    let mut found: Vec<(CanonicalColumn, usize)> = Vec::new();
    for (idx, header) in raw.headers.iter().enumerate() {
        let canonical = mapping.target(header).and_then(CanonicalColumn::from_name);
        match canonical {
            Some(column) if !found.iter().any(|(c, _)| *c == column) => {
                found.push((column, idx));
                summary.renamed.push((header.clone(), column));
            }
            Some(column) => {
                debug!("Ignoring '{header}': '{column}' is already supplied by an earlier column");
                summary.dropped.push(header.clone());
            }
            None => summary.dropped.push(header.clone()),
        }
    }
    found.sort_by_key(|(column, _)| ALL_COLUMNS.iter().position(|c| c == column));
    found
}

fn position(columns: &[CanonicalColumn], column: CanonicalColumn) -> Option<usize> {
    columns.iter().position(|c| *c == column)
}

/// Carries the last present value down the column; returns cells filled.
fn forward_fill(rows: &mut [(usize, Vec<Cell>)], idx: usize) -> usize {
    let mut last: Option<Cell> = None;
    let mut filled = 0;
    for (_, row) in rows.iter_mut() {
        if row[idx].is_missing() {
            if let Some(value) = &last {
                row[idx] = value.clone();
                filled += 1;
            }
        } else {
            last = Some(row[idx].clone());
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::CanonicalColumn::*;

    fn mapping() -> ColumnMapping {
        ColumnMapping::new("test")
            .with_alias("日付", "日")
            .with_alias("伝票番号", "伝票No")
            .with_alias("借方科目", "要素内訳借方勘定科目コード")
            .with_alias("貸方科目", "要素内訳貸方勘定科目コード")
            .with_alias("貸方科目名", "要素内訳貸方勘定科目名称")
            .with_alias("貸方補助", "要素内訳貸方補助科目コード")
            .with_alias("金額", "借方金額")
            .with_alias("摘要", "摘要")
    }

    fn cell(table: &CanonicalTable, row: usize, column: CanonicalColumn) -> &Cell {
        &table.rows[row][table.column_index(column).expect("column present")]
    }

    #[test]
    fn unmapped_and_non_canonical_columns_are_dropped() {
        let raw = RawTable::from_strings(
            ["金額", "備考", "摘要", "借方科目"],
            [vec!["100", "x", "memo", "100"]],
        );
        let normalized = normalize(&raw, &mapping());
        assert_eq!(
            normalized.table.columns,
            vec![DebitAccountCode, DebitAmount]
        );
        assert_eq!(normalized.summary.dropped, vec!["備考", "摘要"]);
        assert_eq!(normalized.table.rows[0], vec![Cell::Number(100.0), Cell::Number(100.0)]);
    }

    #[test]
    fn forward_fill_carries_credit_code_down() {
        let raw = RawTable::from_strings(
            ["貸方科目", "金額"],
            [vec!["A", "1"], vec!["", "2"], vec!["", "3"]],
        );
        let normalized = normalize(&raw, &mapping());
        for row in 0..3 {
            assert_eq!(cell(&normalized.table, row, CreditAccountCode), &Cell::text("A"));
        }
        assert_eq!(normalized.summary.forward_filled, 2);
    }

    #[test]
    fn leading_missing_stays_missing() {
        let raw = RawTable::from_strings(["貸方科目名"], [vec![""], vec!["売上"], vec![""]]);
        let normalized = normalize(&raw, &mapping());
        assert_eq!(cell(&normalized.table, 0, CreditAccountName), &Cell::Missing);
        assert_eq!(cell(&normalized.table, 2, CreditAccountName), &Cell::text("売上"));
    }

    #[test]
    fn zero_sentinel_is_cleared_then_filled() {
        let raw = RawTable::new(
            vec!["貸方科目".into(), "貸方補助".into()],
            vec![
                vec![Cell::text("4100"), Cell::text("0")],
                vec![Cell::Number(0.0), Cell::Number(0.0)],
            ],
        );
        let normalized = normalize(&raw, &mapping());
        assert_eq!(normalized.summary.zero_sentinels, 3);
        assert_eq!(cell(&normalized.table, 1, CreditAccountCode), &Cell::text("4100"));
        assert_eq!(cell(&normalized.table, 0, CreditSubAccountCode), &Cell::Missing);
        assert_eq!(cell(&normalized.table, 1, CreditSubAccountCode), &Cell::Missing);
    }

    #[test]
    fn zero_in_debit_code_is_kept() {
        let raw = RawTable::from_strings(["借方科目"], [vec!["0"]]);
        let normalized = normalize(&raw, &mapping());
        assert_eq!(cell(&normalized.table, 0, DebitAccountCode), &Cell::Number(0.0));
    }

    #[test]
    fn rows_are_sorted_before_forward_fill() {
        let raw = RawTable::from_strings(
            ["日付", "伝票番号", "貸方科目"],
            [
                vec!["2", "1", ""],
                vec!["1", "2", "B"],
                vec!["1", "1", "A"],
                vec!["10", "1", ""],
            ],
        );
        let normalized = normalize(&raw, &mapping());
        let table = &normalized.table;
        assert_eq!(normalized.summary.sorted_by, vec![Day, VoucherNo]);
        let days = table
            .column_values(Day)
            .unwrap()
            .map(|c| c.as_display())
            .collect::<Vec<_>>();
        assert_eq!(days, vec!["1", "1", "2", "10"]);
        let codes = table
            .column_values(CreditAccountCode)
            .unwrap()
            .map(|c| c.as_display())
            .collect::<Vec<_>>();
        assert_eq!(codes, vec!["A", "B", "B", "B"]);
    }

    #[test]
    fn unparseable_amounts_become_missing_with_warning() {
        let raw = RawTable::from_strings(["金額"], [vec!["1,200"], vec!["abc"], vec![""]]);
        let normalized = normalize(&raw, &mapping());
        let amounts = normalized
            .table
            .column_values(DebitAmount)
            .unwrap()
            .cloned()
            .collect::<Vec<_>>();
        assert_eq!(amounts, vec![Cell::Number(1200.0), Cell::Missing, Cell::Missing]);
        assert_eq!(
            normalized.summary.coercion_failures,
            vec![JournalError::NumericCoercionFailure {
                row: 3,
                column: "借方金額".into(),
                value: "abc".into(),
            }]
        );
    }

    #[test]
    fn first_input_column_wins_duplicate_targets() {
        let mapping = ColumnMapping::new("dup")
            .with_alias("金額", "借方金額")
            .with_alias("金額2", "借方金額");
        let raw = RawTable::from_strings(["金額", "金額2"], [vec!["5", "7"]]);
        let normalized = normalize(&raw, &mapping);
        assert_eq!(normalized.table.rows[0], vec![Cell::Number(5.0)]);
        assert_eq!(normalized.summary.dropped, vec!["金額2"]);
    }
}
