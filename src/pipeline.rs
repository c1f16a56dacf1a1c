//! Per-file pipeline: detect → normalize → aggregate → reconcile.
//!
//! [`process_table`] performs no I/O and shares no state between calls, so
//! each ledger file is processed independently of every other.

use itertools::Itertools;
use log::{info, warn};
use serde::Serialize;

use crate::{
    aggregate::{OutputTable, aggregate},
    columns::CanonicalColumn,
    data::RawTable,
    detect::{FormatScore, detect},
    error::JournalError,
    normalize::normalize,
    reconcile::{ReconciliationReport, reconcile},
    registry::SchemaRegistry,
};

/// What the report surface receives for one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub source: String,
    pub format: String,
    pub match_score: usize,
    pub format_scores: Vec<FormatScore>,
    pub input_rows: usize,
    pub columns: Vec<CanonicalColumn>,
    pub skipped: bool,
    pub warnings: Vec<JournalError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconciliation: Option<ReconciliationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
}

impl FileReport {
    pub fn passed(&self) -> bool {
        !self.skipped
            && self
                .reconciliation
                .as_ref()
                .is_some_and(ReconciliationReport::passed)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileOutcome {
    pub report: FileReport,
    /// `None` when aggregation was skipped.
    pub output: Option<OutputTable>,
}

/// Runs the whole pipeline for one table. Only an empty registry is an error;
/// every other condition is recorded as a warning on the report.
pub fn process_table(
    registry: &SchemaRegistry,
    raw: &RawTable,
    source: &str,
) -> Result<FileOutcome, JournalError> {
    let detection = detect(&raw.headers, registry)?;
    info!(
        "{source}: detected format '{}' ({} matching column(s))",
        detection.mapping.name(),
        detection.score
    );
    if detection.is_unmatched() {
        warn!("{source}: no input column matched any registered format");
    }

    let normalized = normalize(raw, detection.mapping);
    let mut warnings = normalized.summary.coercion_failures.clone();
    for (column, count) in normalized
        .summary
        .coercion_failures
        .iter()
        .filter_map(|w| match w {
            JournalError::NumericCoercionFailure { column, .. } => Some(column.as_str()),
            _ => None,
        })
        .counts()
        .into_iter()
        .sorted()
    {
        warn!("{source}: {count} unparseable value(s) in '{column}' treated as missing");
    }

    let mut report = FileReport {
        source: source.to_string(),
        format: detection.mapping.name().to_string(),
        match_score: detection.score,
        format_scores: detection.scores.clone(),
        input_rows: raw.row_count(),
        columns: normalized.table.columns.clone(),
        skipped: false,
        warnings: Vec::new(),
        reconciliation: None,
        output_path: None,
    };

    let aggregation = match aggregate(&normalized.table) {
        Ok(aggregation) => aggregation,
        Err(err) => {
            warn!("{source}: {err}; skipping aggregation");
            warnings.push(err);
            report.skipped = true;
            report.warnings = warnings;
            return Ok(FileOutcome {
                report,
                output: None,
            });
        }
    };

    let reconciliation = reconcile(
        &normalized.table,
        &aggregation.key_columns,
        &aggregation.rows,
        &aggregation.amount_columns,
    );
    for mismatch in reconciliation.mismatches() {
        warn!("{source}: {mismatch}");
        warnings.push(mismatch);
    }
    info!(
        "{source}: {} row(s) → {} combination(s); reconciliation {}",
        raw.row_count(),
        aggregation.group_count(),
        if reconciliation.passed() { "passed" } else { "FAILED" }
    );

    report.warnings = warnings;
    report.reconciliation = Some(reconciliation);
    Ok(FileOutcome {
        report,
        output: Some(aggregation.to_output()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{data::Cell, registry::ColumnMapping};

    fn registry() -> SchemaRegistry {
        SchemaRegistry::from_mappings(vec![
            ColumnMapping::new("other").with_alias("勘定", "要素内訳借方勘定科目名称"),
            ColumnMapping::new("standard")
                .with_alias("借方科目", "要素内訳借方勘定科目コード")
                .with_alias("貸方科目", "要素内訳貸方勘定科目コード")
                .with_alias("金額", "借方金額")
                .with_alias("月", "月"),
        ])
    }

    #[test]
    fn processes_a_ledger_end_to_end() {
        let raw = RawTable::from_strings(
            ["月", "借方科目", "貸方科目", "金額", "摘要"],
            [
                vec!["4", "100", "400", "1000", "a"],
                vec!["4", "100", "", "500", "b"],
                vec!["5", "200", "0", "250", "c"],
            ],
        );
        let outcome = process_table(&registry(), &raw, "ledger.csv").unwrap();
        let report = &outcome.report;
        assert_eq!(report.format, "standard");
        assert_eq!(report.match_score, 4);
        assert!(report.passed());
        assert!(report.warnings.is_empty());

        let reconciliation = report.reconciliation.as_ref().unwrap();
        assert_eq!(reconciliation.pre_combinations, 2);

        let output = outcome.output.unwrap();
        assert_eq!(
            output.headers,
            vec!["要素内訳借方勘定科目コード", "要素内訳貸方勘定科目コード", "借方金額"]
        );
        // The blank and `0` credit codes pick up 400 from the first row.
        assert_eq!(output.rows.len(), 3);
        assert_eq!(
            output.rows[0],
            vec![Cell::Number(100.0), Cell::Number(400.0), Cell::Number(1500.0)]
        );
        assert_eq!(
            output.rows[2],
            vec![Cell::text(""), Cell::text(""), Cell::Number(1750.0)]
        );
    }

    #[test]
    fn table_without_group_columns_is_skipped_with_warning() {
        let raw = RawTable::from_strings(["金額"], [vec!["1"]]);
        let outcome = process_table(&registry(), &raw, "amounts.csv").unwrap();
        assert!(outcome.output.is_none());
        assert!(outcome.report.skipped);
        assert!(!outcome.report.passed());
        assert!(matches!(
            outcome.report.warnings.as_slice(),
            [JournalError::NoEligibleGroupColumns { .. }]
        ));
    }

    #[test]
    fn coercion_failures_are_warnings_not_errors() {
        let raw = RawTable::from_strings(["借方科目", "金額"], [vec!["100", "x"], vec!["100", "5"]]);
        let outcome = process_table(&registry(), &raw, "bad.csv").unwrap();
        assert!(outcome.report.passed());
        assert_eq!(outcome.report.warnings.len(), 1);
        let output = outcome.output.unwrap();
        assert_eq!(output.rows[0][1], Cell::Number(5.0));
    }

    #[test]
    fn empty_registry_is_fatal() {
        let raw = RawTable::from_strings(["金額"], [vec!["1"]]);
        let err = process_table(&SchemaRegistry::default(), &raw, "x.csv").unwrap_err();
        assert!(err.is_fatal());
    }
}
