use serde::Serialize;
use thiserror::Error;

/// Conditions raised by the normalization pipeline.
///
/// Only [`JournalError::EmptyRegistry`] stops a run. The other variants are
/// collected as per-file warnings and surfaced in the report.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JournalError {
    #[error("column master defines no formats")]
    EmptyRegistry,
    #[error("no canonical grouping columns after normalization (columns: {})", .columns.join(", "))]
    NoEligibleGroupColumns { columns: Vec<String> },
    #[error("row {row} column '{column}': cannot parse '{value}' as a number")]
    NumericCoercionFailure {
        row: usize,
        column: String,
        value: String,
    },
    #[error("{check} mismatch: before aggregation {pre}, after aggregation {post}")]
    ReconciliationMismatch {
        check: String,
        pre: String,
        post: String,
    },
}

impl JournalError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, JournalError::EmptyRegistry)
    }
}
