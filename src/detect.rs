use log::debug;
use serde::Serialize;

use crate::{
    error::JournalError,
    registry::{ColumnMapping, SchemaRegistry},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatScore {
    pub format: String,
    pub score: usize,
}

/// The selected format plus every candidate's overlap score in registry order.
#[derive(Debug, Clone)]
pub struct Detection<'a> {
    pub mapping: &'a ColumnMapping,
    pub score: usize,
    pub scores: Vec<FormatScore>,
}

impl Detection<'_> {
    /// True when no input column matched any format.
    pub fn is_unmatched(&self) -> bool {
        self.score == 0
    }
}

/// Picks the format with the strictly highest overlap; ties go to the
/// earliest registered format. A zero score still selects the first format.
pub fn detect<'a, S: AsRef<str>>(
    columns: &[S],
    registry: &'a SchemaRegistry,
) -> Result<Detection<'a>, JournalError> {
    registry.ensure_not_empty()?;
    let scores = registry
        .mappings()
        .iter()
        .map(|mapping| FormatScore {
            format: mapping.name().to_string(),
            score: mapping.score(columns),
        })
        .collect::<Vec<_>>();

    let mut best = 0usize;
    for (idx, candidate) in scores.iter().enumerate() {
        if candidate.score > scores[best].score {
            best = idx;
        }
    }
    debug!(
        "Format scores: {}",
        itertools::join(scores.iter().map(|s| format!("{}={}", s.format, s.score)), ", ")
    );

    Ok(Detection {
        mapping: &registry.mappings()[best],
        score: scores[best].score,
        scores,
    })
}
