//! Column-name master → per-format alias mappings.
//!
//! Each master row describes one source format. A non-missing cell declares
//! that an input column literally named after the cell's trimmed value maps
//! to the canonical column named by the cell's header.

use log::debug;
use serde::Serialize;

use crate::{data::RawTable, error::JournalError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AliasEntry {
    pub alias: String,
    pub target: String,
}

/// One source format: alias → canonical header, in master column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMapping {
    name: String,
    aliases: Vec<AliasEntry>,
}

impl ColumnMapping {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
        }
    }

    /// Records `alias -> target`. A repeated alias keeps its position and
    /// takes the latest target.
    pub fn insert(&mut self, alias: &str, target: &str) {
        let alias = alias.trim();
        if alias.is_empty() {
            return;
        }
        match self.aliases.iter_mut().find(|e| e.alias == alias) {
            Some(entry) => entry.target = target.to_string(),
            None => self.aliases.push(AliasEntry {
                alias: alias.to_string(),
                target: target.to_string(),
            }),
        }
    }

    pub fn with_alias(mut self, alias: &str, target: &str) -> Self {
        self.insert(alias, target);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self, column: &str) -> Option<&str> {
        let column = column.trim();
        self.aliases
            .iter()
            .find(|e| e.alias == column)
            .map(|e| e.target.as_str())
    }

    pub fn contains(&self, column: &str) -> bool {
        self.target(column).is_some()
    }

    pub fn aliases(&self) -> &[AliasEntry] {
        &self.aliases
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Number of input columns whose trimmed name is one of this format's aliases.
    pub fn score<S: AsRef<str>>(&self, columns: &[S]) -> usize {
        columns.iter().filter(|c| self.contains(c.as_ref())).count()
    }
}

/// The ordered set of known formats.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaRegistry {
    mappings: Vec<ColumnMapping>,
}

impl SchemaRegistry {
    /// Builds one mapping per master row. Rows that yield no aliases are kept.
    ///
    /// With `name_column`, that column's value names the format and is not an
    /// alias; otherwise formats are named `row{index}`.
    pub fn build(master: &RawTable, name_column: Option<&str>) -> Self {
        let name_idx = name_column.and_then(|name| master.column_index(name.trim()));
        let mappings = master
            .rows
            .iter()
            .enumerate()
            .map(|(row_idx, row)| {
                let name = name_idx
                    .and_then(|idx| row.get(idx))
                    .filter(|cell| !cell.is_missing())
                    .map(|cell| cell.as_display().trim().to_string())
                    .unwrap_or_else(|| format!("row{row_idx}"));
                let mut mapping = ColumnMapping::new(name);
                for (col_idx, (header, cell)) in master.headers.iter().zip(row).enumerate() {
                    if Some(col_idx) == name_idx || cell.is_missing() {
                        continue;
                    }
                    mapping.insert(&cell.as_display(), header);
                }
                debug!(
                    "Format '{}' declares {} alias(es)",
                    mapping.name(),
                    mapping.len()
                );
                mapping
            })
            .collect();
        Self { mappings }
    }

    pub fn from_mappings(mappings: Vec<ColumnMapping>) -> Self {
        Self { mappings }
    }

    pub fn mappings(&self) -> &[ColumnMapping] {
        &self.mappings
    }

    pub fn get(&self, name: &str) -> Option<&ColumnMapping> {
        self.mappings.iter().find(|m| m.name() == name)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn ensure_not_empty(&self) -> Result<(), JournalError> {
        if self.mappings.is_empty() {
            Err(JournalError::EmptyRegistry)
        } else {
            Ok(())
        }
    }
}
