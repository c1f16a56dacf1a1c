//! Read-only commands for checking a column master against ledger files.

use anyhow::{Context, Result};
use log::{info, warn};

use crate::{
    cli::{DetectArgs, FormatsArgs},
    columns::CanonicalColumn,
    config::{InputSettings, RunConfig},
    data::RawTable,
    detect::detect,
    io_utils,
    normalize::normalize,
    registry::{ColumnMapping, SchemaRegistry},
    table::{self, Align},
};

pub fn execute_detect(args: &DetectArgs) -> Result<()> {
    let config = RunConfig::load_optional(args.master.config.as_deref())?;
    let settings = InputSettings::resolve(&args.master, &config)?;
    let registry = settings.load_registry()?;

    let delimiter = settings.delimiter_for(&args.input);
    let raw = io_utils::read_table(&args.input, delimiter, settings.input_encoding)
        .with_context(|| format!("Reading ledger {:?}", args.input))?;
    let detection = detect(&raw.headers, &registry)?;
    info!(
        "{:?}: {} column(s), best match '{}'",
        args.input,
        raw.headers.len(),
        detection.mapping.name()
    );

    let headers = ["", "format", "score"].map(String::from).to_vec();
    let rows = detection
        .scores
        .iter()
        .map(|candidate| {
            let marker = if candidate.format == detection.mapping.name() {
                "*"
            } else {
                ""
            };
            vec![
                marker.to_string(),
                candidate.format.clone(),
                candidate.score.to_string(),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows, &[Align::Left, Align::Left, Align::Right]);

    if detection.is_unmatched() {
        warn!("No column of {:?} matched any registered format", args.input);
    } else {
        let dropped = dropped_columns(&raw, detection.mapping);
        if !dropped.is_empty() {
            println!();
            println!(
                "unmapped columns (dropped): {}",
                itertools::join(&dropped, ", ")
            );
        }
    }
    Ok(())
}

pub fn execute_formats(args: &FormatsArgs) -> Result<()> {
    let config = RunConfig::load_optional(args.master.config.as_deref())?;
    let settings = InputSettings::resolve(&args.master, &config)?;
    let registry = settings.load_registry()?;
    if registry.is_empty() {
        warn!("Column master {:?} declares no formats", settings.master);
        return Ok(());
    }
    print!("{}", render_formats(&registry, args.aliases));
    Ok(())
}

/// Input columns normalization would discard: unmapped, mapped outside the
/// vocabulary, or shadowed by an earlier column with the same target.
fn dropped_columns(raw: &RawTable, mapping: &ColumnMapping) -> Vec<String> {
    normalize(raw, mapping).summary.dropped
}

fn render_formats(registry: &SchemaRegistry, with_aliases: bool) -> String {
    let headers = ["format", "aliases"].map(String::from).to_vec();
    let rows = registry
        .mappings()
        .iter()
        .map(|mapping| vec![mapping.name().to_string(), mapping.len().to_string()])
        .collect::<Vec<_>>();
    let mut out = table::render_aligned(&headers, &rows, &[Align::Left, Align::Right]);
    if !with_aliases {
        return out;
    }

    let headers = ["format", "alias", "canonical"].map(String::from).to_vec();
    let rows = registry
        .mappings()
        .iter()
        .flat_map(|mapping| {
            mapping.aliases().iter().map(move |entry| {
                // Targets outside the vocabulary are renamed but never aggregated.
                let target = if CanonicalColumn::from_name(&entry.target).is_some() {
                    entry.target.clone()
                } else {
                    format!("{} (non-canonical)", entry.target)
                };
                vec![mapping.name().to_string(), entry.alias.clone(), target]
            })
        })
        .collect::<Vec<_>>();
    out.push('\n');
    out.push_str(&table::render_table(&headers, &rows));
    out
}
