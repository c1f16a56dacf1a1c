//! The `normalize` command: run the pipeline over each input file in turn.
//!
//! Files are independent. A file that cannot be read or written is logged
//! and recorded, and the remaining files are still processed.

use std::{fs, path::Path};

use anyhow::{Context, Result, anyhow, bail};
use encoding_rs::Encoding;
use log::{error, info};

use crate::{
    cli::NormalizeArgs,
    config::{InputSettings, RunConfig},
    io_utils,
    pipeline::{FileReport, process_table},
    registry::SchemaRegistry,
    report::{self, FailedFile},
};

pub fn execute(args: &NormalizeArgs) -> Result<()> {
    let config = RunConfig::load_optional(args.master.config.as_deref())?;
    let settings = InputSettings::resolve(&args.master, &config)?;
    let output_dir = args.output_dir.clone().or_else(|| config.output_dir.clone());
    let output_encoding = io_utils::resolve_encoding(
        args.output_encoding
            .as_deref()
            .or(config.output_encoding.as_deref()),
    )?;
    let report_path = args.report.clone().or_else(|| config.report.clone());
    let strict = args.strict || config.strict.unwrap_or(false);

    let registry = settings.load_registry()?;
    registry.ensure_not_empty()?;

    if let Some(dir) = &output_dir {
        fs::create_dir_all(dir).with_context(|| format!("Creating output directory {dir:?}"))?;
    }

    // A stdin input without an output directory streams its table to stdout,
    // so every human-readable line goes to stderr for the whole run.
    let stdout_taken =
        output_dir.is_none() && args.inputs.iter().any(|input| io_utils::is_dash(input));
    let emit = |text: &str| {
        if stdout_taken {
            eprint!("{text}");
        } else {
            print!("{text}");
        }
    };

    let mut reports = Vec::with_capacity(args.inputs.len());
    let mut failed = Vec::new();
    for input in &args.inputs {
        match process_file(
            &registry,
            &settings,
            input,
            output_dir.as_deref(),
            output_encoding,
        ) {
            Ok(file_report) => {
                emit(&report::render_file_report(&file_report));
                reports.push(file_report);
            }
            Err(err) => {
                error!("{}: {err:#}", input.display());
                failed.push(FailedFile {
                    source: input.display().to_string(),
                    error: format!("{err:#}"),
                });
            }
        }
    }

    if args.inputs.len() > 1 || !failed.is_empty() {
        emit("\n");
        emit(&report::render_summary(&reports, &failed));
    }
    if let Some(path) = &report_path {
        report::write_json(path, &reports, &failed)?;
        info!("Report written to {path:?}");
    }

    if !failed.is_empty() {
        bail!("{} of {} file(s) could not be processed", failed.len(), args.inputs.len());
    }
    if strict {
        let flagged = reports.iter().filter(|r| !r.passed()).count();
        if flagged > 0 {
            return Err(anyhow!(
                "{flagged} file(s) were skipped or failed reconciliation (--strict)"
            ));
        }
    }
    Ok(())
}

fn process_file(
    registry: &SchemaRegistry,
    settings: &InputSettings,
    input: &Path,
    output_dir: Option<&Path>,
    output_encoding: &'static Encoding,
) -> Result<FileReport> {
    let delimiter = settings.delimiter_for(input);
    info!(
        "Processing {:?} (delimiter '{}')",
        input,
        io_utils::printable_delimiter(delimiter)
    );
    let raw = io_utils::read_table(input, delimiter, settings.input_encoding)?;
    let source = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    let outcome = process_table(registry, &raw, &source)?;

    let mut file_report = outcome.report;
    if let Some(output) = &outcome.output {
        let target = if io_utils::is_dash(input) && output_dir.is_none() {
            Path::new("-").to_path_buf()
        } else {
            io_utils::output_path_for(input, output_dir)
        };
        let out_delimiter = io_utils::resolve_output_delimiter(&target, None, delimiter);
        io_utils::write_table(&target, output, out_delimiter, output_encoding)?;
        info!("Wrote {} row(s) to {:?}", output.rows.len(), target);
        file_report.output_path = Some(target.display().to_string());
    }
    Ok(file_report)
}
