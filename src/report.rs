//! Human and machine renderings of per-file reports.

use std::{fs::File, io::BufWriter, path::Path};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{
    pipeline::FileReport,
    table::{self, Align},
};

const MAX_LISTED_WARNINGS: usize = 10;

#[derive(Debug, Serialize)]
struct RunReport<'a> {
    files: &'a [FileReport],
    failed_files: &'a [FailedFile],
}

/// A file that could not be read or written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedFile {
    pub source: String,
    pub error: String,
}

pub fn render_file_report(report: &FileReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("== {}\n", report.source));
    out.push_str(&format!(
        "format: {} ({} matching column(s))\n",
        report.format, report.match_score
    ));
    out.push_str(&format!("input rows: {}\n", report.input_rows));

    if report.skipped {
        out.push_str("aggregation skipped: no canonical grouping columns\n");
    }

    if let Some(recon) = &report.reconciliation {
        out.push_str(&format!(
            "combinations: before {} / after {} → {}\n",
            recon.pre_combinations,
            recon.post_combinations,
            status(recon.combinations_match)
        ));
        if !recon.amounts.is_empty() {
            let headers = ["column", "before", "after", "result"]
                .map(String::from)
                .to_vec();
            let rows = recon
                .amounts
                .iter()
                .map(|check| {
                    vec![
                        check.column.to_string(),
                        format_amount(check.pre_total),
                        format_amount(check.post_total),
                        status(check.matches).to_string(),
                    ]
                })
                .collect::<Vec<_>>();
            out.push_str(&table::render_aligned(
                &headers,
                &rows,
                &[Align::Left, Align::Right, Align::Right, Align::Left],
            ));
        }
    }

    if !report.warnings.is_empty() {
        out.push_str(&format!("warnings: {}\n", report.warnings.len()));
        for warning in report.warnings.iter().take(MAX_LISTED_WARNINGS) {
            out.push_str(&format!("  - {warning}\n"));
        }
        if report.warnings.len() > MAX_LISTED_WARNINGS {
            out.push_str(&format!(
                "  ... and {} more\n",
                report.warnings.len() - MAX_LISTED_WARNINGS
            ));
        }
    }
    if let Some(path) = &report.output_path {
        out.push_str(&format!("output: {path}\n"));
    }
    out
}

/// One line per file plus any files that failed outright.
pub fn render_summary(reports: &[FileReport], failed: &[FailedFile]) -> String {
    let headers = ["file", "format", "score", "combinations", "status"]
        .map(String::from)
        .to_vec();
    let mut rows = reports
        .iter()
        .map(|report| {
            let combinations = report
                .reconciliation
                .as_ref()
                .map(|r| format!("{} / {}", r.pre_combinations, r.post_combinations))
                .unwrap_or_else(|| "-".to_string());
            let state = if report.skipped {
                "skipped"
            } else if report.passed() {
                "ok"
            } else {
                "mismatch"
            };
            vec![
                report.source.clone(),
                report.format.clone(),
                report.match_score.to_string(),
                combinations,
                state.to_string(),
            ]
        })
        .collect::<Vec<_>>();
    rows.extend(failed.iter().map(|f| {
        vec![
            f.source.clone(),
            "-".to_string(),
            "-".to_string(),
            "-".to_string(),
            "error".to_string(),
        ]
    }));
    table::render_aligned(
        &headers,
        &rows,
        &[Align::Left, Align::Left, Align::Right, Align::Right, Align::Left],
    )
}

pub fn write_json(path: &Path, reports: &[FileReport], failed: &[FailedFile]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Creating report file {path:?}"))?;
    let run = RunReport {
        files: reports,
        failed_files: failed,
    };
    serde_json::to_writer_pretty(BufWriter::new(file), &run).context("Writing report JSON")
}

fn status(ok: bool) -> &'static str {
    if ok { "一致 ✔" } else { "不一致 ✘" }
}

/// Rounds to whole units and groups digits by thousands.
pub fn format_amount(value: f64) -> String {
    let rounded = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (idx, ch) in rounded.chars().enumerate() {
        if idx > 0 && (rounded.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0.0 && rounded != "0" {
        format!("-{grouped}")
    } else {
        grouped
    }
}
