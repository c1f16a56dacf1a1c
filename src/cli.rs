use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::io_utils::parse_delimiter;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Normalize journal ledgers to canonical columns and aggregate by debit/credit combination",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Normalize, aggregate and reconcile one or more ledger files
    Normalize(NormalizeArgs),
    /// Show how well each registered format matches a ledger file
    Detect(DetectArgs),
    /// List the formats declared by a column master
    Formats(FormatsArgs),
}

/// Options shared by every command that reads the column master.
#[derive(Debug, Clone, Args)]
pub struct MasterArgs {
    /// Column master: one row per source format, headers are canonical column names
    #[arg(short, long)]
    pub master: Option<PathBuf>,
    /// Master column holding a display name for each format
    #[arg(long = "name-column")]
    pub name_column: Option<String>,
    /// Delimiter for master and ledger files (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of master and ledger files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// YAML run configuration supplying defaults for these options
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct NormalizeArgs {
    #[command(flatten)]
    pub master: MasterArgs,
    /// Ledger files to process, each independently
    #[arg(short = 'i', long = "input", required = true, action = clap::ArgAction::Append)]
    pub inputs: Vec<PathBuf>,
    /// Directory for normalized output (defaults to each input's directory)
    #[arg(short = 'o', long = "output-dir")]
    pub output_dir: Option<PathBuf>,
    /// Character encoding for output files (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
    /// Write a JSON report covering every file
    #[arg(long)]
    pub report: Option<PathBuf>,
    /// Exit non-zero when a file is skipped or fails reconciliation
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Args)]
pub struct DetectArgs {
    #[command(flatten)]
    pub master: MasterArgs,
    /// Ledger file to score against the registered formats
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
}

#[derive(Debug, Args)]
pub struct FormatsArgs {
    #[command(flatten)]
    pub master: MasterArgs,
    /// Also list every alias → canonical column pair
    #[arg(long)]
    pub aliases: bool,
}
