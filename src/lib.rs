pub mod aggregate;
pub mod cli;
pub mod columns;
pub mod config;
pub mod data;
pub mod detect;
pub mod error;
pub mod inspect;
pub mod io_utils;
pub mod normalize;
pub mod pipeline;
pub mod process;
pub mod reconcile;
pub mod registry;
pub mod report;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("journal_normalizer", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Normalize(args) => process::execute(&args),
        Commands::Detect(args) => inspect::execute_detect(&args),
        Commands::Formats(args) => inspect::execute_formats(&args),
    }
}
