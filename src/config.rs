//! Optional YAML run configuration.
//!
//! Lets a team keep the master path, encodings and output location in a file
//! next to its ledgers. Command-line flags always take precedence.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::Encoding;
use log::{debug, info};
use serde::Deserialize;

use crate::{cli::MasterArgs, io_utils, registry::SchemaRegistry};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub master: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub delimiter: Option<String>,
    pub input_encoding: Option<String>,
    pub output_encoding: Option<String>,
    pub name_column: Option<String>,
    pub strict: Option<bool>,
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Opening config file {path:?}"))?;
        let mut config: RunConfig = serde_yaml::from_str(&raw)
            .with_context(|| format!("Parsing config file {path:?}"))?;
        config.resolve_relative_to(path.parent().unwrap_or(Path::new(".")));
        Ok(config)
    }

    /// Paths in a config file are relative to the file itself.
    fn resolve_relative_to(&mut self, base: &Path) {
        for path in [&mut self.master, &mut self.output_dir, &mut self.report]
            .into_iter()
            .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

/// Master and reader settings after merging flags over the config file.
#[derive(Debug, Clone)]
pub struct InputSettings {
    pub master: PathBuf,
    pub name_column: Option<String>,
    pub delimiter: Option<u8>,
    pub input_encoding: &'static Encoding,
}

impl InputSettings {
    pub fn resolve(args: &MasterArgs, config: &RunConfig) -> Result<Self> {
        let master = args
            .master
            .clone()
            .or_else(|| config.master.clone())
            .ok_or_else(|| anyhow!("A column master is required (--master or `master:` in --config)"))?;
        let delimiter = match (args.delimiter, config.delimiter.as_deref()) {
            (Some(delim), _) => Some(delim),
            (None, Some(raw)) => Some(io_utils::parse_delimiter(raw).map_err(|e| anyhow!(e))?),
            (None, None) => None,
        };
        let input_encoding = io_utils::resolve_encoding(
            args.input_encoding
                .as_deref()
                .or(config.input_encoding.as_deref()),
        )?;
        Ok(Self {
            master,
            name_column: args.name_column.clone().or_else(|| config.name_column.clone()),
            delimiter,
            input_encoding,
        })
    }

    pub fn delimiter_for(&self, path: &Path) -> u8 {
        io_utils::resolve_input_delimiter(path, self.delimiter)
    }

    /// Reads the master table and builds the format registry.
    pub fn load_registry(&self) -> Result<SchemaRegistry> {
        let delimiter = self.delimiter_for(&self.master);
        info!(
            "Loading column master {:?} (delimiter '{}', encoding {})",
            self.master,
            io_utils::printable_delimiter(delimiter),
            self.input_encoding.name()
        );
        let table = io_utils::read_table(&self.master, delimiter, self.input_encoding)
            .with_context(|| format!("Loading column master {:?}", self.master))?;
        let registry = SchemaRegistry::build(&table, self.name_column.as_deref());
        debug!("Master headers: {:?}", table.headers);
        info!("Registered {} format(s)", registry.len());
        Ok(registry)
    }
}
