//! Reading and writing delimited tables.
//!
//! All file I/O flows through this module:
//!
//! - **Delimiter resolution**: `.tsv` → tab, everything else → comma, with
//!   manual override.
//! - **Encoding**: input decoding and output encoding via `encoding_rs`,
//!   defaulting to UTF-8. Ledger exports from Japanese accounting packages
//!   are commonly Shift_JIS.
//! - **stdin/stdout**: the `-` path convention routes through standard streams.

use std::{
    ffi::OsStr,
    fs,
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};

use crate::{
    aggregate::OutputTable,
    data::{Cell, RawTable},
};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';
pub const OUTPUT_SUFFIX: &str = "_正規化集計済";

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn resolve_output_delimiter(path: &Path, provided: Option<u8>, fallback: u8) -> u8 {
    if let Some(delim) = provided {
        return delim;
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        Some(ext) if ext.eq_ignore_ascii_case("csv") => DEFAULT_CSV_DELIMITER,
        _ => fallback,
    }
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    if value == "\t" {
        return Ok(b'\t');
    }
    match value.trim() {
        "tab" | "\\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "semicolon" | ";" => Ok(b';'),
        "pipe" | "|" => Ok(b'|'),
        other if other.len() == 1 && other.is_ascii() => Ok(other.as_bytes()[0]),
        other => Err(format!("Unsupported delimiter '{other}'")),
    }
}

pub fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    // `decode` sniffs and strips a byte-order mark before decoding.
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    if is_dash(path) {
        let mut buf = Vec::new();
        io::stdin()
            .lock()
            .read_to_end(&mut buf)
            .context("Reading stdin")?;
        Ok(buf)
    } else {
        fs::read(path).with_context(|| format!("Opening input file {path:?}"))
    }
}

/// Parses delimited text into a [`RawTable`]. Headers are trimmed and every
/// field is typed with [`Cell::parse`]. Ragged rows are tolerated.
pub fn parse_table(text: &str, delimiter: u8) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader
        .headers()
        .context("Reading header row")?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    let mut rows = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        rows.push(record.iter().map(Cell::parse).collect());
    }
    Ok(RawTable::new(headers, rows))
}

pub fn read_table(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<RawTable> {
    let bytes = read_bytes(path)?;
    let text = decode_bytes(&bytes, encoding).with_context(|| format!("Decoding {path:?}"))?;
    parse_table(&text, delimiter).with_context(|| format!("Parsing {path:?}"))
}

/// Serializes the table as delimited UTF-8 text. Only fields that need it are quoted.
pub fn render_delimited(table: &OutputTable, delimiter: u8) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true)
        .from_writer(Vec::new());
    writer
        .write_record(&table.headers)
        .context("Writing output headers")?;
    for (row_idx, row) in table.rows.iter().enumerate() {
        writer
            .write_record(row.iter().map(Cell::as_display))
            .with_context(|| format!("Writing output row {}", row_idx + 2))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow!("Flushing output buffer: {}", err.error()))?;
    String::from_utf8(bytes).context("Output buffer is not valid UTF-8")
}

pub fn encode_text(text: &str, encoding: &'static Encoding) -> Result<Vec<u8>> {
    if encoding == UTF_8 {
        return Ok(text.as_bytes().to_vec());
    }
    let (encoded, _, had_errors) = encoding.encode(text);
    if had_errors {
        return Err(anyhow!(
            "Output contains characters that cannot be encoded as {}",
            encoding.name()
        ));
    }
    Ok(encoded.into_owned())
}

pub fn write_table(
    path: &Path,
    table: &OutputTable,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<()> {
    let text = render_delimited(table, delimiter)?;
    let bytes = encode_text(&text, encoding)?;
    if is_dash(path) {
        let mut stdout = io::stdout().lock();
        stdout.write_all(&bytes).context("Writing to stdout")?;
        stdout.flush().context("Flushing stdout")
    } else {
        fs::write(path, bytes).with_context(|| format!("Creating output file {path:?}"))
    }
}

/// `<dir>/<stem>_正規化集計済.<ext>`, where `dir` defaults to the input's directory.
pub fn output_path_for(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or("output");
    let ext = input
        .extension()
        .and_then(OsStr::to_str)
        .unwrap_or("csv");
    let file_name = format!("{stem}{OUTPUT_SUFFIX}.{ext}");
    match output_dir {
        Some(dir) => dir.join(file_name),
        None => input
            .parent()
            .map(|p| p.join(&file_name))
            .unwrap_or_else(|| PathBuf::from(&file_name)),
    }
}
