//! Cell values read from ledger and master tables.
//!
//! [`Cell`] is the single value type that flows through the pipeline. A
//! missing value is an ordinary variant so that it can take part in sort
//! keys and group keys: `Missing == Missing`, and missing cells sort after
//! every present value.

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

use chrono::NaiveDate;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

#[derive(Debug, Clone, Default)]
pub enum Cell {
    #[default]
    Missing,
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

impl Cell {
    /// Infers a typed cell from a raw field. Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Self {
        let value = raw.trim();
        if value.is_empty() {
            return Cell::Missing;
        }
        if is_plain_number(value)
            && let Ok(parsed) = value.parse::<f64>()
        {
            return Cell::Number(parsed);
        }
        if let Some(date) = parse_naive_date(value) {
            return Cell::Date(date);
        }
        Cell::Text(value.to_string())
    }

    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// `0` as a number or as the literal string `"0"`.
    pub fn is_zero_sentinel(&self) -> bool {
        match self {
            Cell::Number(n) => *n == 0.0,
            Cell::Text(s) => s.trim() == "0",
            _ => false,
        }
    }

    /// Numeric view used for amount columns. Text is accepted when it parses
    /// as a finite number once ASCII thousands separators are removed.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Text(s) => {
                let cleaned = s.trim().replace(',', "");
                cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
            }
            _ => None,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Cell::Missing => String::new(),
            Cell::Number(n) => format_number(*n),
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
            Cell::Text(s) => s.clone(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Cell::Number(_) => 0,
            Cell::Date(_) => 1,
            Cell::Text(_) => 2,
            Cell::Missing => 3,
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::parse(value)
    }
}

impl Ord for Cell {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Cell::Number(a), Cell::Number(b)) => normalize_zero(*a).total_cmp(&normalize_zero(*b)),
            (Cell::Date(a), Cell::Date(b)) => a.cmp(b),
            (Cell::Text(a), Cell::Text(b)) => a.cmp(b),
            (Cell::Missing, Cell::Missing) => Ordering::Equal,
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Cell {}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Cell::Number(n) => normalize_zero(*n).to_bits().hash(state),
            Cell::Date(d) => d.hash(state),
            Cell::Text(s) => s.hash(state),
            Cell::Missing => {}
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// A table as delivered by a file reader: trimmed headers plus positional rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    /// Builds a table, trimming headers and padding short rows with missing cells.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let headers = headers
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect::<Vec<_>>();
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Missing);
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Convenience constructor for string fields, each parsed with [`Cell::parse`].
    pub fn from_strings<H, R, F>(headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: AsRef<str>,
        R: IntoIterator<Item = F>,
        F: IntoIterator,
        F::Item: AsRef<str>,
    {
        let headers = headers
            .into_iter()
            .map(|h| h.as_ref().to_string())
            .collect();
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|v| Cell::parse(v.as_ref())).collect())
            .collect();
        Self::new(headers, rows)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

fn normalize_zero(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { value }
}

// Leading zeros mark identifiers such as account codes, which stay text.
fn is_plain_number(value: &str) -> bool {
    let unsigned = value.strip_prefix('-').unwrap_or(value);
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (unsigned, None),
    };
    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if int_part.len() > 1 && int_part.starts_with('0') {
        return false;
    }
    match frac_part {
        Some(frac) => !frac.is_empty() && frac.bytes().all(|b| b.is_ascii_digit()),
        None => true,
    }
}

pub fn parse_naive_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

pub fn format_number(value: f64) -> String {
    let value = normalize_zero(value);
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}
