//! Tab-separated, Latin-1 encoded flat files.
//!
//! RULE: Only this module touches bytes on disk.
//! The augmenter and the engine work on decoded `FlatTable`s.

use crate::error::{SalesError, SalesResult};
use chrono::{NaiveDate, NaiveDateTime};
// The WHATWG "latin1" label maps to windows-1252.
use encoding_rs::WINDOWS_1252;
use std::path::Path;

/// Date-only layouts, day-first before ISO.
const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d", "%Y/%m/%d"];
/// Tried first when the year field has two digits; `%Y` would read "24" as year 24.
const SHORT_YEAR_FORMATS: &[&str] = &["%d/%m/%y", "%d-%m-%y", "%d.%m.%y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Layout used when writing dates back out.
pub const OUTPUT_DATE_FORMAT: &str = "%Y-%m-%d";

/// A decoded flat file: header row plus string cells.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatTable {
    pub source_name: String,
    pub headers:     Vec<String>,
    pub rows:        Vec<Vec<String>>,
}

impl FlatTable {
    pub fn new(source_name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            source_name: source_name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    /// Read and decode a file from disk.
    pub fn read(path: &Path) -> SalesResult<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        Self::from_latin1(&bytes, path.display().to_string())
    }

    pub fn from_latin1(bytes: &[u8], source_name: impl Into<String>) -> SalesResult<Self> {
        let (text, _, _) = WINDOWS_1252.decode(bytes);
        Self::parse(&text, source_name)
    }

    /// Parse already-decoded tab-separated text.
    pub fn parse(text: &str, source_name: impl Into<String>) -> SalesResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let mut table = Self::new(source_name, headers);
        for record in reader.records() {
            let record = record?;
            table.rows.push(record.iter().map(str::to_string).collect());
        }
        log::debug!("Parsed {} rows from {}", table.rows.len(), table.source_name);
        Ok(table)
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require_column(&self, name: &str) -> SalesResult<usize> {
        self.column(name).ok_or_else(|| SalesError::MissingColumn {
            column:      name.to_string(),
            source_name: self.source_name.clone(),
        })
    }

    /// Render as tab-separated text.
    pub fn to_text(&self) -> SalesResult<String> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        let bytes = writer.into_inner().map_err(|e| e.into_error())?;
        let text = String::from_utf8(bytes)
            .map_err(|e| anyhow::anyhow!("Writer produced invalid UTF-8: {e}"))?;
        Ok(text)
    }

    /// Write to `path` as Latin-1, replacing any existing file.
    pub fn write(&self, path: &Path) -> SalesResult<()> {
        let text = self.to_text()?;
        let (bytes, _, unmappable) = WINDOWS_1252.encode(&text);
        if unmappable {
            log::warn!(
                "Some characters in {} have no single-byte form and were replaced",
                path.display()
            );
        }
        std::fs::write(path, &bytes)?;
        log::info!("Wrote {} rows to {}", self.rows.len(), path.display());
        Ok(())
    }
}

/// Parse a sale date using the day-first convention.
/// Returns None for anything unrecognized; callers decide whether to drop.
pub fn parse_day_first(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let short_year = if has_short_year(raw) { SHORT_YEAR_FORMATS } else { &[] };
    short_year
        .iter()
        .chain(DATE_FORMATS)
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// True for `d/m/yy` style input: three short numeric fields, the last of two digits.
fn has_short_year(raw: &str) -> bool {
    let fields: Vec<&str> = raw.split(['/', '-', '.']).collect();
    matches!(
        fields.as_slice(),
        [d, m, y] if d.len() <= 2 && m.len() <= 2 && y.len() == 2
            && fields.iter().all(|f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()))
    )
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(OUTPUT_DATE_FORMAT).to_string()
}

/// Parse a numeric cell as f64.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a count cell. Accepts "3" and integral floats such as "3.0".
pub fn parse_count(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    raw.parse::<u64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| *v >= 0.0 && v.fract() == 0.0 && *v <= u64::MAX as f64)
            .map(|v| v as u64)
    })
}
