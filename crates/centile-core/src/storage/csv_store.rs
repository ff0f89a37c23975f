//! # Local CSV Store
//!
//! An append-only tabular file. On the first write to an empty (or absent)
//! file the canonical header is written before the data row — two writes,
//! header first. An existing file whose header differs from the canonical
//! header is refused with a schema-mismatch error: the file is append-only,
//! so historical data is never rewritten in place; operators migrate the file
//! explicitly. (The remote sheet sink, whose rows are individually
//! addressable, rewrites its header row instead.)
//!
//! Quoting follows RFC 4180: fields containing commas, quotes, or newlines
//! are wrapped in double quotes with embedded quotes doubled.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::schema::{self, HeaderAction};
use crate::storage::RecordSink;
use crate::types::SurveyError;

// =============================================================================
// CSV ENCODING
// =============================================================================

/// Encode one row as a CSV line (no trailing newline).
#[must_use]
pub fn encode_line(fields: &[String]) -> String {
    let mut line = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        if field.contains(['"', ',', '\n', '\r']) {
            line.push('"');
            line.push_str(&field.replace('"', "\"\""));
            line.push('"');
        } else {
            line.push_str(field);
        }
    }
    line
}

/// Decode one CSV line into fields.
///
/// Accepts the subset of RFC 4180 that [`encode_line`] emits; a stray quote
/// mid-field is treated as literal rather than rejected, since the header
/// check that uses this only needs exact-match comparison.
#[must_use]
pub fn decode_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.is_empty() => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            other => current.push(other),
        }
    }
    fields.push(current);
    fields
}

// =============================================================================
// CSV STORE
// =============================================================================

/// Local append-only CSV store.
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    /// Create a store handle for the given path.
    ///
    /// The file is created lazily on first append (or by [`CsvStore::init`]).
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file path backing this store.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file and write the canonical header.
    ///
    /// Refuses when the file already has content unless `force` is set, in
    /// which case the file is truncated.
    pub fn init(&self, header: &[String], force: bool) -> Result<(), SurveyError> {
        if !force && self.first_row()?.is_some() {
            return Err(SurveyError::Io(format!(
                "store {} already exists; pass force to recreate",
                self.path.display()
            )));
        }
        let mut file = File::create(&self.path).map_err(|e| SurveyError::Io(e.to_string()))?;
        writeln!(file, "{}", encode_line(header)).map_err(|e| SurveyError::Io(e.to_string()))?;
        Ok(())
    }

    /// Read the first row, or `None` when the file is absent or empty.
    pub fn first_row(&self) -> Result<Option<Vec<String>>, SurveyError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SurveyError::Io(e.to_string())),
        };
        let mut first = String::new();
        BufReader::new(file)
            .read_line(&mut first)
            .map_err(|e| SurveyError::Io(e.to_string()))?;
        let trimmed = first.trim_end_matches(['\n', '\r']);
        if trimmed.is_empty() {
            return Ok(None);
        }
        Ok(Some(decode_line(trimmed)))
    }

    /// Number of data rows (lines after the header).
    pub fn row_count(&self) -> Result<usize, SurveyError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(SurveyError::Io(e.to_string())),
        };
        let lines = BufReader::new(file)
            .lines()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SurveyError::Io(e.to_string()))?;
        Ok(lines.iter().filter(|l| !l.trim().is_empty()).count().saturating_sub(1))
    }
}

impl RecordSink for CsvStore {
    fn append(&mut self, header: &[String], row: &[String]) -> Result<(), SurveyError> {
        if row.len() != header.len() {
            return Err(SurveyError::Persistence(format!(
                "row width {} does not match header width {}",
                row.len(),
                header.len()
            )));
        }

        match schema::reconcile(self.first_row()?.as_deref(), header) {
            HeaderAction::WriteHeader => {
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)
                    .map_err(|e| SurveyError::Persistence(e.to_string()))?;
                writeln!(file, "{}", encode_line(header))
                    .map_err(|e| SurveyError::Persistence(e.to_string()))?;
                writeln!(file, "{}", encode_line(row))
                    .map_err(|e| SurveyError::Persistence(e.to_string()))?;
                Ok(())
            }
            HeaderAction::Keep => {
                let mut file = OpenOptions::new()
                    .append(true)
                    .open(&self.path)
                    .map_err(|e| SurveyError::Persistence(e.to_string()))?;
                writeln!(file, "{}", encode_line(row))
                    .map_err(|e| SurveyError::Persistence(e.to_string()))?;
                Ok(())
            }
            HeaderAction::ReplaceHeader => Err(SurveyError::Persistence(format!(
                "store {} has a mismatched header; migrate the file before appending",
                self.path.display()
            ))),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
