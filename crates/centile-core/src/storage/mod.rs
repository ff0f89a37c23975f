//! # Persistence Sinks
//!
//! A finalized record is appended to durable storage exactly once, at the
//! final submit transition. Sinks are selected by explicit configuration —
//! never by probing for credentials at runtime.
//!
//! Two shipped implementations:
//! - [`CsvStore`]: local append-only tabular file (this module).
//! - A remote spreadsheet-gateway sink in the app layer (network I/O stays
//!   out of the core).
//!
//! [`MemorySink`] backs tests and dry runs.

pub mod csv_store;

pub use csv_store::CsvStore;

use crate::types::SurveyError;

// =============================================================================
// SINK TRAIT
// =============================================================================

/// Destination for finalized response rows.
///
/// `append` must be all-or-nothing from the caller's perspective: either the
/// full row is durably written, or an error is returned and nothing of the
/// record is considered persisted. The same row may be re-submitted after an
/// error; sinks are not required to deduplicate.
pub trait RecordSink {
    /// Append one row, reconciling the stored header with `header` first.
    fn append(&mut self, header: &[String], row: &[String]) -> Result<(), SurveyError>;
}

// =============================================================================
// MEMORY SINK
// =============================================================================

/// An in-memory sink for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    /// The header as of the last append.
    pub header: Option<Vec<String>>,
    /// Appended rows, oldest first.
    pub rows: Vec<Vec<String>>,
    /// When set, every append fails with a persistence error.
    pub fail_next: bool,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of data rows appended.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

impl RecordSink for MemorySink {
    fn append(&mut self, header: &[String], row: &[String]) -> Result<(), SurveyError> {
        if self.fail_next {
            return Err(SurveyError::Persistence(
                "memory sink configured to fail".to_string(),
            ));
        }
        if row.len() != header.len() {
            return Err(SurveyError::Persistence(format!(
                "row width {} does not match header width {}",
                row.len(),
                header.len()
            )));
        }
        self.header = Some(header.to_vec());
        self.rows.push(row.to_vec());
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
