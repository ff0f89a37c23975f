//! # Store Backends
//!
//! The app-level sink selection: one interface, two implementations, chosen
//! by explicit configuration. The local CSV store lives in the core; the
//! remote spreadsheet gateway lives here because the core carries no network
//! dependencies.

pub mod sheet;

pub use sheet::SheetStore;

use centile_core::{CsvStore, RecordSink, SurveyError};

use crate::config::{AppConfig, BackendKind};

// =============================================================================
// BACKEND SELECTION
// =============================================================================

/// The configured persistence sink.
#[derive(Debug)]
pub enum StoreBackend {
    /// Local append-only CSV file.
    Local(CsvStore),
    /// Remote spreadsheet gateway.
    Sheet(SheetStore),
}

impl StoreBackend {
    /// Build the sink selected by the configuration.
    ///
    /// Selection follows `store.backend` alone; the presence or absence of
    /// credentials never changes the choice.
    pub fn from_config(config: &AppConfig) -> Result<Self, SurveyError> {
        match config.store.backend {
            BackendKind::Local => Ok(StoreBackend::Local(CsvStore::new(&config.store.path))),
            BackendKind::Sheet => {
                let sheet = config.sheet.as_ref().ok_or_else(|| {
                    SurveyError::InvalidConfig(
                        "store.backend = \"sheet\" requires a [sheet] section".to_string(),
                    )
                })?;
                Ok(StoreBackend::Sheet(SheetStore::new(sheet)))
            }
        }
    }

    /// Human-readable description for logs and `status` output.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            StoreBackend::Local(store) => format!("local file {}", store.path().display()),
            StoreBackend::Sheet(store) => format!(
                "sheet {}/{} at {}",
                store.document(),
                store.worksheet(),
                store.endpoint()
            ),
        }
    }
}

impl RecordSink for StoreBackend {
    fn append(&mut self, header: &[String], row: &[String]) -> Result<(), SurveyError> {
        match self {
            StoreBackend::Local(store) => store.append(header, row),
            StoreBackend::Sheet(store) => store.append(header, row),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
