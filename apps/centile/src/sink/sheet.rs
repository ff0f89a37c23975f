//! # Remote Spreadsheet Sink
//!
//! Client for a spreadsheet gateway that exposes worksheets over REST:
//!
//! - `GET  {endpoint}/documents/{document}/sheets/{worksheet}/rows/1`
//! - `PUT  {endpoint}/documents/{document}/sheets/{worksheet}/rows/1`
//! - `POST {endpoint}/documents/{document}/sheets/{worksheet}/rows`
//!
//! Before every append the stored header is reconciled against the canonical
//! header: an empty sheet gets the header written first, and a mismatched
//! first row (left over from an older column layout) is rewritten in place —
//! a naive append over mixed historical schemas would silently shift columns.
//! The reconciliation is not atomic across concurrent writers; each append is
//! best-effort, not transactional.
//!
//! The client is blocking; the async HTTP layer drives it through
//! `spawn_blocking`.

use centile_core::{HeaderAction, RecordSink, SurveyError, reconcile};
use serde::{Deserialize, Serialize};

use crate::config::SheetConfig;

// =============================================================================
// WIRE TYPES
// =============================================================================

/// One worksheet row on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowPayload {
    /// Cell values, left to right.
    pub values: Vec<String>,
}

// =============================================================================
// SHEET STORE
// =============================================================================

/// Remote spreadsheet-gateway sink.
///
/// The blocking HTTP client is built lazily, on the first append: appends
/// always run on the blocking pool, while the store itself is constructed on
/// the async runtime, where a blocking client must not be used.
#[derive(Debug)]
pub struct SheetStore {
    http: std::sync::OnceLock<reqwest::blocking::Client>,
    endpoint: String,
    document: String,
    worksheet: String,
    token: Option<String>,
}

impl SheetStore {
    /// Create a client for the configured document and worksheet.
    #[must_use]
    pub fn new(config: &SheetConfig) -> Self {
        Self {
            http: std::sync::OnceLock::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            document: config.document.clone(),
            worksheet: config.worksheet.clone(),
            token: config.token.clone(),
        }
    }

    fn client(&self) -> &reqwest::blocking::Client {
        self.http.get_or_init(reqwest::blocking::Client::new)
    }

    /// Gateway base URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Target document name.
    #[must_use]
    pub fn document(&self) -> &str {
        &self.document
    }

    /// Target worksheet name.
    #[must_use]
    pub fn worksheet(&self) -> &str {
        &self.worksheet
    }

    fn url(&self, suffix: &str) -> String {
        format!(
            "{}/documents/{}/sheets/{}{}",
            self.endpoint, self.document, self.worksheet, suffix
        )
    }

    /// Build a request with optional Bearer auth.
    fn request(&self, method: reqwest::Method, suffix: &str) -> reqwest::blocking::RequestBuilder {
        let mut req = self.client().request(method, self.url(suffix));
        if let Some(ref token) = self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    /// Map gateway status codes onto persistence errors.
    fn check_status(
        &self,
        resp: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, SurveyError> {
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(SurveyError::Persistence(
                "sheet gateway rejected the token".to_string(),
            ));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SurveyError::Persistence(
                "sheet gateway is rate limiting".to_string(),
            ));
        }
        if status.is_client_error() || status.is_server_error() {
            let body = resp.text().unwrap_or_default();
            return Err(SurveyError::Persistence(format!(
                "sheet gateway error ({status}): {body}"
            )));
        }
        Ok(resp)
    }

    /// Read the worksheet's first row; `None` when the sheet is empty.
    fn first_row(&self) -> Result<Option<Vec<String>>, SurveyError> {
        let resp = self
            .request(reqwest::Method::GET, "/rows/1")
            .send()
            .map_err(|e| SurveyError::Persistence(format!("sheet gateway unreachable: {e}")))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = self.check_status(resp)?;
        let payload: RowPayload = resp
            .json()
            .map_err(|e| SurveyError::Persistence(format!("malformed gateway response: {e}")))?;
        if payload.values.is_empty() {
            return Ok(None);
        }
        Ok(Some(payload.values))
    }

    /// Rewrite row 1 in place.
    fn put_first_row(&self, values: &[String]) -> Result<(), SurveyError> {
        let resp = self
            .request(reqwest::Method::PUT, "/rows/1")
            .json(&RowPayload {
                values: values.to_vec(),
            })
            .send()
            .map_err(|e| SurveyError::Persistence(format!("sheet gateway unreachable: {e}")))?;
        self.check_status(resp)?;
        Ok(())
    }

    /// Append one row at the bottom of the worksheet.
    fn post_row(&self, values: &[String]) -> Result<(), SurveyError> {
        let resp = self
            .request(reqwest::Method::POST, "/rows")
            .json(&RowPayload {
                values: values.to_vec(),
            })
            .send()
            .map_err(|e| SurveyError::Persistence(format!("sheet gateway unreachable: {e}")))?;
        self.check_status(resp)?;
        Ok(())
    }
}

impl RecordSink for SheetStore {
    fn append(&mut self, header: &[String], row: &[String]) -> Result<(), SurveyError> {
        if row.len() != header.len() {
            return Err(SurveyError::Persistence(format!(
                "row width {} does not match header width {}",
                row.len(),
                header.len()
            )));
        }

        match reconcile(self.first_row()?.as_deref(), header) {
            HeaderAction::WriteHeader => {
                tracing::info!(worksheet = %self.worksheet, "writing canonical header to empty sheet");
                self.post_row(header)?;
            }
            HeaderAction::ReplaceHeader => {
                tracing::warn!(worksheet = %self.worksheet, "replacing mismatched header row");
                self.put_first_row(header)?;
            }
            HeaderAction::Keep => {}
        }
        self.post_row(row)
    }
}

// =============================================================================
// TESTS
// =============================================================================
