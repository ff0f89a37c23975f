//! # centile-core
//!
//! The survey engine for Centile - THE LOGIC.
//!
//! This crate implements the reusable core of an interval-elicitation survey:
//! a participant walks a strictly linear chain of screens (consent,
//! instructions, self-report, prediction, thanks), the engine accumulates one
//! response record, derives the committed intervals from band choices, and
//! appends the finished row to a durable store under a canonical,
//! presentation-order-independent column layout.
//!
//! ## Architectural Constraints
//!
//! - No async, no network dependencies (the remote sheet sink lives in the
//!   app layer behind the [`storage::RecordSink`] trait)
//! - Integer arithmetic only; money is tracked in currency tenths
//! - Closed enumerations for bands, consent choices, and stages: invalid
//!   values are construction-time errors
//! - Session state is explicit and passed by reference; there is no ambient
//!   global dictionary of flags

// =============================================================================
// MODULES
// =============================================================================

pub mod config;
pub mod interval;
pub mod question;
pub mod record;
pub mod schema;
pub mod screen;
pub mod session;
pub mod stage;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Band, ConsentChoice, FieldKind, QuestionId, SCALE_MAX, ScaleValue, SurveyError};

// =============================================================================
// RE-EXPORTS: Survey Engine
// =============================================================================

pub use config::SurveyConfig;
pub use interval::{band_payout_tenths, band_points, band_radius, format_currency_tenths, interval};
pub use question::{DEFAULT_PROMPTS, Question, QuestionSet};
pub use record::{FinalRecord, ResponseRecord};
pub use schema::{HeaderAction, canonical_header, reconcile, render_row};
pub use screen::{BandOption, ScreenSpec, SliderField};
pub use session::{ConsentInput, PredictionInput, SurveySession};
pub use stage::Stage;

// =============================================================================
// RE-EXPORTS: Storage
// =============================================================================

pub use storage::{CsvStore, MemorySink, RecordSink};
