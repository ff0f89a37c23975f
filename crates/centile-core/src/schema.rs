//! # Canonical Persisted Schema
//!
//! The fixed column layout for persisted rows, and the header-reconciliation
//! decision applied before an append. The layout groups columns by field kind
//! across all questions (`q1_stage1..qN_stage1, q1_pred..qN_pred, ...`) and
//! is always ordered by canonical question id — the session's randomized
//! presentation order affects only the screens, never the stored columns.

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::question::QuestionSet;
use crate::record::FinalRecord;
use crate::types::FieldKind;

// =============================================================================
// IDENTITY COLUMNS
// =============================================================================

/// Identity columns preceding the per-question groups.
pub const IDENTITY_COLUMNS: [&str; 3] = ["participant_id", "timestamp", "wechat_id"];

/// Consent columns, present exactly when consent collection is enabled.
pub const CONSENT_COLUMNS: [&str; 2] = ["consent_confirmed", "consent_share"];

// =============================================================================
// CANONICAL HEADER
// =============================================================================

/// Build the canonical column header for a question set.
///
/// Layout: `participant_id, timestamp, wechat_id, [consent_confirmed,
/// consent_share,] q1_stage1..qN_stage1, q1_pred..qN_pred, q1_band..qN_band,
/// q1_low..qN_low, q1_high..qN_high`.
#[must_use]
pub fn canonical_header(questions: &QuestionSet, with_consent: bool) -> Vec<String> {
    let n = questions.len();
    let consent_cols = if with_consent { CONSENT_COLUMNS.len() } else { 0 };
    let mut header =
        Vec::with_capacity(IDENTITY_COLUMNS.len() + consent_cols + n * FieldKind::ALL.len());

    header.extend(IDENTITY_COLUMNS.iter().map(|c| (*c).to_string()));
    if with_consent {
        header.extend(CONSENT_COLUMNS.iter().map(|c| (*c).to_string()));
    }
    for kind in FieldKind::ALL {
        for id in questions.ids() {
            header.push(format!("{id}_{kind}"));
        }
    }
    header
}

/// Render a finalized record as one flat row matching [`canonical_header`].
#[must_use]
pub fn render_row(record: &FinalRecord, questions: &QuestionSet, with_consent: bool) -> Vec<String> {
    let n = questions.len();
    let consent_cols = if with_consent { CONSENT_COLUMNS.len() } else { 0 };
    let mut row =
        Vec::with_capacity(IDENTITY_COLUMNS.len() + consent_cols + n * FieldKind::ALL.len());

    row.push(record.participant_id.to_string());
    row.push(
        record
            .timestamp
            .to_rfc3339_opts(SecondsFormat::Secs, true),
    );
    row.push(record.wechat_id.clone());
    if with_consent {
        row.push(match record.consent_confirmed {
            Some(true) => "true".to_string(),
            Some(false) => "false".to_string(),
            None => String::new(),
        });
        row.push(
            record
                .consent_share
                .map(|c| c.as_str().to_string())
                .unwrap_or_default(),
        );
    }

    for kind in FieldKind::ALL {
        for id in questions.ids() {
            let cell = match kind {
                FieldKind::Stage1 => record
                    .self_reports
                    .get(&id)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
                FieldKind::Pred => record
                    .predictions
                    .get(&id)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
                FieldKind::Band => record
                    .bands
                    .get(&id)
                    .map(|b| b.as_str().to_string())
                    .unwrap_or_default(),
                FieldKind::Low => record
                    .intervals
                    .get(&id)
                    .map(|(low, _)| low.to_string())
                    .unwrap_or_default(),
                FieldKind::High => record
                    .intervals
                    .get(&id)
                    .map(|(_, high)| high.to_string())
                    .unwrap_or_default(),
            };
            row.push(cell);
        }
    }
    row
}

// =============================================================================
// HEADER RECONCILIATION
// =============================================================================

/// The action a sink must take on the stored header before appending.
///
/// Header state is driven by field presence, not schema versioning; a naive
/// append over mixed historical schemas would silently shift columns, so the
/// first row is reconciled on every write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderAction {
    /// The store is empty: write the canonical header, then the data row.
    WriteHeader,
    /// The first row differs from the canonical header: replace row 1, then
    /// append.
    ReplaceHeader,
    /// The first row already matches: append only.
    Keep,
}

/// Decide what to do with the stored header before an append.
///
/// `existing_first_row` is `None` when the store is empty.
#[must_use]
pub fn reconcile(existing_first_row: Option<&[String]>, canonical: &[String]) -> HeaderAction {
    match existing_first_row {
        None => HeaderAction::WriteHeader,
        Some(first) if first == canonical => HeaderAction::Keep,
        Some(_) => HeaderAction::ReplaceHeader,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SurveyConfig;
    use crate::record::ResponseRecord;
    use crate::types::{Band, ConsentChoice, QuestionId, ScaleValue};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn scale(v: u8) -> ScaleValue {
        ScaleValue::new(v).expect("test value in range")
    }

    fn two_questions() -> QuestionSet {
        QuestionSet::from_prompts(vec!["Likely", "Unlikely"]).expect("valid set")
    }

    #[test]
    fn header_groups_by_field_kind_not_by_question() {
        let header = canonical_header(&two_questions(), false);
        assert_eq!(
            header,
            vec![
                "participant_id",
                "timestamp",
                "wechat_id",
                "q1_stage1",
                "q2_stage1",
                "q1_pred",
                "q2_pred",
                "q1_band",
                "q2_band",
                "q1_low",
                "q2_low",
                "q1_high",
                "q2_high",
            ]
        );
    }

    #[test]
    fn consent_columns_follow_identity_columns() {
        let header = canonical_header(&two_questions(), true);
        assert_eq!(header[2], "wechat_id");
        assert_eq!(header[3], "consent_confirmed");
        assert_eq!(header[4], "consent_share");
        assert_eq!(header[5], "q1_stage1");
    }

    #[test]
    fn row_matches_header_positions() {
        let config = SurveyConfig::default();
        let questions = two_questions();
        let timestamp = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).single().expect("valid ts");
        let mut record = ResponseRecord::new(Uuid::nil(), timestamp);
        record.record_wechat_id("wx-7");
        record.record_consent(true, ConsentChoice::Deidentified);
        for (id, (s1, pred, band)) in questions
            .ids()
            .zip([(10, 12, Band::Narrow), (90, 91, Band::Wide)])
        {
            record.record_self_report(id, scale(s1));
            record.record_prediction(id, scale(pred), &config);
            record.record_band(id, band, &config);
        }
        let snapshot = record.finalize(&questions).expect("complete");

        let header = canonical_header(&questions, true);
        let row = render_row(&snapshot, &questions, true);
        assert_eq!(header.len(), row.len());

        let cell = |name: &str| {
            let idx = header.iter().position(|h| h == name).expect("column");
            row[idx].clone()
        };
        assert_eq!(cell("timestamp"), "2026-03-14T09:26:53Z");
        assert_eq!(cell("wechat_id"), "wx-7");
        assert_eq!(cell("consent_confirmed"), "true");
        assert_eq!(cell("consent_share"), "deidentified");
        assert_eq!(cell("q1_stage1"), "10");
        assert_eq!(cell("q2_pred"), "91");
        assert_eq!(cell("q1_band"), "narrow");
        assert_eq!(cell("q1_low"), "9");
        assert_eq!(cell("q1_high"), "15");
        assert_eq!(cell("q2_low"), "85");
        assert_eq!(cell("q2_high"), "97");
    }

    #[test]
    fn reconcile_empty_store_writes_header() {
        let canonical = canonical_header(&two_questions(), false);
        assert_eq!(reconcile(None, &canonical), HeaderAction::WriteHeader);
    }

    #[test]
    fn reconcile_mismatched_first_row_replaces_header() {
        let canonical = canonical_header(&two_questions(), false);
        let stale = vec!["a".to_string(), "b".to_string()];
        assert_eq!(
            reconcile(Some(&stale), &canonical),
            HeaderAction::ReplaceHeader
        );
    }

    #[test]
    fn reconcile_matching_first_row_keeps() {
        let canonical = canonical_header(&two_questions(), false);
        let same = canonical.clone();
        assert_eq!(reconcile(Some(&same), &canonical), HeaderAction::Keep);
    }

    #[test]
    fn qid_column_id_is_question_id() {
        assert_eq!(format!("{}_{}", QuestionId(4), FieldKind::Pred), "q4_pred");
    }
}
