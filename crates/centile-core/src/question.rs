//! # Question Set and Presentation Order
//!
//! A `QuestionSet` is the immutable list of prompts for one deployment,
//! validated at construction: ids are exactly 1..=N in order and prompts are
//! non-blank. The presentation order for a session is computed exactly once,
//! at session creation, and stored on the session; the canonical persisted
//! column layout is always keyed by id, never by screen position.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::types::{QuestionId, SurveyError};

// =============================================================================
// QUESTION
// =============================================================================

/// One prompt with its stable identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Stable id, 1..=N.
    pub id: QuestionId,
    /// The probability expression the participant rates.
    pub prompt: String,
}

impl Question {
    /// Create a new question.
    #[must_use]
    pub fn new(id: QuestionId, prompt: impl Into<String>) -> Self {
        Self {
            id,
            prompt: prompt.into(),
        }
    }
}

// =============================================================================
// QUESTION SET
// =============================================================================

/// The built-in probability-expression prompts.
///
/// Fifteen common verbal probability expressions, ordered roughly from most
/// to least certain.
pub const DEFAULT_PROMPTS: [&str; 15] = [
    "Almost certain",
    "Highly likely",
    "Very good chance",
    "Probable",
    "Likely",
    "Probably",
    "We believe",
    "Better than even",
    "About even",
    "We doubt",
    "Improbable",
    "Unlikely",
    "Probably not",
    "Little chance",
    "Almost no chance",
];

/// The ordered, validated list of questions for one deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Question>", into = "Vec<Question>")]
pub struct QuestionSet {
    questions: Vec<Question>,
}

impl QuestionSet {
    /// Build a set from prompt strings, assigning ids 1..=N.
    pub fn from_prompts<I, S>(prompts: I) -> Result<Self, SurveyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let questions: Vec<Question> = prompts
            .into_iter()
            .enumerate()
            .map(|(i, prompt)| Question::new(QuestionId((i + 1) as u16), prompt))
            .collect();
        Self::from_questions(questions)
    }

    /// Build a set from complete questions, validating ids and prompts.
    pub fn from_questions(questions: Vec<Question>) -> Result<Self, SurveyError> {
        if questions.is_empty() {
            return Err(SurveyError::InvalidQuestionSet(
                "question set is empty".to_string(),
            ));
        }
        for (i, question) in questions.iter().enumerate() {
            let expected = (i + 1) as u16;
            if question.id.value() != expected {
                return Err(SurveyError::InvalidQuestionSet(format!(
                    "expected id {expected} at position {i}, found {}",
                    question.id
                )));
            }
            if question.prompt.trim().is_empty() {
                return Err(SurveyError::InvalidQuestionSet(format!(
                    "question {} has a blank prompt",
                    question.id
                )));
            }
        }
        Ok(Self { questions })
    }

    /// The built-in fifteen-prompt set.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            questions: DEFAULT_PROMPTS
                .iter()
                .enumerate()
                .map(|(i, prompt)| Question::new(QuestionId((i + 1) as u16), *prompt))
                .collect(),
        }
    }

    /// Number of questions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the set is empty. Always false for a constructed set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Look up a question by id.
    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        let index = id.value().checked_sub(1)? as usize;
        self.questions.get(index)
    }

    /// All ids in canonical order, 1..=N.
    pub fn ids(&self) -> impl Iterator<Item = QuestionId> + '_ {
        self.questions.iter().map(|q| q.id)
    }

    /// Iterate questions in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    /// Compute the presentation order for one session.
    ///
    /// Identity order when randomization is disabled, otherwise a uniform
    /// shuffle from the session-scoped random source. Callers store the
    /// result on the session; re-deriving it mid-session is forbidden.
    #[must_use]
    pub fn presentation_order<R: Rng + ?Sized>(
        &self,
        randomize: bool,
        rng: &mut R,
    ) -> Vec<QuestionId> {
        let mut order: Vec<QuestionId> = self.ids().collect();
        if randomize {
            order.shuffle(rng);
        }
        order
    }
}

impl TryFrom<Vec<Question>> for QuestionSet {
    type Error = SurveyError;

    fn try_from(questions: Vec<Question>) -> Result<Self, Self::Error> {
        Self::from_questions(questions)
    }
}

impl From<QuestionSet> for Vec<Question> {
    fn from(set: QuestionSet) -> Self {
        set.questions
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::BTreeSet;

    #[test]
    fn builtin_set_has_fifteen_questions() {
        let set = QuestionSet::builtin();
        assert_eq!(set.len(), 15);
        assert_eq!(set.get(QuestionId(1)).expect("q1").prompt, "Almost certain");
        assert_eq!(
            set.get(QuestionId(15)).expect("q15").prompt,
            "Almost no chance"
        );
        assert!(set.get(QuestionId(16)).is_none());
        assert!(set.get(QuestionId(0)).is_none());
    }

    #[test]
    fn empty_set_rejected() {
        let result = QuestionSet::from_prompts(Vec::<String>::new());
        assert!(matches!(result, Err(SurveyError::InvalidQuestionSet(_))));
    }

    #[test]
    fn blank_prompt_rejected() {
        let result = QuestionSet::from_prompts(vec!["Likely", "   "]);
        assert!(result.is_err());
    }

    #[test]
    fn gapped_ids_rejected() {
        let questions = vec![
            Question::new(QuestionId(1), "Likely"),
            Question::new(QuestionId(3), "Unlikely"),
        ];
        assert!(QuestionSet::from_questions(questions).is_err());
    }

    #[test]
    fn identity_order_when_randomization_disabled() {
        let set = QuestionSet::builtin();
        let mut rng = StdRng::seed_from_u64(7);
        let order = set.presentation_order(false, &mut rng);
        let canonical: Vec<QuestionId> = set.ids().collect();
        assert_eq!(order, canonical);
    }

    #[test]
    fn shuffled_order_is_a_permutation() {
        let set = QuestionSet::builtin();
        let mut rng = StdRng::seed_from_u64(42);
        let order = set.presentation_order(true, &mut rng);

        let expected: BTreeSet<QuestionId> = set.ids().collect();
        let got: BTreeSet<QuestionId> = order.iter().copied().collect();
        assert_eq!(order.len(), set.len());
        assert_eq!(got, expected);
    }

    #[test]
    fn shuffle_is_session_scoped_and_reproducible() {
        let set = QuestionSet::builtin();
        let order1 = set.presentation_order(true, &mut StdRng::seed_from_u64(11));
        let order2 = set.presentation_order(true, &mut StdRng::seed_from_u64(11));
        assert_eq!(order1, order2);
    }
}
