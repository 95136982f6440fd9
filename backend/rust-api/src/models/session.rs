use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::conversation::Conversation;
use super::question::OptionLetter;

/// Sentinel recorded in place of a letter for questions the user never
/// answered. Scored entries always exist for every question in the
/// sequence; this keeps an unanswered one from looking like a hole.
pub const UNANSWERED: &str = "unanswered";

/// Per-user quiz state, stored as one JSON value in the session store.
///
/// Answer-map keys are the question id rendered as a string; that is the
/// session store's contract, and it keeps the serialized shape a plain JSON
/// object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSession {
    pub question_ids: Vec<i64>,
    pub answers: HashMap<String, OptionLetter>,
    pub completed: bool,
    pub results: Option<Vec<ScoredResult>>,
    pub current_question_id: Option<i64>,
    pub current_explanation: Option<String>,
    pub chat_history: Option<Conversation>,
    pub started_at: DateTime<Utc>,
}

impl QuizSession {
    /// Fresh session over the sampled question ids. Replaces any previous
    /// session wholesale, which discards cached results and conversation.
    pub fn new(question_ids: Vec<i64>) -> Self {
        Self {
            question_ids,
            answers: HashMap::new(),
            completed: false,
            results: None,
            current_question_id: None,
            current_explanation: None,
            chat_history: None,
            started_at: Utc::now(),
        }
    }

    pub fn total(&self) -> usize {
        self.question_ids.len()
    }

    pub fn contains_question(&self, question_id: i64) -> bool {
        self.question_ids.contains(&question_id)
    }

    pub fn answer_for(&self, question_id: i64) -> Option<OptionLetter> {
        self.answers.get(&question_id.to_string()).copied()
    }

    /// Records an answer, last write wins. Re-submitting a different letter
    /// on back-navigation overwrites the earlier one.
    pub fn record_answer(&mut self, question_id: i64, letter: OptionLetter) {
        self.answers.insert(question_id.to_string(), letter);
    }
}

/// Per-question verdict computed at result time and cached in the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredResult {
    pub question_id: i64,
    pub question_text: String,
    pub submitted_answer: String,
    pub correct_letter: OptionLetter,
    pub correct_text: String,
    pub is_correct: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_answer_is_idempotent_for_identical_submission() {
        let mut session = QuizSession::new(vec![1, 2, 3]);
        session.record_answer(2, OptionLetter::B);
        session.record_answer(2, OptionLetter::B);

        assert_eq!(session.answers.len(), 1);
        assert_eq!(session.answer_for(2), Some(OptionLetter::B));
    }

    #[test]
    fn record_answer_overwrites_on_resubmission() {
        let mut session = QuizSession::new(vec![1, 2, 3]);
        session.record_answer(2, OptionLetter::B);
        session.record_answer(2, OptionLetter::D);

        assert_eq!(session.answers.len(), 1);
        assert_eq!(session.answer_for(2), Some(OptionLetter::D));
    }

    #[test]
    fn new_session_has_no_cached_state() {
        let session = QuizSession::new(vec![4, 5]);

        assert!(!session.completed);
        assert!(session.results.is_none());
        assert!(session.chat_history.is_none());
        assert!(session.current_explanation.is_none());
    }
}
