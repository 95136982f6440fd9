use std::collections::HashMap;

use crate::errors::QuizError;
use crate::models::{OptionLetter, Question, QuizSession, ScoredResult, UNANSWERED};

use super::question_store::QuestionStore;

/// Where the quiz goes after an answer is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next(usize),
    Completed,
}

/// The session-scoped quiz state machine: sampling, sequencing, answer
/// collection and scoring. Mutates the session record it is handed; the
/// caller persists it.
pub struct QuizService {
    store: QuestionStore,
}

impl QuizService {
    pub fn new(store: QuestionStore) -> Self {
        Self { store }
    }

    /// Starts a fresh quiz over `sample_size` randomly chosen questions.
    /// The returned session replaces any previous one wholesale, so cached
    /// results and conversation state from an earlier quiz are gone.
    pub async fn start(&self, sample_size: usize) -> Result<QuizSession, QuizError> {
        let question_ids = self.store.sample(sample_size).await?;
        tracing::info!(
            "Quiz started with {} questions: {:?}",
            question_ids.len(),
            question_ids
        );
        Ok(QuizSession::new(question_ids))
    }

    /// Question at position `index` plus progress info. An out-of-range
    /// index is a caller bug and propagates, it is never clamped.
    pub async fn show(
        &self,
        session: &QuizSession,
        index: usize,
    ) -> Result<(Question, usize, usize), QuizError> {
        let total = session.total();
        let question_id = *session
            .question_ids
            .get(index)
            .ok_or(QuizError::IndexOutOfRange { index, total })?;

        let question = self.store.get(question_id).await?;
        Ok((question, index, total))
    }

    /// Records the answer (last write wins) and decides where to go next.
    /// The final index transitions the session to completed.
    pub fn submit_answer(
        &self,
        session: &mut QuizSession,
        index: usize,
        question_id: i64,
        letter: OptionLetter,
    ) -> Result<Advance, QuizError> {
        let total = session.total();
        if index >= total {
            return Err(QuizError::IndexOutOfRange { index, total });
        }
        if !session.contains_question(question_id) {
            return Err(QuizError::Validation(format!(
                "question {} is not part of this quiz",
                question_id
            )));
        }

        session.record_answer(question_id, letter);

        if index + 1 == total {
            session.completed = true;
            tracing::info!("Quiz completed with {} answers", session.answers.len());
            Ok(Advance::Completed)
        } else {
            Ok(Advance::Next(index + 1))
        }
    }

    /// Scores the session, caching the result list for reuse (the
    /// explanation flow looks entries up by question id). Tolerant of a
    /// partially answered map: unanswered questions score as incorrect with
    /// the sentinel submitted value.
    pub async fn score(
        &self,
        session: &mut QuizSession,
    ) -> Result<(Vec<ScoredResult>, usize), QuizError> {
        if let Some(cached) = &session.results {
            let correct_count = cached.iter().filter(|r| r.is_correct).count();
            return Ok((cached.clone(), correct_count));
        }

        let mut questions = Vec::with_capacity(session.total());
        for &id in &session.question_ids {
            questions.push(self.store.get(id).await?);
        }

        let (results, correct_count) = score_questions(&questions, &session.answers);

        for result in &results {
            let label = if result.is_correct { "true" } else { "false" };
            crate::metrics::ANSWERS_SCORED_TOTAL
                .with_label_values(&[label])
                .inc();
        }

        session.results = Some(results.clone());
        tracing::info!(
            "Quiz scored: {}/{} correct",
            correct_count,
            session.total()
        );

        Ok((results, correct_count))
    }
}

/// Pure scoring pass over the ordered question list. One entry per
/// question, in sequence order; correctness is exact letter match.
pub fn score_questions(
    questions: &[Question],
    answers: &HashMap<String, OptionLetter>,
) -> (Vec<ScoredResult>, usize) {
    let mut results = Vec::with_capacity(questions.len());
    let mut correct_count = 0;

    for question in questions {
        let submitted = answers.get(&question.id.to_string()).copied();
        let (correct_letter, correct_text) = question.resolve_correct_option();
        let is_correct = submitted == Some(correct_letter);
        if is_correct {
            correct_count += 1;
        }

        results.push(ScoredResult {
            question_id: question.id,
            question_text: question.question_text.clone(),
            submitted_answer: submitted
                .map(|l| l.as_str().to_string())
                .unwrap_or_else(|| UNANSWERED.to_string()),
            correct_letter,
            correct_text: correct_text.to_string(),
            is_correct,
        });
    }

    (results, correct_count)
}
