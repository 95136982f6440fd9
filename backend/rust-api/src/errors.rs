use thiserror::Error;

/// Error taxonomy for the quiz domain.
///
/// Store and session errors propagate to the HTTP boundary and become a
/// visible failure there; LLM provider failures never appear here because
/// the explanation/chat services absorb them into fallback content.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("invalid question record: {0}")]
    Validation(String),

    #[error("question {0} not found")]
    NotFound(i64),

    #[error("requested {requested} questions but only {available} are available")]
    InsufficientQuestions { requested: usize, available: usize },

    #[error("question index {index} is out of range (quiz has {total} questions)")]
    IndexOutOfRange { index: usize, total: usize },

    #[error("unknown option letter: {0:?}")]
    UnknownOptionLetter(String),

    #[error("{0}")]
    SessionState(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl QuizError {
    pub fn session_state(message: impl Into<String>) -> Self {
        QuizError::SessionState(message.into())
    }
}
