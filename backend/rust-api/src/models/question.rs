use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::QuizError;

/// One of the four answer options of a multiple-choice question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionLetter {
    A,
    B,
    C,
    D,
}

impl OptionLetter {
    /// Parses a letter coming from form input. Stored questions carry the
    /// typed enum, so this is only reachable for user-submitted values.
    pub fn parse(value: &str) -> Result<Self, QuizError> {
        match value.trim() {
            "A" | "a" => Ok(OptionLetter::A),
            "B" | "b" => Ok(OptionLetter::B),
            "C" | "c" => Ok(OptionLetter::C),
            "D" | "d" => Ok(OptionLetter::D),
            other => Err(QuizError::UnknownOptionLetter(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionLetter::A => "A",
            OptionLetter::B => "B",
            OptionLetter::C => "C",
            OptionLetter::D => "D",
        }
    }
}

impl fmt::Display for OptionLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored multiple-choice question. Immutable after seed load; owned by
/// the question store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "_id")]
    pub id: i64,
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_option: OptionLetter,
    pub topic: String,
}

impl Question {
    pub fn option_text(&self, letter: OptionLetter) -> &str {
        match letter {
            OptionLetter::A => &self.option_a,
            OptionLetter::B => &self.option_b,
            OptionLetter::C => &self.option_c,
            OptionLetter::D => &self.option_d,
        }
    }

    /// Maps the stored correct letter to `(letter, option_text)`.
    pub fn resolve_correct_option(&self) -> (OptionLetter, &str) {
        (self.correct_option, self.option_text(self.correct_option))
    }
}

/// Strict parse target for one seed record. A missing required field fails
/// the serde parse, a non-A–D `correct_option` fails the enum parse, and
/// empty strings fail validation; a bad record aborts the whole batch.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuestionSeed {
    #[validate(length(min = 1, message = "question_text must not be empty"))]
    pub question_text: String,
    #[validate(length(min = 1, message = "option_a must not be empty"))]
    pub option_a: String,
    #[validate(length(min = 1, message = "option_b must not be empty"))]
    pub option_b: String,
    #[validate(length(min = 1, message = "option_c must not be empty"))]
    pub option_c: String,
    #[validate(length(min = 1, message = "option_d must not be empty"))]
    pub option_d: String,
    pub correct_option: OptionLetter,
    #[serde(default)]
    pub topic: String,
}

impl QuestionSeed {
    /// Materializes the seed as a stored question under the given id.
    pub fn into_question(self, id: i64) -> Question {
        Question {
            id,
            question_text: self.question_text,
            option_a: self.option_a,
            option_b: self.option_b,
            option_c: self.option_c,
            option_d: self.option_d,
            correct_option: self.correct_option,
            topic: self.topic,
        }
    }
}
