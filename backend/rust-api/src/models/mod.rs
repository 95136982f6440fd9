pub mod conversation;
pub mod question;
pub mod session;

pub use conversation::{ChatMessage, ChatRole, Conversation};
pub use question::{OptionLetter, Question, QuestionSeed};
pub use session::{QuizSession, ScoredResult, UNANSWERED};
