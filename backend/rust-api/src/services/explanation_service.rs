use crate::models::{ChatMessage, Conversation};

use super::llm_client::{LlmClient, SamplingOptions};

/// Shown in place of an explanation whenever the provider call fails. The
/// flow keeps rendering; only the content degrades.
pub const EXPLANATION_FALLBACK: &str = "Sorry, the tutor is unavailable right now. \
    Your results are saved - please try requesting the explanation again in a moment.";

const EXPLANATION_OPTIONS: SamplingOptions = SamplingOptions {
    temperature: 0.5,
    max_tokens: 1500,
};

const SYSTEM_PROMPT: &str = "\
You are a highly qualified, friendly, and supportive expert tutor for high school students.
Provide a clear, step-by-step solution, focusing on logic.
Use clear headings, bold text, and lists (where applicable) to visually separate points.
Use LaTeX for all mathematical expressions.
CRITICAL: Every new thought or logical step, even within a single section, must be separated \
by a double line break to ensure proper paragraph rendering.
Be positive and encouraging.";

const CORRECT_OPENER: &str = "START RESPONSE WITH: 'Great job! You nailed it. \
Let's quickly review the steps to lock in your knowledge.'";

const INCORRECT_OPENER: &str = "START RESPONSE WITH: 'Keep pushing! Mistakes are just steps \
toward success. Let's break down this problem together so you know exactly how to tackle it \
next time.'";

const CHAT_SYSTEM_PROMPT: &str = "\
You are a friendly, patient math tutor continuing a conversation with a high school student \
about one specific practice problem. The problem and its full solution were already discussed. \
Answer follow-up questions concisely, use LaTeX for formulas, and stay encouraging.";

/// Builds the tutoring prompt, calls the LLM, and seeds the follow-up
/// conversation. Provider failures never escape this service.
pub struct ExplanationService {
    llm: LlmClient,
}

impl ExplanationService {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    /// Produces the formatted tutoring explanation, or the fixed fallback
    /// string when the provider call fails.
    pub async fn explain(
        &self,
        question_text: &str,
        correct_answer: &str,
        is_correct: bool,
        subject_name: &str,
    ) -> String {
        let messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_user_prompt(
                question_text,
                correct_answer,
                is_correct,
                subject_name,
            )),
        ];

        match self.llm.chat_completion(&messages, EXPLANATION_OPTIONS).await {
            Ok(explanation) => explanation,
            Err(e) => {
                tracing::warn!("Explanation generation failed, using fallback: {}", e);
                EXPLANATION_FALLBACK.to_string()
            }
        }
    }

    /// Seeds the 3-message follow-up conversation: system instructions, the
    /// original question as the user's opening turn, the explanation as the
    /// assistant's first reply. Follow-up turns then carry full context
    /// without re-sending either.
    pub fn seed_conversation(&self, question_text: &str, explanation: &str) -> Conversation {
        Conversation {
            messages: vec![
                ChatMessage::system(CHAT_SYSTEM_PROMPT),
                ChatMessage::user(question_text),
                ChatMessage::assistant(explanation),
            ],
        }
    }
}

/// The structured prompt contract: subject, task body, correct answer, one
/// of exactly two encouragement openers, and a strict three-section output
/// specification (analysis without the answer, numbered steps, exactly one
/// takeaway).
fn build_user_prompt(
    question_text: &str,
    correct_answer: &str,
    is_correct: bool,
    subject_name: &str,
) -> String {
    let opener = if is_correct {
        CORRECT_OPENER
    } else {
        INCORRECT_OPENER
    };

    format!(
        "### FUNCTION CALL: GENERATE_TUTOR_SOLUTION\n\
        ## INPUT PARAMETERS\n\
        - SUBJECT_NAME: {subject_name}\n\
        - TASK_BODY: {question_text}\n\
        - CORRECT_ANSWER: {correct_answer}\n\
        - STUDENT_STATUS_MESSAGE: {opener}\n\
        ---\n\
        ## OUTPUT SPECIFICATION (STRICT FORMAT)\n\
        You are an expert tutor for high-school students (ages 16-17). Your tone must be \
        supportive, structured, and educational. The response must contain exactly three \
        Markdown sections in this order:\n\
        ### 1. Task Analysis\n\
        Header: ## Task Analysis\n\
        Acknowledge the STUDENT_STATUS_MESSAGE and briefly explain what the task is about \
        without revealing the final answer.\n\
        ### 2. Correct Solution (Step-by-Step)\n\
        Header: ## Correct Solution (Step-by-Step)\n\
        Provide a clear numbered list (1., 2., 3., ...). Highlight key rules with **bold \
        text** and use LaTeX ($...$) for all formulas and mathematical expressions. Tailor \
        the explanation to the SUBJECT_NAME.\n\
        ### 3. Key Takeaway\n\
        Header: ## Key Takeaway\n\
        Provide exactly one practical, generalizable learning tip the student can apply in \
        future tasks.\n\
        ## HARD CONSTRAINTS\n\
        Follow the three-section structure exactly. Do not add extra commentary before or \
        after the sections. Keep the language simple, clear, and academically precise."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatRole;

    #[test]
    fn prompt_embeds_subject_and_task() {
        let prompt = build_user_prompt("What is 2+2?", "B. 4", false, "Algebra");
        assert!(prompt.contains("SUBJECT_NAME: Algebra"));
        assert!(prompt.contains("TASK_BODY: What is 2+2?"));
        assert!(prompt.contains("CORRECT_ANSWER: B. 4"));
    }

    #[test]
    fn prompt_opener_follows_correctness() {
        let correct = build_user_prompt("q", "a", true, "s");
        let incorrect = build_user_prompt("q", "a", false, "s");

        assert!(correct.contains("Great job!"));
        assert!(!correct.contains("Keep pushing!"));
        assert!(incorrect.contains("Keep pushing!"));
        assert!(!incorrect.contains("Great job!"));
    }

    #[test]
    fn seed_conversation_has_three_turns_in_order() {
        let service = ExplanationService::new(LlmClient::new(
            "http://127.0.0.1:9".to_string(),
            String::new(),
            "test-model".to_string(),
        ));

        let conversation = service.seed_conversation("What is 2+2?", "The answer is 4.");

        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation.messages[0].role, ChatRole::System);
        assert_eq!(conversation.messages[1].role, ChatRole::User);
        assert_eq!(conversation.messages[1].content, "What is 2+2?");
        assert_eq!(conversation.messages[2].role, ChatRole::Assistant);
        assert_eq!(conversation.messages[2].content, "The answer is 4.");
    }

    #[tokio::test]
    async fn explain_falls_back_when_provider_unreachable() {
        // Port 9 (discard) is never an HTTP listener; the transport fails
        // and the caller must still get renderable content.
        let service = ExplanationService::new(LlmClient::new(
            "http://127.0.0.1:9".to_string(),
            String::new(),
            "test-model".to_string(),
        ));

        let explanation = service.explain("What is 2+2?", "B. 4", true, "Algebra").await;

        assert_eq!(explanation, EXPLANATION_FALLBACK);
    }
}
