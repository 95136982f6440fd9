use crate::metrics::CHAT_TURNS_TOTAL;
use crate::models::{ChatMessage, Conversation};

use super::llm_client::{LlmClient, SamplingOptions};

/// Substituted for the assistant's reply when the provider call fails; the
/// turn pair is still appended so the conversation never ends on a
/// dangling user message.
pub const CHAT_FALLBACK: &str =
    "Sorry, I could not process your message right now. Please try again.";

// Warmer sampling and a tighter cap than the initial explanation.
const CHAT_OPTIONS: SamplingOptions = SamplingOptions {
    temperature: 0.7,
    max_tokens: 700,
};

/// Advances one explanation's follow-up chat. The entire conversation is
/// forwarded on every turn; there is no truncation or windowing, which is
/// an explicit scope limit.
pub struct ChatService {
    llm: LlmClient,
}

impl ChatService {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    /// Appends the user turn and the assistant's reply (fallback text on
    /// failure) and returns the reply. From the caller's view both turns
    /// land together or not at all.
    pub async fn continue_conversation(
        &self,
        conversation: &mut Conversation,
        user_message: &str,
    ) -> String {
        let mut outgoing = conversation.messages.clone();
        outgoing.push(ChatMessage::user(user_message));

        let reply = match self.llm.chat_completion(&outgoing, CHAT_OPTIONS).await {
            Ok(reply) => {
                CHAT_TURNS_TOTAL.with_label_values(&["success"]).inc();
                reply
            }
            Err(e) => {
                tracing::warn!("Chat turn failed, substituting fallback reply: {}", e);
                CHAT_TURNS_TOTAL.with_label_values(&["fallback"]).inc();
                CHAT_FALLBACK.to_string()
            }
        };

        conversation.push(ChatMessage::user(user_message));
        conversation.push(ChatMessage::assistant(&reply));

        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatRole;

    fn unreachable_service() -> ChatService {
        ChatService::new(LlmClient::new(
            "http://127.0.0.1:9".to_string(),
            String::new(),
            "test-model".to_string(),
        ))
    }

    fn seeded_conversation() -> Conversation {
        Conversation {
            messages: vec![
                ChatMessage::system("tutor instructions"),
                ChatMessage::user("What is 2+2?"),
                ChatMessage::assistant("The answer is 4."),
            ],
        }
    }

    #[tokio::test]
    async fn failed_turn_appends_user_and_fallback_assistant() {
        let service = unreachable_service();
        let mut conversation = seeded_conversation();

        let reply = service
            .continue_conversation(&mut conversation, "Why is it 4?")
            .await;

        assert_eq!(reply, CHAT_FALLBACK);
        assert_eq!(conversation.len(), 5);

        let user_turn = &conversation.messages[3];
        assert_eq!(user_turn.role, ChatRole::User);
        assert_eq!(user_turn.content, "Why is it 4?");

        let assistant_turn = &conversation.messages[4];
        assert_eq!(assistant_turn.role, ChatRole::Assistant);
        assert_eq!(assistant_turn.content, CHAT_FALLBACK);
    }

    #[tokio::test]
    async fn conversation_grows_by_exactly_two_turns_per_call() {
        let service = unreachable_service();
        let mut conversation = seeded_conversation();

        service
            .continue_conversation(&mut conversation, "first follow-up")
            .await;
        service
            .continue_conversation(&mut conversation, "second follow-up")
            .await;

        assert_eq!(conversation.len(), 7);
    }
}
