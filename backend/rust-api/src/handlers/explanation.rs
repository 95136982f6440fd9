use axum::{
    extract::{Path, State},
    response::Redirect,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    errors::QuizError,
    extractors::AppForm,
    metrics::EXPLANATIONS_SERVED_TOTAL,
    models::{ChatMessage, ChatRole, ScoredResult},
    services::{
        chat_service::ChatService,
        explanation_service::{ExplanationService, EXPLANATION_FALLBACK},
        question_store::QuestionStore,
        quiz_service::QuizService,
        session_store::SessionStore,
        AppState,
    },
};

use super::quiz::{load_session, QuizApiError};

// Reserved characters for a path segment; the subject name is free-form
// user-visible text and round-trips through a redirect.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'#')
    .add(b'/')
    .add(b'%');

#[derive(Debug, Serialize)]
pub struct ExplanationView {
    pub question_id: i64,
    pub subject_name: String,
    pub question_text: String,
    pub submitted_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub explanation: String,
    /// Visible follow-up chat turns; the system prompt stays server-side.
    pub chat: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatForm {
    pub user_message: String,
}

/// Generates the tutoring explanation for one scored question (once per
/// question, cached in the session thereafter) and seeds its follow-up
/// conversation. Requesting a different question replaces both.
pub async fn show_explanation(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path((question_id, subject_name)): Path<(i64, String)>,
) -> Result<Json<ExplanationView>, QuizApiError> {
    let (session_id, mut session) = load_session(&state, &jar).await?;

    if !session.completed {
        return Err(QuizError::session_state(
            "Explanations are available after the quiz is finished",
        )
        .into());
    }

    // Reuses the cached result list; computes and caches it when the user
    // lands here without having opened the results page.
    let service = QuizService::new(QuestionStore::new(state.mongo.clone()));
    let had_cached_results = session.results.is_some();
    let (results, _) = service.score(&mut session).await?;

    let entry = results
        .iter()
        .find(|r| r.question_id == question_id)
        .cloned()
        .ok_or_else(|| {
            QuizApiError::NotFound(format!("question {} is not part of this quiz", question_id))
        })?;

    let cached = session.current_question_id == Some(question_id)
        && session.current_explanation.is_some();

    let (explanation, dirty) = if cached {
        EXPLANATIONS_SERVED_TOTAL.with_label_values(&["cache"]).inc();
        (
            session
                .current_explanation
                .clone()
                .unwrap_or_else(|| EXPLANATION_FALLBACK.to_string()),
            !had_cached_results,
        )
    } else {
        let explanation_service = ExplanationService::new(state.llm.clone());
        let correct_answer = format!("{}. {}", entry.correct_letter, entry.correct_text);
        let explanation = explanation_service
            .explain(
                &entry.question_text,
                &correct_answer,
                entry.is_correct,
                &subject_name,
            )
            .await;

        let source = if explanation == EXPLANATION_FALLBACK {
            "fallback"
        } else {
            "llm"
        };
        EXPLANATIONS_SERVED_TOTAL.with_label_values(&[source]).inc();

        let conversation =
            explanation_service.seed_conversation(&entry.question_text, &explanation);

        session.current_question_id = Some(question_id);
        session.current_explanation = Some(explanation.clone());
        session.chat_history = Some(conversation);

        (explanation, true)
    };

    if dirty {
        let session_store = SessionStore::new(state.redis.clone());
        session_store.save(&session_id, &session).await?;
    }

    Ok(Json(build_view(
        entry,
        subject_name,
        explanation,
        &session,
    )))
}

/// Advances the follow-up conversation by one turn and returns the user to
/// the explanation view.
pub async fn submit_chat_message(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path((question_id, subject_name)): Path<(i64, String)>,
    AppForm(form): AppForm<ChatForm>,
) -> Result<Redirect, QuizApiError> {
    let (session_id, mut session) = load_session(&state, &jar).await?;

    if session.current_question_id != Some(question_id) {
        return Err(QuizError::session_state(format!(
            "No active explanation for question {} - open its explanation first",
            question_id
        ))
        .into());
    }

    let conversation = session.chat_history.as_mut().ok_or_else(|| {
        QuizError::session_state("No conversation to continue - open the explanation first")
    })?;

    let chat_service = ChatService::new(state.llm.clone());
    chat_service
        .continue_conversation(conversation, form.user_message.trim())
        .await;

    let session_store = SessionStore::new(state.redis.clone());
    session_store.save(&session_id, &session).await?;

    let subject = utf8_percent_encode(&subject_name, SEGMENT);
    Ok(Redirect::to(&format!(
        "/explanation/{}/{}",
        question_id, subject
    )))
}

fn build_view(
    entry: ScoredResult,
    subject_name: String,
    explanation: String,
    session: &crate::models::QuizSession,
) -> ExplanationView {
    let chat = session
        .chat_history
        .as_ref()
        .map(|c| {
            c.messages
                .iter()
                .filter(|m| m.role != ChatRole::System)
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    ExplanationView {
        question_id: entry.question_id,
        subject_name,
        question_text: entry.question_text,
        submitted_answer: entry.submitted_answer,
        correct_answer: format!("{}. {}", entry.correct_letter, entry.correct_text),
        is_correct: entry.is_correct,
        explanation,
        chat,
    }
}
