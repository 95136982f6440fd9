use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    errors::QuizError,
    extractors::AppForm,
    metrics::{ANSWERS_SUBMITTED_TOTAL, QUIZZES_COMPLETED_TOTAL, QUIZZES_STARTED_TOTAL},
    models::{OptionLetter, QuizSession, ScoredResult},
    services::{
        question_store::QuestionStore,
        quiz_service::{Advance, QuizService},
        session_store::SessionStore,
        AppState,
    },
    utils::signing,
};

use super::{session_id_from_jar, SESSION_COOKIE};

const DEFAULT_SAMPLE_SIZE: usize = 5;

#[derive(Debug, Serialize)]
pub struct QuizHomeView {
    pub title: String,
    pub question_count: u64,
    pub sample_size: usize,
}

#[derive(Debug, Serialize)]
pub struct QuestionOptionsView {
    pub a: String,
    pub b: String,
    pub c: String,
    pub d: String,
}

#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub index: usize,
    pub total: usize,
    pub question_id: i64,
    pub question_text: String,
    pub topic: String,
    pub options: QuestionOptionsView,
    /// Previously submitted letter, present when the user navigated back.
    pub selected: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuizResultView {
    pub total: usize,
    pub correct_count: usize,
    pub results: Vec<ScoredResult>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerForm {
    pub question_id: i64,
    pub user_answer: String,
}

pub async fn landing() -> impl IntoResponse {
    Json(json!({
        "service": "mathquiz-api",
        "version": env!("CARGO_PKG_VERSION"),
        "message": "Math practice quiz. Start at /quiz/home."
    }))
}

pub async fn quiz_home(
    State(state): State<Arc<AppState>>,
) -> Result<Json<QuizHomeView>, QuizApiError> {
    let store = QuestionStore::new(state.mongo.clone());
    let question_count = store.count().await?;

    Ok(Json(QuizHomeView {
        title: "Math Practice Quiz".to_string(),
        question_count,
        sample_size: sample_size(),
    }))
}

/// Samples a fresh question set, replaces any previous session, and sends
/// the user to the first question.
pub async fn start_quiz(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), QuizApiError> {
    let service = QuizService::new(QuestionStore::new(state.mongo.clone()));
    let session = service.start(sample_size()).await?;

    // Keep an existing session id so the user holds one cookie, otherwise
    // mint a new one.
    let session_id = session_id_from_jar(&jar, &state.config.session_secret)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let session_store = SessionStore::new(state.redis.clone());
    session_store.save(&session_id, &session).await?;

    QUIZZES_STARTED_TOTAL.inc();
    tracing::info!("Quiz session started: {}", session_id);

    let signed = signing::sign(&state.config.session_secret, &session_id);
    let cookie = Cookie::build((SESSION_COOKIE, signed))
        .path("/")
        .http_only(true)
        .build();

    Ok((jar.add(cookie), Redirect::to("/quiz/questions/0")))
}

pub async fn show_question(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(index): Path<usize>,
) -> Result<Json<QuestionView>, QuizApiError> {
    let (_, session) = load_session(&state, &jar).await?;

    let service = QuizService::new(QuestionStore::new(state.mongo.clone()));
    let (question, index, total) = service.show(&session, index).await?;

    let selected = session
        .answer_for(question.id)
        .map(|letter| letter.as_str().to_string());

    Ok(Json(QuestionView {
        index,
        total,
        question_id: question.id,
        question_text: question.question_text,
        topic: question.topic,
        options: QuestionOptionsView {
            a: question.option_a,
            b: question.option_b,
            c: question.option_c,
            d: question.option_d,
        },
        selected,
    }))
}

/// Records the submitted answer and redirects to the next question, or to
/// the results page after the last one.
pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(index): Path<usize>,
    AppForm(form): AppForm<AnswerForm>,
) -> Result<Redirect, QuizApiError> {
    let (session_id, mut session) = load_session(&state, &jar).await?;

    let letter = OptionLetter::parse(&form.user_answer)?;

    let service = QuizService::new(QuestionStore::new(state.mongo.clone()));
    let advance = service.submit_answer(&mut session, index, form.question_id, letter)?;

    let session_store = SessionStore::new(state.redis.clone());
    session_store.save(&session_id, &session).await?;

    ANSWERS_SUBMITTED_TOTAL.inc();

    match advance {
        Advance::Next(next_index) => Ok(Redirect::to(&format!("/quiz/questions/{}", next_index))),
        Advance::Completed => {
            QUIZZES_COMPLETED_TOTAL.inc();
            Ok(Redirect::to("/quiz/result"))
        }
    }
}

/// Scores the completed quiz (cached after the first computation) and
/// renders the ordered per-question verdicts.
pub async fn quiz_result(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<QuizResultView>, QuizApiError> {
    let (session_id, mut session) = load_session(&state, &jar).await?;

    if !session.completed {
        return Err(QuizError::session_state(
            "Quiz is not finished yet - answer the remaining questions first",
        )
        .into());
    }

    let service = QuizService::new(QuestionStore::new(state.mongo.clone()));
    let had_cached = session.results.is_some();
    let (results, correct_count) = service.score(&mut session).await?;

    if !had_cached {
        let session_store = SessionStore::new(state.redis.clone());
        session_store.save(&session_id, &session).await?;
    }

    Ok(Json(QuizResultView {
        total: session.total(),
        correct_count,
        results,
    }))
}

fn sample_size() -> usize {
    std::env::var("QUIZ_SAMPLE_SIZE")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_SAMPLE_SIZE)
}

/// Loads the caller's quiz session or fails with the client-visible
/// "no active quiz" error.
pub(crate) async fn load_session(
    state: &AppState,
    jar: &CookieJar,
) -> Result<(String, QuizSession), QuizApiError> {
    let session_id = session_id_from_jar(jar, &state.config.session_secret)
        .ok_or_else(|| QuizError::session_state("No active quiz - start one at /quiz/start"))?;

    let session_store = SessionStore::new(state.redis.clone());
    let session = session_store
        .load(&session_id)
        .await?
        .ok_or_else(|| QuizError::session_state("No active quiz - start one at /quiz/start"))?;

    Ok((session_id, session))
}

#[derive(Debug)]
pub enum QuizApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<QuizError> for QuizApiError {
    fn from(err: QuizError) -> Self {
        match &err {
            QuizError::NotFound(_) | QuizError::IndexOutOfRange { .. } => {
                QuizApiError::NotFound(err.to_string())
            }
            QuizError::Validation(_)
            | QuizError::InsufficientQuestions { .. }
            | QuizError::UnknownOptionLetter(_)
            | QuizError::SessionState(_) => QuizApiError::BadRequest(err.to_string()),
            QuizError::Internal(_) => {
                tracing::error!("Internal error: {:#}", err);
                QuizApiError::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for QuizApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            QuizApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            QuizApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            QuizApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(message)).into_response()
    }
}
