use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serial_test::serial;
use tower::ServiceExt;

use mathquiz_api::services::{
    chat_service::CHAT_FALLBACK, explanation_service::EXPLANATION_FALLBACK,
};

mod common;

// The test app points the LLM client at an unroutable address, so every
// provider call fails and the handlers must serve the fixed fallback
// content instead of erroring.

#[tokio::test]
#[serial]
async fn test_explanation_before_completion_is_client_error() {
    let app = common::create_test_app().await;
    let cookie = start_quiz(&app).await;

    let (status, _) = get_explanation(&app, &cookie, 1, "Algebra").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[serial]
async fn test_explanation_serves_fallback_when_provider_unreachable() {
    let app = common::create_test_app().await;
    let cookie = complete_quiz(&app).await;

    let (status, body) = get_explanation(&app, &cookie, 2, "Algebra").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["question_id"], 2);
    assert_eq!(body["subject_name"], "Algebra");
    assert_eq!(body["is_correct"], false);
    assert_eq!(body["correct_answer"], "B. 30");
    assert_eq!(body["explanation"], EXPLANATION_FALLBACK);

    // Seeded conversation minus the system prompt: the question as the
    // user's opening turn and the explanation as the first reply.
    let chat = body["chat"].as_array().unwrap();
    assert_eq!(chat.len(), 2);
    assert_eq!(chat[0]["role"], "user");
    assert_eq!(chat[0]["content"], "What is 5 * 6?");
    assert_eq!(chat[1]["role"], "assistant");
}

#[tokio::test]
#[serial]
async fn test_explanation_is_replayed_from_session_cache() {
    let app = common::create_test_app().await;
    let cookie = complete_quiz(&app).await;

    let (_, first) = get_explanation(&app, &cookie, 2, "Algebra").await;
    let (status, second) = get_explanation(&app, &cookie, 2, "Algebra").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["explanation"], second["explanation"]);
    assert_eq!(
        first["chat"].as_array().unwrap().len(),
        second["chat"].as_array().unwrap().len()
    );
}

#[tokio::test]
#[serial]
async fn test_explanation_for_foreign_question_returns_404() {
    let app = common::create_test_app().await;
    let cookie = complete_quiz(&app).await;

    let (status, _) = get_explanation(&app, &cookie, 999, "Algebra").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[serial]
async fn test_switching_questions_replaces_conversation() {
    let app = common::create_test_app().await;
    let cookie = complete_quiz(&app).await;

    let (_, first) = get_explanation(&app, &cookie, 2, "Algebra").await;
    assert_eq!(first["chat"][0]["content"], "What is 5 * 6?");

    let (status, second) = get_explanation(&app, &cookie, 3, "Algebra").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["question_id"], 3);
    assert_eq!(second["chat"][0]["content"], "What is 10 - 7?");
    assert_eq!(second["chat"].as_array().unwrap().len(), 2);
}

#[tokio::test]
#[serial]
async fn test_chat_appends_user_turn_and_fallback_reply() {
    let app = common::create_test_app().await;
    let cookie = complete_quiz(&app).await;

    get_explanation(&app, &cookie, 2, "Algebra").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/chat/submit/2/Algebra")
                .header("content-type", "application/x-www-form-urlencoded")
                .header("cookie", &cookie)
                .body(Body::from("user_message=Why+is+it+30%3F"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get("location").unwrap(),
        "/explanation/2/Algebra"
    );

    let (_, body) = get_explanation(&app, &cookie, 2, "Algebra").await;
    let chat = body["chat"].as_array().unwrap();

    // Seed pair plus exactly one user/assistant turn pair.
    assert_eq!(chat.len(), 4);
    assert_eq!(chat[2]["role"], "user");
    assert_eq!(chat[2]["content"], "Why is it 30?");
    assert_eq!(chat[3]["role"], "assistant");
    assert_eq!(chat[3]["content"], CHAT_FALLBACK);
}

#[tokio::test]
#[serial]
async fn test_chat_without_active_explanation_is_client_error() {
    let app = common::create_test_app().await;
    let cookie = complete_quiz(&app).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/chat/submit/2/Algebra")
                .header("content-type", "application/x-www-form-urlencoded")
                .header("cookie", &cookie)
                .body(Body::from("user_message=hello"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

async fn start_quiz(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/quiz/start")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    common::session_cookie(&response)
}

/// Walks the whole quiz answering question 2 wrong ("A" where "B" is
/// correct) and the rest right, then opens the results page.
async fn complete_quiz(app: &Router) -> String {
    let cookie = start_quiz(app).await;

    for index in 0..3 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(format!("/quiz/questions/{}", index))
                    .header("cookie", &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let question: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        let question_id = question["question_id"].as_i64().unwrap();
        let letter = match question_id {
            1 => "A",
            2 => "A", // wrong on purpose, correct is B
            3 => "C",
            other => panic!("unexpected question id {}", other),
        };

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/quiz/answer/{}", index))
                    .header("content-type", "application/x-www-form-urlencoded")
                    .header("cookie", &cookie)
                    .body(Body::from(format!(
                        "question_id={}&user_answer={}",
                        question_id, letter
                    )))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/quiz/result")
                .header("cookie", &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    cookie
}

async fn get_explanation(
    app: &Router,
    cookie: &str,
    question_id: i64,
    subject: &str,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/explanation/{}/{}", question_id, subject))
                .header("cookie", cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);

    (status, body)
}
