mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::spawn_app;

#[tokio::test]
async fn generating_a_suggestion_persists_and_lists_it() {
    let app = spawn_app();
    let created = app.create_document("Essay", "<p>Hello world</p>").await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, suggestion) = app
        .post_json(
            "/assistant/suggestions",
            json!({
                "document_id": id,
                "instruction": "Make it formal",
                "editor_html": "<p>Hello <b>world</b></p>"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(suggestion["content"], "<p>Mock reply.</p>");
    assert_eq!(suggestion["prompt"], "Make it formal");
    assert_eq!(suggestion["kind"], "generation");

    let calls = app.provider.recorded_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0][1].content,
        "Context:\nHello world\n\nPrompt: Make it formal"
    );

    let (status, body) = app.get("/assistant/suggestions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["suggestions"][0]["id"], suggestion["id"]);
    assert_eq!(body["success_count"], 1);
    assert_eq!(body["failure_count"], 0);
}

#[tokio::test]
async fn empty_editor_content_is_rejected_without_an_inference_call() {
    let app = spawn_app();
    let created = app.create_document("Essay", "").await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .post_json(
            "/assistant/suggestions",
            json!({
                "document_id": id,
                "instruction": "Improve",
                "editor_html": "<p>  </p>"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.provider.call_count(), 0);
}

#[tokio::test]
async fn asking_without_support_mode_fails_and_issues_no_calls() {
    let app = spawn_app();
    app.create_document("Essay", "<p>x</p>").await;

    let (status, _) = app
        .post_json("/assistant/messages", json!({ "question": "Hello?" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.provider.call_count(), 0);
}

#[tokio::test]
async fn support_mode_round_trip_keeps_both_histories() {
    let app = spawn_app();
    let created = app.create_document("Essay", "<p>Hello world</p>").await;
    let id = created["id"].as_str().unwrap().to_string();

    // One suggestion in create mode.
    let (status, _) = app
        .post_json(
            "/assistant/suggestions",
            json!({
                "document_id": id,
                "instruction": "Summarize",
                "editor_html": "<p>Hello world</p>"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // Into support mode, ask a question.
    let (status, transcript) = app
        .post_json("/assistant/mode", json!({ "mode": "support" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(transcript["session_id"].is_string());

    let (status, reply) = app
        .post_json("/assistant/messages", json!({ "question": "What tone is this?" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reply["role"], "assistant");
    assert_eq!(reply["order_index"], 1);

    // Back to create mode: transcript preserved, session detached.
    let (status, body) = app
        .post_json("/assistant/mode", json!({ "mode": "create" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["session_id"].is_null());
    assert_eq!(body["messages"].as_array().unwrap().len(), 2);

    let (_, suggestions) = app.get("/assistant/suggestions").await;
    assert_eq!(suggestions["suggestions"].as_array().unwrap().len(), 1);

    // Re-entering support reuses the same session.
    let (status, again) = app
        .post_json("/assistant/mode", json!({ "mode": "support" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["session_id"], transcript["session_id"]);
    assert_eq!(again["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn clear_in_each_mode_touches_only_its_own_records() {
    let app = spawn_app();
    let created = app.create_document("Essay", "<p>Hello world</p>").await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .post_json(
            "/assistant/suggestions",
            json!({
                "document_id": id,
                "instruction": "Summarize",
                "editor_html": "<p>Hello world</p>"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    app.post_json("/assistant/mode", json!({ "mode": "support" }))
        .await;
    app.post_json("/assistant/messages", json!({ "question": "A question" }))
        .await;

    // Support-mode clear: transcript only.
    let (status, body) = app.post_empty("/assistant/clear").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cleared"], "transcript");

    let (_, transcript) = app.get("/assistant/transcript").await;
    assert!(transcript["messages"].as_array().unwrap().is_empty());
    let (_, suggestions) = app.get("/assistant/suggestions").await;
    assert_eq!(suggestions["suggestions"].as_array().unwrap().len(), 1);

    // Create-mode clear: suggestions only.
    app.post_json("/assistant/mode", json!({ "mode": "create" }))
        .await;
    let (status, body) = app.post_empty("/assistant/clear").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cleared"], "suggestions");

    let (_, suggestions) = app.get("/assistant/suggestions").await;
    assert!(suggestions["suggestions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn feedback_is_recorded_on_the_suggestion() {
    let app = spawn_app();
    let created = app.create_document("Essay", "<p>Hello world</p>").await;
    let id = created["id"].as_str().unwrap().to_string();

    let (_, suggestion) = app
        .post_json(
            "/assistant/suggestions",
            json!({
                "document_id": id,
                "instruction": "Summarize",
                "editor_html": "<p>Hello world</p>"
            }),
        )
        .await;
    let suggestion_id = suggestion["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .put_json(
            &format!("/assistant/suggestions/{suggestion_id}/feedback"),
            json!({ "feedback": "positive" }),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app.get("/assistant/suggestions").await;
    assert_eq!(body["suggestions"][0]["feedback"], "positive");
}

#[tokio::test]
async fn alternatives_and_analyze_return_generated_text() {
    let app = spawn_app();
    app.create_document("Essay", "<p>Hello</p>").await;

    let (status, body) = app
        .post_json("/assistant/alternatives", json!({ "text": "Hello there" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "<p>Mock reply.</p>");

    let (status, body) = app
        .post_json("/assistant/analyze", json!({ "text": "Hello there" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "<p>Mock reply.</p>");

    assert_eq!(app.provider.call_count(), 2);
}
