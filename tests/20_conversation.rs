mod common;

use std::sync::Arc;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn relays_message_to_model() -> Result<()> {
    let app = common::app();
    let token = common::token("alice@example.com", false);

    let res = common::post(
        &app.router,
        "/conversation",
        Some(&token),
        json!({ "message": "hello", "conversation_id": "c1" }),
    )
    .await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["conversation_id"], "c1");
    assert_eq!(res.body["user_id"], "alice@example.com");
    assert_eq!(res.body["response"], "[anthropic.claude-3-sonnet-20240229-v1:0] hello");
    Ok(())
}

#[tokio::test]
async fn generates_conversation_id_for_anonymous_caller() -> Result<()> {
    let app = common::app();
    let res = common::post(&app.router, "/conversation", None, json!({ "message": "hi" })).await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["user_id"], "anonymous");
    let id = res.body["conversation_id"].as_str().unwrap_or_default();
    assert!(uuid::Uuid::parse_str(id).is_ok(), "not a uuid: {}", id);
    Ok(())
}

#[tokio::test]
async fn garbage_token_is_anonymous() -> Result<()> {
    let app = common::app();
    let res = common::post(&app.router, "/conversation", Some("not-a-jwt"), json!({ "message": "hi" })).await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["user_id"], "anonymous");
    Ok(())
}

#[tokio::test]
async fn missing_message_is_bad_request() -> Result<()> {
    let app = common::app();

    let res = common::post(&app.router, "/conversation", None, json!({ "conversation_id": "c1" })).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body, json!({ "error": "No message provided" }));

    let res = common::post(&app.router, "/conversation", None, json!({ "message": "" })).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = common::send(&app.router, Method::POST, "/conversation", None, None).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_bad_request() -> Result<()> {
    let app = common::app();
    let res = common::send(&app.router, Method::POST, "/conversation", None, Some("{not json")).await?;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["error"].as_str().unwrap_or_default().starts_with("Invalid JSON body"));
    Ok(())
}

#[tokio::test]
async fn model_failure_is_internal_error() -> Result<()> {
    let app = common::app_with_model(Arc::new(common::FailingModel));
    let res = common::post(&app.router, "/conversation", None, json!({ "message": "hi" })).await?;

    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = res.body["error"].as_str().unwrap_or_default();
    assert!(error.starts_with("Error processing conversation:"), "{}", error);
    assert!(error.contains("model overloaded"));
    Ok(())
}
