#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;

use feedback_api::app::{router, AppState};
use feedback_api::auth::GatewayTrustedVerifier;
use feedback_api::config::AppConfig;
use feedback_api::database::{FeedbackStore, InMemoryFeedbackStore, StoreError};
use feedback_api::services::{ModelClient, ModelError};
use feedback_api::types::{FeedbackRecord, FeedbackType, Page, PageRequest, Review};

/// Replies with the prompt it was given
pub struct EchoModel;

#[async_trait]
impl ModelClient for EchoModel {
    async fn converse(&self, model_id: &str, message: &str) -> Result<String, ModelError> {
        Ok(format!("[{}] {}", model_id, message))
    }
}

pub struct FailingModel;

#[async_trait]
impl ModelClient for FailingModel {
    async fn converse(&self, _model_id: &str, _message: &str) -> Result<String, ModelError> {
        Err(ModelError::Api {
            status: 503,
            body: "model overloaded".to_string(),
        })
    }
}

/// Store whose every call fails, for the 500 paths
pub struct BrokenStore;

fn down() -> StoreError {
    StoreError::Backend("connection refused".to_string())
}

#[async_trait]
impl FeedbackStore for BrokenStore {
    async fn put(&self, _record: &FeedbackRecord) -> Result<(), StoreError> {
        Err(down())
    }
    async fn get(&self, _id: &str) -> Result<Option<FeedbackRecord>, StoreError> {
        Err(down())
    }
    async fn query_by_conversation(&self, _conversation_id: &str) -> Result<Vec<FeedbackRecord>, StoreError> {
        Err(down())
    }
    async fn query_by_user(&self, _user_id: &str) -> Result<Vec<FeedbackRecord>, StoreError> {
        Err(down())
    }
    async fn scan(&self, _feedback_type: Option<FeedbackType>, _page: &PageRequest) -> Result<Page, StoreError> {
        Err(down())
    }
    async fn mark_reviewed(&self, _id: &str, _review: &Review) -> Result<bool, StoreError> {
        Err(down())
    }
    async fn health_check(&self) -> Result<(), StoreError> {
        Err(down())
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryFeedbackStore>,
}

pub fn app() -> TestApp {
    app_with_model(Arc::new(EchoModel))
}

pub fn app_with_model(model: Arc<dyn ModelClient>) -> TestApp {
    let store = Arc::new(InMemoryFeedbackStore::new());
    let state = AppState::new(AppConfig::local(), store.clone(), model, Arc::new(GatewayTrustedVerifier));
    TestApp {
        router: router(state),
        store,
    }
}

pub fn app_with_store(store: Arc<dyn FeedbackStore>) -> Router {
    router(AppState::new(
        AppConfig::local(),
        store,
        Arc::new(EchoModel),
        Arc::new(GatewayTrustedVerifier),
    ))
}

/// Bearer token carrying the identity claims; the gateway verifier ignores the signature
pub fn token(user: &str, reviewer: bool) -> String {
    let claims = json!({
        "email": user,
        "custom:is_reviewer": if reviewer { "true" } else { "false" },
    });
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"test")).unwrap_or_default()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn send(router: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<&str>) -> Result<TestResponse> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let request = builder.body(Body::from(body.unwrap_or_default().to_string()))?;

    let response = router.clone().oneshot(request).await?;
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };

    Ok(TestResponse { status, headers, body })
}

pub async fn post(router: &Router, uri: &str, token: Option<&str>, body: Value) -> Result<TestResponse> {
    send(router, Method::POST, uri, token, Some(&body.to_string())).await
}

pub async fn get(router: &Router, uri: &str, token: Option<&str>) -> Result<TestResponse> {
    send(router, Method::GET, uri, token, None).await
}

/// Submit one record as `user` and return its id
pub async fn submit(router: &Router, user: &str, feedback_type: &str, conversation_id: &str) -> Result<String> {
    let res = post(
        router,
        "/submit-feedback",
        Some(&token(user, false)),
        json!({ "feedback_type": feedback_type, "conversation_id": conversation_id, "feedback_text": "text" }),
    )
    .await?;
    anyhow::ensure!(res.status == StatusCode::OK, "submit failed: {} {}", res.status, res.body);
    Ok(res.body["feedback_id"].as_str().unwrap_or_default().to_string())
}
