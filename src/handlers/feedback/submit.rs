use axum::{body::Bytes, extract::State, Json};
use serde::Deserialize;
use tracing::debug;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::IdentityContext;
use crate::types::NewFeedback;

use super::super::utils::{non_empty, parse_body};
use super::FeedbackAck;

#[derive(Debug, Deserialize)]
pub struct SubmitFeedbackRequest {
    pub feedback_type: Option<String>,
    pub conversation_id: Option<String>,
    pub feedback_text: Option<String>,
    pub original_query: Option<String>,
    pub llm_response: Option<String>,
}

/// POST /submit-feedback - store one feedback record owned by the caller
pub async fn submit_feedback(
    State(state): State<AppState>,
    identity: IdentityContext,
    body: Bytes,
) -> ApiResult<FeedbackAck> {
    let request: SubmitFeedbackRequest = parse_body(&body)?;
    debug!("Submit request: {:?}", request);

    let input = NewFeedback {
        conversation_id: non_empty(request.conversation_id),
        feedback_text: request.feedback_text,
        original_query: request.original_query,
        llm_response: request.llm_response,
    };

    let record = state
        .feedback
        .submit(&identity, request.feedback_type.as_deref(), input)
        .await
        .map_err(|e| ApiError::from_feedback(e, "Error storing feedback"))?;

    Ok(Json(FeedbackAck {
        message: "Feedback stored successfully".to_string(),
        feedback_id: record.id,
    }))
}
