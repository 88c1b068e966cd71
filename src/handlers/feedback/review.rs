use axum::{body::Bytes, extract::State, Json};
use serde::Deserialize;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::IdentityContext;

use super::super::utils::parse_body;
use super::FeedbackAck;

#[derive(Debug, Deserialize)]
pub struct ReviewFeedbackRequest {
    pub feedback_id: Option<String>,
    pub reviewer_comments: Option<String>,
}

/// POST /review-feedback - reviewer-only annotation of an existing record
///
/// 400 without `feedback_id`, then 403 for non-reviewers, 404 when the id
/// matches nothing. A repeat review overwrites the last one.
pub async fn review_feedback(
    State(state): State<AppState>,
    identity: IdentityContext,
    body: Bytes,
) -> ApiResult<FeedbackAck> {
    let request: ReviewFeedbackRequest = parse_body(&body)?;

    let feedback_id = state
        .feedback
        .review(&identity, request.feedback_id.as_deref(), request.reviewer_comments)
        .await
        .map_err(|e| ApiError::from_feedback(e, "Error reviewing feedback"))?;

    Ok(Json(FeedbackAck {
        message: "Feedback reviewed successfully".to_string(),
        feedback_id,
    }))
}
