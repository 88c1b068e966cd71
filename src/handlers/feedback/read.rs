use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::IdentityContext;
use crate::services::FeedbackFilter;
use crate::types::{FeedbackRecord, FeedbackType};

use super::super::utils::non_empty;

#[derive(Debug, Default, Deserialize)]
pub struct ReadFeedbackQuery {
    pub conversation_id: Option<String>,
    pub feedback_type: Option<String>,
    pub limit: Option<String>,
    pub next_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedbackData {
    pub feedback_count: usize,
    pub feedback_items: Vec<FeedbackRecord>,
    pub is_reviewer: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl ReadFeedbackQuery {
    /// Non-reviewers cannot filter by type, so their `feedback_type` is
    /// dropped unparsed.
    fn into_filter(self, identity: &IdentityContext) -> Result<FeedbackFilter, ApiError> {
        let feedback_type = match non_empty(self.feedback_type).filter(|_| identity.is_reviewer) {
            Some(raw) => Some(raw.parse::<FeedbackType>().map_err(|e| {
                warn!("Invalid feedback_type filter: {}", raw);
                ApiError::bad_request(e.to_string())
            })?),
            None => None,
        };

        let limit = match non_empty(self.limit) {
            Some(raw) => Some(raw.parse::<usize>().map_err(|_| {
                warn!("Invalid limit: {}", raw);
                ApiError::bad_request(format!("Invalid limit: {}", raw))
            })?),
            None => None,
        };

        Ok(FeedbackFilter {
            conversation_id: non_empty(self.conversation_id),
            feedback_type,
            limit,
            next_token: non_empty(self.next_token),
        })
    }
}

/// GET /feedback-data - list the feedback the caller is allowed to see
///
/// Query: `conversation_id`, `feedback_type` (reviewers only), and for the
/// unfiltered reviewer listing `limit` / `next_token` to walk past one page.
pub async fn read_feedback(
    State(state): State<AppState>,
    identity: IdentityContext,
    Query(query): Query<ReadFeedbackQuery>,
) -> ApiResult<FeedbackData> {
    info!(
        "Query parameters - conversation_id: {:?}, feedback_type: {:?}",
        query.conversation_id, query.feedback_type
    );
    let filter = query.into_filter(&identity)?;

    let listing = state
        .feedback
        .list(&identity, &filter)
        .await
        .map_err(|e| ApiError::from_feedback(e, "Error reading feedback"))?;

    Ok(Json(FeedbackData {
        feedback_count: listing.items.len(),
        feedback_items: listing.items,
        is_reviewer: listing.is_reviewer,
        next_token: listing.next_token,
    }))
}
