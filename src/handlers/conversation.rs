use axum::{body::Bytes, extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::IdentityContext;

use super::utils::{non_empty, parse_body};

#[derive(Debug, Deserialize)]
pub struct ConversationRequest {
    pub message: Option<String>,
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub conversation_id: String,
    pub response: String,
    pub user_id: String,
}

/// POST /conversation - relay one user message to the hosted model
///
/// Body: `{"message": "...", "conversation_id": "optional"}`. A missing
/// conversation id is generated so the reply can be tied to later feedback.
pub async fn conversation(
    State(state): State<AppState>,
    identity: IdentityContext,
    body: Bytes,
) -> ApiResult<ConversationResponse> {
    let request: ConversationRequest = parse_body(&body)?;

    let Some(message) = non_empty(request.message) else {
        warn!("No message provided in request");
        return Err(ApiError::bad_request("No message provided"));
    };

    let conversation_id = non_empty(request.conversation_id).unwrap_or_else(|| Uuid::new_v4().to_string());
    let model_id = &state.config.model.model_id;
    info!("Conversation {} using model: {}", conversation_id, model_id);

    let reply = state.model.converse(model_id, &message).await.map_err(|e| {
        error!("Error processing conversation: {}", e);
        ApiError::internal_server_error(format!("Error processing conversation: {}", e))
    })?;
    info!("Generated response of length: {}", reply.len());

    Ok(Json(ConversationResponse {
        conversation_id,
        response: reply,
        user_id: identity.caller_id().to_string(),
    }))
}
