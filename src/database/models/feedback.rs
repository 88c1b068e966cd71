use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::database::StoreError;
use crate::types::FeedbackRecord;

/// Row shape of the feedback table. `feedback_type` is stored as text and
/// checked on the way out.
#[derive(Debug, Clone, FromRow)]
pub struct FeedbackRow {
    pub id: String,
    pub conversation_id: String,
    pub feedback_type: String,
    pub feedback_text: String,
    pub original_query: String,
    pub llm_response: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub reviewed: bool,
    pub reviewer_comments: String,
    pub reviewer_id: String,
}

impl TryFrom<FeedbackRow> for FeedbackRecord {
    type Error = StoreError;

    fn try_from(row: FeedbackRow) -> Result<Self, Self::Error> {
        let feedback_type = row.feedback_type.parse().map_err(|_| StoreError::Corrupt {
            id: row.id.clone(),
            reason: format!("unknown feedback_type '{}'", row.feedback_type),
        })?;

        Ok(FeedbackRecord {
            id: row.id,
            conversation_id: row.conversation_id,
            feedback_type,
            feedback_text: row.feedback_text,
            original_query: row.original_query,
            llm_response: row.llm_response,
            timestamp: row.timestamp,
            user_id: row.user_id,
            reviewed: row.reviewed,
            reviewer_comments: row.reviewer_comments,
            reviewer_id: row.reviewer_id,
        })
    }
}

pub fn rows_to_records(rows: Vec<FeedbackRow>) -> Result<Vec<FeedbackRecord>, StoreError> {
    rows.into_iter().map(FeedbackRecord::try_from).collect()
}
