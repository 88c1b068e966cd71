use async_trait::async_trait;
use thiserror::Error;

use crate::types::{FeedbackRecord, FeedbackType, Page, PageRequest, Review};

/// Errors surfaced by a feedback record store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store error: {0}")]
    Backend(String),

    #[error("Corrupt feedback record {id}: {reason}")]
    Corrupt { id: String, reason: String },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Persistence seam for feedback records.
///
/// Implementations provide single-record atomicity only; callers never rely
/// on multi-record transactions.
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Insert a new record
    async fn put(&self, record: &FeedbackRecord) -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<Option<FeedbackRecord>, StoreError>;

    /// All records in a conversation, oldest first
    async fn query_by_conversation(&self, conversation_id: &str) -> Result<Vec<FeedbackRecord>, StoreError>;

    /// All records submitted by `user_id`, oldest first
    async fn query_by_user(&self, user_id: &str) -> Result<Vec<FeedbackRecord>, StoreError>;

    /// One page of a full scan in store order, optionally restricted to a
    /// feedback type. `next_cursor` is `None` on the last page.
    async fn scan(&self, feedback_type: Option<FeedbackType>, page: &PageRequest) -> Result<Page, StoreError>;

    /// Overwrite the review fields of `id` and set `reviewed`. Returns
    /// `false` when no record has that id.
    async fn mark_reviewed(&self, id: &str, review: &Review) -> Result<bool, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
