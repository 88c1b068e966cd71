use async_trait::async_trait;
use std::collections::BTreeMap;
use std::ops::Bound;
use tokio::sync::RwLock;

use crate::database::store::{FeedbackStore, StoreError};
use crate::types::{FeedbackRecord, FeedbackType, Page, PageRequest, Review};

/// Process-local feedback store keyed by record id. Used for local
/// development (`FEEDBACK_STORE=memory`) and as the fake behind handler tests.
#[derive(Default)]
pub struct InMemoryFeedbackStore {
    records: RwLock<BTreeMap<String, FeedbackRecord>>,
}

impl InMemoryFeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    async fn select(&self, keep: impl Fn(&FeedbackRecord) -> bool) -> Vec<FeedbackRecord> {
        let records = self.records.read().await;
        let mut items: Vec<FeedbackRecord> = records.values().filter(|r| keep(*r)).cloned().collect();
        items.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        items
    }
}

#[async_trait]
impl FeedbackStore for InMemoryFeedbackStore {
    async fn put(&self, record: &FeedbackRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(StoreError::Backend(format!("duplicate feedback id {}", record.id)));
        }
        records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<FeedbackRecord>, StoreError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn query_by_conversation(&self, conversation_id: &str) -> Result<Vec<FeedbackRecord>, StoreError> {
        Ok(self.select(|r| r.conversation_id == conversation_id).await)
    }

    async fn query_by_user(&self, user_id: &str) -> Result<Vec<FeedbackRecord>, StoreError> {
        Ok(self.select(|r| r.user_id == user_id).await)
    }

    async fn scan(&self, feedback_type: Option<FeedbackType>, page: &PageRequest) -> Result<Page, StoreError> {
        let records = self.records.read().await;
        let start = match page.cursor.as_deref() {
            Some(cursor) => Bound::Excluded(cursor.to_string()),
            None => Bound::Unbounded,
        };
        let limit = page.limit.max(1);

        let mut matching = records
            .range((start, Bound::Unbounded))
            .map(|(_, r)| r)
            .filter(|r| feedback_type.map_or(true, |t| r.feedback_type == t));

        let items: Vec<FeedbackRecord> = matching.by_ref().take(limit).cloned().collect();
        let next_cursor = match matching.next() {
            Some(_) => items.last().map(|r| r.id.clone()),
            None => None,
        };

        Ok(Page { items, next_cursor })
    }

    async fn mark_reviewed(&self, id: &str, review: &Review) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        match records.get_mut(id) {
            Some(record) => {
                record.reviewed = true;
                record.reviewer_comments = review.reviewer_comments.clone();
                record.reviewer_id = review.reviewer_id.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
