use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::database::{FeedbackStore, StoreError};
use crate::middleware::IdentityContext;
use crate::types::{FeedbackRecord, FeedbackType, InvalidFeedbackType, NewFeedback, PageRequest, Review};

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error(transparent)]
    InvalidFeedbackType(#[from] InvalidFeedbackType),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("User {0} does not have reviewer permissions")]
    NotReviewer(String),

    #[error("Feedback item not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Optional filters on a feedback listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackFilter {
    pub conversation_id: Option<String>,
    pub feedback_type: Option<FeedbackType>,
    pub limit: Option<usize>,
    pub next_token: Option<String>,
}

/// The store query a caller is allowed to run, decided from role and filters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalPlan {
    /// Conversation records, then only those owned by `owner`
    OwnConversation { conversation_id: String, owner: String },
    /// Every record submitted by `owner`
    Own { owner: String },
    /// Every record in the conversation, any owner
    Conversation { conversation_id: String },
    /// Every record of a type, across all pages
    ByType { feedback_type: FeedbackType },
    /// A single page of the unfiltered scan
    Page(PageRequest),
}

#[derive(Debug, Clone)]
pub struct FeedbackListing {
    pub items: Vec<FeedbackRecord>,
    pub is_reviewer: bool,
    pub next_token: Option<String>,
}

/// Feedback submission, visibility, and review rules over a record store
#[derive(Clone)]
pub struct FeedbackService {
    store: Arc<dyn FeedbackStore>,
    page_size: usize,
    max_page_size: usize,
}

impl FeedbackService {
    pub fn new(store: Arc<dyn FeedbackStore>, page_size: usize, max_page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            store,
            page_size,
            max_page_size: max_page_size.max(page_size),
        }
    }

    pub fn store(&self) -> &Arc<dyn FeedbackStore> {
        &self.store
    }

    /// Validate and persist one submission. Nothing reaches the store unless
    /// `feedback_type` is one of the known values.
    pub async fn submit(
        &self,
        identity: &IdentityContext,
        feedback_type: Option<&str>,
        input: NewFeedback,
    ) -> Result<FeedbackRecord, FeedbackError> {
        let feedback_type = match feedback_type {
            Some(raw) => raw.parse::<FeedbackType>().inspect_err(|_| warn!("Invalid feedback type: {}", raw))?,
            None => {
                warn!("Missing required field: feedback_type");
                return Err(FeedbackError::MissingField("feedback_type"));
            }
        };

        let record = FeedbackRecord::create(feedback_type, input, identity.caller_id());
        info!(
            "Storing feedback {} for conversation: {}, type: {}",
            record.id, record.conversation_id, record.feedback_type
        );
        self.store.put(&record).await?;
        info!("Feedback stored successfully");
        Ok(record)
    }

    /// Decide which query the caller may run. Non-reviewers are always pinned
    /// to their own records; the type filter and the open scan are reviewer-only.
    pub fn plan(&self, identity: &IdentityContext, filter: &FeedbackFilter) -> RetrievalPlan {
        let conversation_id = filter.conversation_id.clone().filter(|c| !c.is_empty());

        if !identity.is_reviewer {
            let owner = identity.caller_id().to_string();
            return match conversation_id {
                Some(conversation_id) => RetrievalPlan::OwnConversation { conversation_id, owner },
                None => RetrievalPlan::Own { owner },
            };
        }

        if let Some(conversation_id) = conversation_id {
            return RetrievalPlan::Conversation { conversation_id };
        }
        if let Some(feedback_type) = filter.feedback_type {
            return RetrievalPlan::ByType { feedback_type };
        }

        let limit = filter.limit.unwrap_or(self.page_size).clamp(1, self.max_page_size);
        RetrievalPlan::Page(PageRequest {
            limit,
            cursor: filter.next_token.clone().filter(|t| !t.is_empty()),
        })
    }

    pub async fn list(&self, identity: &IdentityContext, filter: &FeedbackFilter) -> Result<FeedbackListing, FeedbackError> {
        let plan = self.plan(identity, filter);
        let mut next_token = None;

        let items = match plan {
            RetrievalPlan::OwnConversation { conversation_id, owner } => {
                info!("Querying feedback for conversation: {} and user: {}", conversation_id, owner);
                let mut items = self.store.query_by_conversation(&conversation_id).await?;
                items.retain(|r| r.user_id == owner);
                items
            }
            RetrievalPlan::Own { owner } => {
                info!("Querying all feedback for user: {}", owner);
                self.store.query_by_user(&owner).await?
            }
            RetrievalPlan::Conversation { conversation_id } => {
                info!("Reviewer querying feedback for conversation: {}", conversation_id);
                self.store.query_by_conversation(&conversation_id).await?
            }
            RetrievalPlan::ByType { feedback_type } => {
                info!("Scanning feedback for type: {}", feedback_type);
                self.scan_all(feedback_type).await?
            }
            RetrievalPlan::Page(page) => {
                info!("Scanning all feedback (limit {})", page.limit);
                let page = self.store.scan(None, &page).await?;
                next_token = page.next_cursor;
                page.items
            }
        };

        info!("Retrieved {} feedback items", items.len());
        Ok(FeedbackListing {
            items,
            is_reviewer: identity.is_reviewer,
            next_token,
        })
    }

    async fn scan_all(&self, feedback_type: FeedbackType) -> Result<Vec<FeedbackRecord>, StoreError> {
        let mut items = Vec::new();
        let mut request = PageRequest::first(self.page_size);
        loop {
            let page = self.store.scan(Some(feedback_type), &request).await?;
            items.extend(page.items);
            match page.next_cursor {
                Some(cursor) => request.cursor = Some(cursor),
                None => return Ok(items),
            }
        }
    }

    /// Attach reviewer annotations. `feedback_id` and the reviewer role are
    /// both checked before the store is touched; an existing review is
    /// overwritten (last writer wins).
    pub async fn review(
        &self,
        identity: &IdentityContext,
        feedback_id: Option<&str>,
        reviewer_comments: Option<String>,
    ) -> Result<String, FeedbackError> {
        let feedback_id = match feedback_id.filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => {
                warn!("Missing required field: feedback_id");
                return Err(FeedbackError::MissingField("feedback_id"));
            }
        };

        if !identity.is_reviewer {
            warn!("User {} does not have reviewer permissions", identity.caller_id());
            return Err(FeedbackError::NotReviewer(identity.caller_id().to_string()));
        }

        let review = Review {
            reviewer_id: identity.caller_id().to_string(),
            reviewer_comments: reviewer_comments.unwrap_or_default(),
        };

        if !self.store.mark_reviewed(feedback_id, &review).await? {
            warn!("Review target {} does not exist", feedback_id);
            return Err(FeedbackError::NotFound(feedback_id.to_string()));
        }

        info!("Feedback {} reviewed by {}", feedback_id, review.reviewer_id);
        Ok(feedback_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::InMemoryFeedbackStore;

    fn user(id: &str) -> IdentityContext {
        IdentityContext {
            user_id: Some(id.to_string()),
            is_reviewer: false,
        }
    }

    fn reviewer(id: &str) -> IdentityContext {
        IdentityContext {
            user_id: Some(id.to_string()),
            is_reviewer: true,
        }
    }

    fn service() -> (FeedbackService, Arc<InMemoryFeedbackStore>) {
        let store = Arc::new(InMemoryFeedbackStore::new());
        (FeedbackService::new(store.clone(), 2, 10), store)
    }

    fn in_conversation(conversation: &str) -> NewFeedback {
        NewFeedback {
            conversation_id: Some(conversation.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn plan_pins_non_reviewers_to_their_own_records() {
        let (svc, _) = service();
        let bob = user("bob");

        let filter = FeedbackFilter {
            conversation_id: Some("c1".into()),
            feedback_type: Some(FeedbackType::Negative),
            ..Default::default()
        };
        assert_eq!(
            svc.plan(&bob, &filter),
            RetrievalPlan::OwnConversation { conversation_id: "c1".into(), owner: "bob".into() }
        );

        let type_only = FeedbackFilter {
            feedback_type: Some(FeedbackType::Negative),
            ..Default::default()
        };
        assert_eq!(svc.plan(&bob, &type_only), RetrievalPlan::Own { owner: "bob".into() });
        assert_eq!(
            svc.plan(&IdentityContext::anonymous(), &FeedbackFilter::default()),
            RetrievalPlan::Own { owner: "anonymous".into() }
        );
    }

    #[test]
    fn plan_reviewer_precedence() {
        let (svc, _) = service();
        let carol = reviewer("carol");

        let both = FeedbackFilter {
            conversation_id: Some("c1".into()),
            feedback_type: Some(FeedbackType::Positive),
            ..Default::default()
        };
        assert_eq!(svc.plan(&carol, &both), RetrievalPlan::Conversation { conversation_id: "c1".into() });

        let empty_conversation = FeedbackFilter {
            conversation_id: Some(String::new()),
            feedback_type: Some(FeedbackType::Positive),
            ..Default::default()
        };
        assert_eq!(
            svc.plan(&carol, &empty_conversation),
            RetrievalPlan::ByType { feedback_type: FeedbackType::Positive }
        );

        assert_eq!(svc.plan(&carol, &FeedbackFilter::default()), RetrievalPlan::Page(PageRequest::first(2)));

        let oversized = FeedbackFilter {
            limit: Some(500),
            next_token: Some("abc".into()),
            ..Default::default()
        };
        assert_eq!(
            svc.plan(&carol, &oversized),
            RetrievalPlan::Page(PageRequest { limit: 10, cursor: Some("abc".into()) })
        );
    }

    #[test]
    fn default_listing_cap_is_one_hundred() {
        let svc = FeedbackService::new(Arc::new(InMemoryFeedbackStore::new()), 100, 1000);
        assert_eq!(
            svc.plan(&reviewer("carol"), &FeedbackFilter::default()),
            RetrievalPlan::Page(PageRequest::first(100))
        );
    }

    #[tokio::test]
    async fn submit_rejects_invalid_type_without_writing() {
        let (svc, store) = service();
        let err = svc.submit(&user("alice"), Some("great"), NewFeedback::default()).await.unwrap_err();
        assert!(matches!(err, FeedbackError::InvalidFeedbackType(_)));
        let err = svc.submit(&user("alice"), None, NewFeedback::default()).await.unwrap_err();
        assert!(matches!(err, FeedbackError::MissingField("feedback_type")));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn submit_stamps_owner() {
        let (svc, store) = service();
        let record = svc.submit(&IdentityContext::anonymous(), Some("neutral"), NewFeedback::default()).await.unwrap();
        assert_eq!(record.user_id, "anonymous");
        assert_eq!(store.get(&record.id).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn non_reviewer_never_sees_other_users() {
        let (svc, _) = service();
        for (owner, conversation) in [("alice", "c1"), ("bob", "c1"), ("alice", "c2"), ("carol", "c2")] {
            svc.submit(&user(owner), Some("positive"), in_conversation(conversation)).await.unwrap();
        }

        for filter in [
            FeedbackFilter::default(),
            FeedbackFilter { conversation_id: Some("c1".into()), ..Default::default() },
            FeedbackFilter { conversation_id: Some("c2".into()), ..Default::default() },
            FeedbackFilter { feedback_type: Some(FeedbackType::Positive), ..Default::default() },
        ] {
            let listing = svc.list(&user("alice"), &filter).await.unwrap();
            assert!(!listing.items.is_empty());
            assert!(listing.items.iter().all(|r| r.user_id == "alice"), "filter {:?}", filter);
            assert!(!listing.is_reviewer);
        }

        let all_alice = svc.list(&user("alice"), &FeedbackFilter::default()).await.unwrap();
        assert_eq!(all_alice.items.len(), 2);
    }

    #[tokio::test]
    async fn reviewer_type_scan_walks_every_page() {
        let (svc, _) = service();
        for i in 0..7 {
            let t = if i % 2 == 0 { "negative" } else { "positive" };
            svc.submit(&user(&format!("u{}", i)), Some(t), NewFeedback::default()).await.unwrap();
        }

        let filter = FeedbackFilter {
            feedback_type: Some(FeedbackType::Negative),
            ..Default::default()
        };
        let listing = svc.list(&reviewer("carol"), &filter).await.unwrap();
        assert_eq!(listing.items.len(), 4);
        assert!(listing.items.iter().all(|r| r.feedback_type == FeedbackType::Negative));
        assert!(listing.next_token.is_none());
    }

    #[tokio::test]
    async fn reviewer_open_listing_is_paginated() {
        let (svc, _) = service();
        for i in 0..5 {
            svc.submit(&user(&format!("u{}", i)), Some("neutral"), NewFeedback::default()).await.unwrap();
        }

        let carol = reviewer("carol");
        let mut filter = FeedbackFilter::default();
        let mut seen = Vec::new();
        loop {
            let listing = svc.list(&carol, &filter).await.unwrap();
            assert!(listing.items.len() <= 2);
            seen.extend(listing.items.into_iter().map(|r| r.id));
            match listing.next_token {
                Some(token) => filter.next_token = Some(token),
                None => break,
            }
        }
        seen.dedup();
        assert_eq!(seen.len(), 5);
    }

    #[tokio::test]
    async fn review_requires_id_then_role() {
        let (svc, store) = service();
        let record = svc.submit(&user("alice"), Some("negative"), NewFeedback::default()).await.unwrap();

        let err = svc.review(&user("bob"), Some(&record.id), Some("nope".into())).await.unwrap_err();
        assert!(matches!(err, FeedbackError::NotReviewer(ref who) if who == "bob"));
        let err = svc.review(&user("bob"), None, None).await.unwrap_err();
        assert!(matches!(err, FeedbackError::MissingField("feedback_id")));
        let err = svc.review(&user("bob"), Some(""), None).await.unwrap_err();
        assert!(matches!(err, FeedbackError::MissingField("feedback_id")));

        assert_eq!(store.get(&record.id).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn review_validates_id_and_existence() {
        let (svc, _) = service();
        let carol = reviewer("carol");
        assert!(matches!(
            svc.review(&carol, None, None).await.unwrap_err(),
            FeedbackError::MissingField("feedback_id")
        ));
        assert!(matches!(
            svc.review(&carol, Some(""), None).await.unwrap_err(),
            FeedbackError::MissingField("feedback_id")
        ));
        assert!(matches!(
            svc.review(&carol, Some("missing"), None).await.unwrap_err(),
            FeedbackError::NotFound(ref id) if id == "missing"
        ));
    }

    #[tokio::test]
    async fn second_review_overwrites_first() {
        let (svc, store) = service();
        let record = svc.submit(&user("alice"), Some("negative"), NewFeedback::default()).await.unwrap();

        svc.review(&reviewer("carol"), Some(&record.id), Some("looks right".into())).await.unwrap();
        svc.review(&reviewer("dave"), Some(&record.id), None).await.unwrap();

        let stored = store.get(&record.id).await.unwrap().unwrap();
        assert!(stored.reviewed);
        assert_eq!(stored.reviewer_id, "dave");
        assert_eq!(stored.reviewer_comments, "");
        assert_eq!(stored.user_id, "alice");
    }
}
