/// Shared types used across the codebase

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identity recorded for callers whose credential could not be resolved
pub const ANONYMOUS_USER: &str = "anonymous";

/// Feedback categories accepted by the submission handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackType {
    Positive,
    Negative,
    Neutral,
}

impl FeedbackType {
    pub const ALL: [FeedbackType; 3] = [FeedbackType::Positive, FeedbackType::Negative, FeedbackType::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackType::Positive => "positive",
            FeedbackType::Negative => "negative",
            FeedbackType::Neutral => "neutral",
        }
    }
}

impl fmt::Display for FeedbackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid feedback_type. Must be positive, negative, or neutral")]
pub struct InvalidFeedbackType(pub String);

impl FromStr for FeedbackType {
    type Err = InvalidFeedbackType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(FeedbackType::Positive),
            "negative" => Ok(FeedbackType::Negative),
            "neutral" => Ok(FeedbackType::Neutral),
            other => Err(InvalidFeedbackType(other.to_string())),
        }
    }
}

/// A persisted feedback entry.
///
/// `id`, `timestamp` and `user_id` are fixed at creation. The review fields
/// only change through [`crate::services::FeedbackService::review`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: String,
    pub conversation_id: String,
    pub feedback_type: FeedbackType,
    pub feedback_text: String,
    pub original_query: String,
    pub llm_response: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub reviewed: bool,
    pub reviewer_comments: String,
    pub reviewer_id: String,
}

/// Optional fields of a feedback submission
#[derive(Debug, Clone, Default)]
pub struct NewFeedback {
    pub conversation_id: Option<String>,
    pub feedback_text: Option<String>,
    pub original_query: Option<String>,
    pub llm_response: Option<String>,
}

impl FeedbackRecord {
    /// Build a fresh, unreviewed record owned by `user_id`.
    pub fn create(feedback_type: FeedbackType, input: NewFeedback, user_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            conversation_id: input
                .conversation_id
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            feedback_type,
            feedback_text: input.feedback_text.unwrap_or_default(),
            original_query: input.original_query.unwrap_or_default(),
            llm_response: input.llm_response.unwrap_or_default(),
            timestamp: Utc::now(),
            user_id: user_id.into(),
            reviewed: false,
            reviewer_comments: String::new(),
            reviewer_id: String::new(),
        }
    }
}

/// Reviewer annotation applied to an existing record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub reviewer_id: String,
    pub reviewer_comments: String,
}

/// Request for one page of a store scan. `cursor` is the opaque token
/// returned by the previous page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: usize,
    pub cursor: Option<String>,
}

impl PageRequest {
    pub fn first(limit: usize) -> Self {
        Self { limit, cursor: None }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Page {
    pub items: Vec<FeedbackRecord>,
    pub next_cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feedback_type_parses_only_known_values() {
        for t in FeedbackType::ALL {
            assert_eq!(t.as_str().parse::<FeedbackType>().unwrap(), t);
        }
        assert!("Positive".parse::<FeedbackType>().is_err());
        assert!("".parse::<FeedbackType>().is_err());
        assert!("meh".parse::<FeedbackType>().is_err());
    }

    #[test]
    fn create_applies_defaults() {
        let record = FeedbackRecord::create(FeedbackType::Neutral, NewFeedback::default(), "alice");
        assert!(Uuid::parse_str(&record.id).is_ok());
        assert!(Uuid::parse_str(&record.conversation_id).is_ok());
        assert_eq!(record.user_id, "alice");
        assert_eq!(record.feedback_text, "");
        assert!(!record.reviewed);
        assert_eq!(record.reviewer_comments, "");
        assert_eq!(record.reviewer_id, "");
    }

    #[test]
    fn create_keeps_supplied_conversation() {
        let input = NewFeedback {
            conversation_id: Some("c1".into()),
            feedback_text: Some("wrong answer".into()),
            ..Default::default()
        };
        let record = FeedbackRecord::create(FeedbackType::Negative, input, "alice");
        assert_eq!(record.conversation_id, "c1");
        assert_eq!(record.feedback_text, "wrong answer");
    }

    #[test]
    fn record_serializes_type_lowercase() {
        let record = FeedbackRecord::create(FeedbackType::Positive, NewFeedback::default(), "bob");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["feedback_type"], "positive");
        assert_eq!(value["reviewed"], false);
    }
}
