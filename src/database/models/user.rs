use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account row in the identity directory. The password hash never leaves
/// the database layer.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DirectoryUser {
    pub email: String,
    pub name: String,
    pub email_verified: bool,
    pub is_reviewer: bool,
    pub created_at: DateTime<Utc>,
}

impl DirectoryUser {
    /// Value of the `custom:is_reviewer` attribute carried into issued tokens
    pub fn reviewer_attribute(&self) -> &'static str {
        if self.is_reviewer {
            "true"
        } else {
            "false"
        }
    }
}
