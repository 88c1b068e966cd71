use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::database::models::DirectoryUser;
use crate::database::DatabaseManager;

pub const DEFAULT_PASSWORD: &str = "Password123!";

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("User already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Password must be at least 8 characters with an uppercase letter, a lowercase letter, and a number")]
    WeakPassword,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// An account to provision, as read from the CLI or a users file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub is_reviewer: bool,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), DirectoryError> {
        let email = self.email.trim();
        let valid_email = email
            .split_once('@')
            .map_or(false, |(local, domain)| !local.is_empty() && domain.contains('.'));
        if !valid_email {
            return Err(DirectoryError::InvalidEmail(self.email.clone()));
        }

        let p = &self.password;
        if p.chars().count() < 8
            || !p.chars().any(|c| c.is_ascii_uppercase())
            || !p.chars().any(|c| c.is_ascii_lowercase())
            || !p.chars().any(|c| c.is_ascii_digit())
        {
            return Err(DirectoryError::WeakPassword);
        }
        Ok(())
    }
}

/// The default accounts: three regular users and two reviewers
pub fn seed_users(password: &str) -> Vec<NewUser> {
    let regular = (1..=3).map(|i| NewUser {
        email: format!("user{}@example.com", i),
        name: format!("Regular User {}", i),
        password: password.to_string(),
        is_reviewer: false,
    });
    let reviewers = (1..=2).map(|i| NewUser {
        email: format!("reviewer{}@example.com", i),
        name: format!("Reviewer {}", i),
        password: password.to_string(),
        is_reviewer: true,
    });
    regular.chain(reviewers).collect()
}

/// Salted SHA-256, stored as `salt$hexdigest`
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b"$");
    hasher.update(password.as_bytes());
    format!("{}${:x}", salt, hasher.finalize())
}

/// Identity store that issues accounts carrying the reviewer attribute
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn create_user(&self, user: &NewUser) -> Result<DirectoryUser, DirectoryError>;

    async fn list_users(&self) -> Result<Vec<DirectoryUser>, DirectoryError>;
}

pub struct PgUserDirectory {
    pool: PgPool,
}

const USERS_TABLE: &str = "feedback_users";

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> Result<(), DirectoryError> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                email TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                email_verified BOOLEAN NOT NULL DEFAULT TRUE,
                is_reviewer BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
            DatabaseManager::quote_identifier(USERS_TABLE)
        );
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn create_user(&self, user: &NewUser) -> Result<DirectoryUser, DirectoryError> {
        user.validate()?;

        let email = user.email.trim().to_lowercase();
        let password_hash = hash_password(&user.password, &Uuid::new_v4().simple().to_string());
        let sql = format!(
            "INSERT INTO {} (email, name, password_hash, email_verified, is_reviewer) \
             VALUES ($1, $2, $3, TRUE, $4) \
             ON CONFLICT (email) DO NOTHING \
             RETURNING email, name, email_verified, is_reviewer, created_at",
            DatabaseManager::quote_identifier(USERS_TABLE)
        );

        let created: Option<DirectoryUser> = sqlx::query_as(&sql)
            .bind(&email)
            .bind(&user.name)
            .bind(&password_hash)
            .bind(user.is_reviewer)
            .fetch_optional(&self.pool)
            .await?;

        match created {
            Some(created) => {
                info!("Created user: {} (Reviewer: {})", created.email, created.is_reviewer);
                Ok(created)
            }
            None => Err(DirectoryError::AlreadyExists(email)),
        }
    }

    async fn list_users(&self) -> Result<Vec<DirectoryUser>, DirectoryError> {
        let sql = format!(
            "SELECT email, name, email_verified, is_reviewer, created_at FROM {} ORDER BY email",
            DatabaseManager::quote_identifier(USERS_TABLE)
        );
        Ok(sqlx::query_as(&sql).fetch_all(&self.pool).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str, password: &str) -> NewUser {
        NewUser {
            email: email.into(),
            name: "Test".into(),
            password: password.into(),
            is_reviewer: false,
        }
    }

    #[test]
    fn seeds_three_users_and_two_reviewers() {
        let users = seed_users(DEFAULT_PASSWORD);
        assert_eq!(users.len(), 5);
        assert_eq!(users.iter().filter(|u| u.is_reviewer).count(), 2);
        assert_eq!(users[0].email, "user1@example.com");
        assert_eq!(users[4].email, "reviewer2@example.com");
        assert!(users.iter().all(|u| u.validate().is_ok()));
    }

    #[test]
    fn password_policy() {
        assert!(user("a@b.io", "Password123!").validate().is_ok());
        assert!(matches!(user("a@b.io", "Pass1").validate(), Err(DirectoryError::WeakPassword)));
        assert!(matches!(user("a@b.io", "password123").validate(), Err(DirectoryError::WeakPassword)));
        assert!(matches!(user("a@b.io", "PASSWORD123").validate(), Err(DirectoryError::WeakPassword)));
        assert!(matches!(user("a@b.io", "Passwordxyz").validate(), Err(DirectoryError::WeakPassword)));
    }

    #[test]
    fn email_shape() {
        assert!(matches!(user("nobody", "Password123!").validate(), Err(DirectoryError::InvalidEmail(_))));
        assert!(matches!(user("@example.com", "Password123!").validate(), Err(DirectoryError::InvalidEmail(_))));
        assert!(matches!(user("x@localhost", "Password123!").validate(), Err(DirectoryError::InvalidEmail(_))));
    }

    #[test]
    fn users_file_defaults_reviewer_flag() {
        let users: Vec<NewUser> =
            serde_json::from_str(r#"[{"email":"a@b.io","name":"A","password":"Password123!"}]"#).unwrap();
        assert!(!users[0].is_reviewer);
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("Password123!", "s1");
        let b = hash_password("Password123!", "s2");
        assert_ne!(a, b);
        assert!(a.starts_with("s1$"));
        assert_eq!(a, hash_password("Password123!", "s1"));
        assert_eq!(a.len(), "s1$".len() + 64);
    }
}
