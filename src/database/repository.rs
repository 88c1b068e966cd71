use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::feedback::{rows_to_records, FeedbackRow};
use crate::database::store::{FeedbackStore, StoreError};
use crate::types::{FeedbackRecord, FeedbackType, Page, PageRequest, Review};

const COLUMNS: &str = "id, conversation_id, feedback_type, feedback_text, original_query, llm_response, \
                       \"timestamp\", user_id, reviewed, reviewer_comments, reviewer_id";

/// PostgreSQL-backed feedback store. The table name comes from config and is
/// validated before it is ever interpolated into SQL.
pub struct FeedbackRepository {
    table_name: String,
    pool: PgPool,
}

impl FeedbackRepository {
    pub fn new(table_name: &str, pool: PgPool) -> Result<Self, DatabaseError> {
        Ok(Self {
            table_name: DatabaseManager::validated_table_name(table_name)?,
            pool,
        })
    }

    fn table(&self) -> String {
        DatabaseManager::quote_identifier(&self.table_name)
    }

    fn index(&self, column: &str) -> String {
        DatabaseManager::quote_identifier(&format!("{}_{}_idx", self.table_name, column))
    }

    /// Create the table and its secondary indexes if they do not exist yet
    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        let create = format!(
            r#"CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL,
                feedback_type TEXT NOT NULL CHECK (feedback_type IN ('positive', 'negative', 'neutral')),
                feedback_text TEXT NOT NULL DEFAULT '',
                original_query TEXT NOT NULL DEFAULT '',
                llm_response TEXT NOT NULL DEFAULT '',
                "timestamp" TIMESTAMPTZ NOT NULL,
                user_id TEXT NOT NULL,
                reviewed BOOLEAN NOT NULL DEFAULT FALSE,
                reviewer_comments TEXT NOT NULL DEFAULT '',
                reviewer_id TEXT NOT NULL DEFAULT ''
            )"#,
            self.table()
        );
        sqlx::query(&create).execute(&self.pool).await?;

        for column in ["conversation_id", "user_id", "feedback_type"] {
            let sql = format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                self.index(column),
                self.table(),
                column
            );
            sqlx::query(&sql).execute(&self.pool).await?;
        }

        info!("Feedback table {} ready", self.table_name);
        Ok(())
    }
}

#[async_trait]
impl FeedbackStore for FeedbackRepository {
    async fn put(&self, record: &FeedbackRecord) -> Result<(), StoreError> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            self.table(),
            COLUMNS
        );
        sqlx::query(&sql)
            .bind(&record.id)
            .bind(&record.conversation_id)
            .bind(record.feedback_type.as_str())
            .bind(&record.feedback_text)
            .bind(&record.original_query)
            .bind(&record.llm_response)
            .bind(record.timestamp)
            .bind(&record.user_id)
            .bind(record.reviewed)
            .bind(&record.reviewer_comments)
            .bind(&record.reviewer_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<FeedbackRecord>, StoreError> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", COLUMNS, self.table());
        let row: Option<FeedbackRow> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.map(FeedbackRecord::try_from).transpose()
    }

    async fn query_by_conversation(&self, conversation_id: &str) -> Result<Vec<FeedbackRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE conversation_id = $1 ORDER BY \"timestamp\", id",
            COLUMNS,
            self.table()
        );
        let rows: Vec<FeedbackRow> = sqlx::query_as(&sql).bind(conversation_id).fetch_all(&self.pool).await?;
        rows_to_records(rows)
    }

    async fn query_by_user(&self, user_id: &str) -> Result<Vec<FeedbackRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE user_id = $1 ORDER BY \"timestamp\", id",
            COLUMNS,
            self.table()
        );
        let rows: Vec<FeedbackRow> = sqlx::query_as(&sql).bind(user_id).fetch_all(&self.pool).await?;
        rows_to_records(rows)
    }

    async fn scan(&self, feedback_type: Option<FeedbackType>, page: &PageRequest) -> Result<Page, StoreError> {
        // Keyset pagination on the primary key; fetch one extra row to learn
        // whether another page exists.
        let sql = format!(
            "SELECT {} FROM {} \
             WHERE ($1::text IS NULL OR id > $1) AND ($2::text IS NULL OR feedback_type = $2) \
             ORDER BY id LIMIT $3",
            COLUMNS,
            self.table()
        );
        let limit = page.limit.max(1);
        let mut rows: Vec<FeedbackRow> = sqlx::query_as(&sql)
            .bind(page.cursor.as_deref())
            .bind(feedback_type.map(|t| t.as_str()))
            .bind(limit as i64 + 1)
            .fetch_all(&self.pool)
            .await?;

        let has_more = rows.len() > limit;
        rows.truncate(limit);
        let next_cursor = if has_more { rows.last().map(|r| r.id.clone()) } else { None };
        debug!("Scanned {} rows from {} (more: {})", rows.len(), self.table_name, has_more);

        Ok(Page {
            items: rows_to_records(rows)?,
            next_cursor,
        })
    }

    async fn mark_reviewed(&self, id: &str, review: &Review) -> Result<bool, StoreError> {
        let sql = format!(
            "UPDATE {} SET reviewed = TRUE, reviewer_comments = $2, reviewer_id = $3 WHERE id = $1",
            self.table()
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(&review.reviewer_comments)
            .bind(&review.reviewer_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        DatabaseManager::health_check(&self.pool).await.map_err(|e| match e {
            DatabaseError::Sqlx(e) => StoreError::Sqlx(e),
            other => StoreError::Backend(other.to_string()),
        })
    }
}
