use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::{verifier_from_config, TokenVerifier};
use crate::config::{AppConfig, StoreBackend};
use crate::database::{DatabaseManager, FeedbackRepository, FeedbackStore, InMemoryFeedbackStore};
use crate::handlers;
use crate::middleware::cors::{with_cors, GET_METHODS, POST_METHODS};
use crate::services::{AnthropicClient, FeedbackService, ModelClient};

/// Dependencies shared by every handler. Built once at startup and passed in,
/// so tests can swap any of them for a fake.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub feedback: FeedbackService,
    pub model: Arc<dyn ModelClient>,
    pub verifier: Arc<dyn TokenVerifier>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn FeedbackStore>,
        model: Arc<dyn ModelClient>,
        verifier: Arc<dyn TokenVerifier>,
    ) -> Self {
        let feedback = FeedbackService::new(store, config.feedback.page_size, config.feedback.max_page_size);
        Self {
            config: Arc::new(config),
            feedback,
            model,
            verifier,
        }
    }

    /// Wire the production dependencies described by `config`
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn FeedbackStore> = match config.feedback.store {
            StoreBackend::Memory => {
                info!("Using in-memory feedback store");
                Arc::new(InMemoryFeedbackStore::new())
            }
            StoreBackend::Postgres => {
                let pool = DatabaseManager::connect(&config.database)
                    .await
                    .context("failed to connect to feedback database")?;
                let repository = FeedbackRepository::new(&config.feedback.table_name, pool)?;
                repository.ensure_schema().await.context("failed to prepare feedback table")?;
                info!("Using feedback table: {}", config.feedback.table_name);
                Arc::new(repository)
            }
        };

        let model = AnthropicClient::new(&config.model).context("invalid model configuration")?;
        let verifier = verifier_from_config(&config.auth).context("invalid auth configuration")?;
        info!("Using model: {} (auth mode {:?})", config.model.model_id, config.auth.mode);

        Ok(Self::new(config, store, Arc::new(model), verifier))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/conversation", with_cors(post(handlers::conversation), POST_METHODS))
        .route("/submit-feedback", with_cors(post(handlers::submit_feedback), POST_METHODS))
        .route("/feedback-data", with_cors(get(handlers::read_feedback), GET_METHODS))
        .route("/review-feedback", with_cors(post(handlers::review_feedback), POST_METHODS))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
