use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub feedback: FeedbackConfig,
    pub model: ModelConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    pub store: StoreBackend,
    pub table_name: String,
    /// Records returned by one unfiltered reviewer listing
    pub page_size: usize,
    /// Upper bound a caller may request through `?limit=`
    pub max_page_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model_id: String,
    pub endpoint: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthMode {
    /// Claims are decoded as-is; an upstream gateway already checked the signature
    Gateway,
    Hs256,
    Rs256,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub mode: AuthMode,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub public_key_path: Option<PathBuf>,
}

pub const DEFAULT_MODEL_ID: &str = "anthropic.claude-3-sonnet-20240229-v1:0";
pub const DEFAULT_TABLE_NAME: &str = "feedback";

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(port) = env::var("FEEDBACK_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Feedback store overrides
        match env::var("FEEDBACK_STORE").as_deref() {
            Ok("memory") => self.feedback.store = StoreBackend::Memory,
            Ok("postgres") => self.feedback.store = StoreBackend::Postgres,
            _ => {}
        }
        if let Ok(v) = env::var("FEEDBACK_TABLE_NAME") {
            if !v.trim().is_empty() {
                self.feedback.table_name = v.trim().to_string();
            }
        }
        if let Ok(v) = env::var("FEEDBACK_PAGE_SIZE") {
            self.feedback.page_size = v.parse().unwrap_or(self.feedback.page_size);
        }
        if let Ok(v) = env::var("FEEDBACK_MAX_PAGE_SIZE") {
            self.feedback.max_page_size = v.parse().unwrap_or(self.feedback.max_page_size);
        }

        // Model overrides
        if let Ok(v) = env::var("MODEL_ID") {
            self.model.model_id = v;
        }
        if let Ok(v) = env::var("MODEL_ENDPOINT") {
            self.model.endpoint = v;
        }
        if let Ok(v) = env::var("MODEL_API_KEY").or_else(|_| env::var("ANTHROPIC_API_KEY")) {
            self.model.api_key = v;
        }
        if let Ok(v) = env::var("MODEL_MAX_TOKENS") {
            self.model.max_tokens = v.parse().unwrap_or(self.model.max_tokens);
        }

        // Auth overrides
        match env::var("AUTH_MODE").as_deref() {
            Ok("gateway") => self.auth.mode = AuthMode::Gateway,
            Ok("hs256") => self.auth.mode = AuthMode::Hs256,
            Ok("rs256") => self.auth.mode = AuthMode::Rs256,
            _ => {}
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.auth.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_PUBLIC_KEY_PATH") {
            self.auth.public_key_path = Some(PathBuf::from(v));
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                connection_timeout: 30,
            },
            feedback: FeedbackConfig {
                store: StoreBackend::Memory,
                table_name: DEFAULT_TABLE_NAME.to_string(),
                page_size: 100,
                max_page_size: 1000,
            },
            model: ModelConfig::defaults(),
            auth: AuthConfig::gateway(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 8080 },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 10,
            },
            feedback: FeedbackConfig {
                store: StoreBackend::Postgres,
                table_name: DEFAULT_TABLE_NAME.to_string(),
                page_size: 100,
                max_page_size: 500,
            },
            model: ModelConfig::defaults(),
            auth: AuthConfig::gateway(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 8080 },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 5,
            },
            feedback: FeedbackConfig {
                store: StoreBackend::Postgres,
                table_name: DEFAULT_TABLE_NAME.to_string(),
                page_size: 100,
                max_page_size: 100,
            },
            model: ModelConfig::defaults(),
            auth: AuthConfig::gateway(),
        }
    }

    /// Config for in-process use (tests, local tooling): in-memory store,
    /// gateway-trusted tokens, no environment lookups.
    pub fn local() -> Self {
        Self::development()
    }
}

impl ModelConfig {
    fn defaults() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            endpoint: "https://api.anthropic.com".to_string(),
            api_key: String::new(),
            max_tokens: 1024,
        }
    }
}

impl AuthConfig {
    fn gateway() -> Self {
        Self {
            mode: AuthMode::Gateway,
            jwt_secret: String::new(),
            public_key_path: None,
        }
    }
}
