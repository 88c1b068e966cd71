use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use std::convert::Infallible;
use tracing::{info, warn};

use crate::app::AppState;
use crate::auth::TokenVerifier;
use crate::types::ANONYMOUS_USER;

/// Caller identity derived fresh for every request
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdentityContext {
    pub user_id: Option<String>,
    pub is_reviewer: bool,
}

impl IdentityContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Identity recorded on writes and compared on reads
    pub fn caller_id(&self) -> &str {
        self.user_id.as_deref().unwrap_or(ANONYMOUS_USER)
    }

    /// Resolve the caller from request headers. A missing, malformed, or
    /// rejected credential yields an anonymous non-reviewer; this never fails.
    pub fn from_headers(headers: &HeaderMap, verifier: &dyn TokenVerifier) -> Self {
        let Some(token) = bearer_token(headers) else {
            warn!("No Authorization header found");
            return Self::anonymous();
        };

        match verifier.claims(token) {
            Ok(claims) => {
                let identity = Self {
                    user_id: claims.user_id(),
                    is_reviewer: claims.is_reviewer(),
                };
                info!(
                    "Extracted user_id: {}, is_reviewer: {}",
                    identity.caller_id(),
                    identity.is_reviewer
                );
                identity
            }
            Err(e) => {
                warn!("Error extracting user from token: {}", e);
                Self::anonymous()
            }
        }
    }
}

/// Extract the credential from the Authorization header. The `Bearer `
/// prefix is optional.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    (!token.is_empty()).then_some(token)
}

#[async_trait]
impl FromRequestParts<AppState> for IdentityContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(IdentityContext::from_headers(&parts.headers, state.verifier.as_ref()))
    }
}
