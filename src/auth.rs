use async_trait::async_trait;

use crate::core::SyncError;

/// Authentication collaborator. Called before every remote operation; the
/// engine never manages token refresh itself, it only asks for a token that
/// is currently valid.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn ensure_fresh_token(&self) -> Result<String, SyncError>;
}

/// Fixed-token provider for tests and for callers that refresh out of band.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn ensure_fresh_token(&self) -> Result<String, SyncError> {
        if self.token.is_empty() {
            return Err(SyncError::Auth("no token configured".to_string()));
        }
        Ok(self.token.clone())
    }
}
