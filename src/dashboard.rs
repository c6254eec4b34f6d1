//! Token dashboard view-model.
//!
//! Holds the last token list and statistics snapshot fetched from the backend
//! and turns every action into at most one notice. Failures never escape an
//! action; the previous snapshot stays in place when a fetch fails.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::client::AuthClient;
use crate::models::token::{StatusCounts, TokenRecord, TokenStats, TokenStatus};
use crate::notice::{Notice, NoticeBoard};

pub const MSG_LOAD_TOKENS_FAILED: &str = "Failed to load tokens";
pub const MSG_LOAD_STATS_FAILED: &str = "Failed to load token statistics";
pub const MSG_REVOKED: &str = "Token revoked successfully";
pub const MSG_REVOKE_FAILED: &str = "Failed to revoke token";
pub const MSG_INTROSPECT_EMPTY: &str = "Enter a token to introspect";
pub const MSG_INTROSPECTED: &str = "Token introspected";
pub const MSG_INTROSPECT_FAILED: &str = "Failed to introspect token";
pub const MSG_CLEANED: &str = "Token cache cleaned up";
pub const MSG_CLEANUP_FAILED: &str = "Failed to clean up token cache";

pub struct TokenDashboard {
    client: AuthClient,
    tokens: Vec<TokenRecord>,
    stats: Option<TokenStats>,
    introspection: Option<Value>,
    notices: NoticeBoard,
    pub status_filter: Option<TokenStatus>,
    pub search: String,
}

impl TokenDashboard {
    pub fn new(client: AuthClient, notices: NoticeBoard) -> Self {
        Self {
            client,
            tokens: Vec::new(),
            stats: None,
            introspection: None,
            notices,
            status_filter: None,
            search: String::new(),
        }
    }

    pub fn tokens(&self) -> &[TokenRecord] {
        &self.tokens
    }

    pub fn stats(&self) -> Option<&TokenStats> {
        self.stats.as_ref()
    }

    pub fn introspection(&self) -> Option<&Value> {
        self.introspection.as_ref()
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notices.current()
    }

    /// Fetches the token list, then the statistics.
    pub async fn refresh(&mut self) {
        self.load_tokens().await;
        self.load_stats().await;
    }

    pub async fn load_tokens(&mut self) -> bool {
        match self.client.list_tokens().await {
            Ok(tokens) => {
                tracing::debug!(count = tokens.len(), "loaded tokens");
                self.tokens = tokens;
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load tokens");
                self.notices.error(MSG_LOAD_TOKENS_FAILED);
                false
            }
        }
    }

    pub async fn load_stats(&mut self) -> bool {
        match self.client.token_stats().await {
            Ok(stats) => {
                self.stats = Some(stats);
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load token statistics");
                self.notices.error(MSG_LOAD_STATS_FAILED);
                false
            }
        }
    }

    /// Revokes `token` (a key id or raw token value). On success the list and
    /// the statistics are re-fetched once each; on failure nothing is re-fetched.
    pub async fn revoke(&mut self, token: &str) {
        match self.client.revoke_token(token).await {
            Ok(()) => {
                tracing::info!(token = %token, "token revoked");
                self.notices.success(MSG_REVOKED);
                // Refetch errors replace the success notice, which is what the user should see.
                self.refresh().await;
            }
            Err(e) => {
                tracing::error!(token = %token, error = %e, "token revocation failed");
                self.notices.error(MSG_REVOKE_FAILED);
            }
        }
    }

    pub async fn revoke_record(&mut self, record: &TokenRecord) {
        self.revoke(record.revocation_id()).await;
    }

    /// Maps a token id or key id to the value the revoke endpoint expects,
    /// using the current snapshot. Unknown values pass through unchanged.
    pub fn revocation_id_for(&self, id_or_key: &str) -> String {
        self.tokens
            .iter()
            .find(|t| t.id == id_or_key || t.key_id.as_deref() == Some(id_or_key))
            .map(|t| t.revocation_id().to_string())
            .unwrap_or_else(|| id_or_key.to_string())
    }

    pub async fn introspect(
        &mut self,
        token: &str,
        client_id: Option<&str>,
        client_secret: Option<&str>,
    ) -> Option<&Value> {
        let token = token.trim();
        if token.is_empty() {
            self.notices.error(MSG_INTROSPECT_EMPTY);
            return None;
        }

        match self
            .client
            .introspect_token(token, client_id, client_secret)
            .await
        {
            Ok(result) => {
                self.introspection = Some(result);
                self.notices.success(MSG_INTROSPECTED);
            }
            Err(e) => {
                tracing::error!(error = %e, "token introspection failed");
                self.introspection = None;
                self.notices.error(MSG_INTROSPECT_FAILED);
            }
        }
        self.introspection.as_ref()
    }

    pub async fn cleanup_cache(&mut self) {
        match self.client.cleanup_cache().await {
            Ok(()) => {
                tracing::info!("token cache cleaned up");
                self.notices.success(MSG_CLEANED);
                self.load_stats().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "token cache cleanup failed");
                self.notices.error(MSG_CLEANUP_FAILED);
            }
        }
    }

    /// Snapshot filtered by status and search text as of `now`.
    pub fn visible_tokens_at(&self, now: DateTime<Utc>) -> Vec<&TokenRecord> {
        self.tokens
            .iter()
            .filter(|t| self.status_filter.map_or(true, |s| t.status_at(now) == s))
            .filter(|t| t.matches(&self.search))
            .collect()
    }

    pub fn visible_tokens(&self) -> Vec<&TokenRecord> {
        self.visible_tokens_at(Utc::now())
    }

    pub fn status_counts_at(&self, now: DateTime<Utc>) -> StatusCounts {
        StatusCounts::tally(&self.tokens, now)
    }
}
