// secrets-server/src/token_cache.rs
use actix::{Actor, Addr, AsyncContext, Context, Handler, Message, MessageResult};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use common::models::CachedTokenRecord;
use common::{token_fingerprint, AppError, AppResult};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use crate::utils::token::generate_verification_id;

// Default token TTL in seconds (5 minutes)
const DEFAULT_TOKEN_TTL: i64 = 300;

/// Actor message: Store a bearer token, returns its verification id
#[derive(Message)]
#[rtype(result = "String")]
pub struct StoreToken {
    pub token: String,
}

/// Actor message: Snapshot every live token as `verification_id -> token`
#[derive(Message)]
#[rtype(result = "BTreeMap<String, String>")]
pub struct SnapshotTokens;

/// Actor message: Drop expired records
#[derive(Message)]
#[rtype(result = "usize")]
pub struct CleanupExpiredTokens;

/// Holds bearer tokens under random verification ids until they expire
pub struct TokenCacheActor {
    records: Arc<DashMap<String, CachedTokenRecord>>,
    ttl: ChronoDuration,
    // Cleanup interval in seconds
    cleanup_interval: u64,
    stored_count: usize,
    expired_count: usize,
}

impl Default for TokenCacheActor {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCacheActor {
    pub fn new() -> Self {
        Self {
            records: Arc::new(DashMap::new()),
            ttl: ChronoDuration::seconds(DEFAULT_TOKEN_TTL),
            cleanup_interval: 60,
            stored_count: 0,
            expired_count: 0,
        }
    }

    pub fn with_ttl(mut self, ttl: ChronoDuration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_cleanup_interval(mut self, interval_seconds: u64) -> Self {
        self.cleanup_interval = interval_seconds;
        self
    }

    fn store(&mut self, token: String) -> String {
        let verification_id = generate_verification_id();
        let record = CachedTokenRecord::new(verification_id.clone(), token, self.ttl);

        tracing::info!(
            "Stored token {} as {} until {}",
            token_fingerprint(&record.token),
            verification_id,
            record.expires_at
        );

        self.records.insert(verification_id.clone(), record);
        self.stored_count += 1;

        verification_id
    }

    // Expiry is checked on read as well, cleanup only reclaims memory
    fn snapshot(&self) -> BTreeMap<String, String> {
        let now = Utc::now();
        self.records
            .iter()
            .filter(|entry| !entry.value().is_expired_at(now))
            .map(|entry| (entry.key().clone(), entry.value().token.clone()))
            .collect()
    }

    fn cleanup_tokens(&mut self) -> usize {
        let now = Utc::now();
        let before = self.records.len();
        self.records.retain(|_, record| !record.is_expired_at(now));
        let expired = before.saturating_sub(self.records.len());

        self.expired_count += expired;
        expired
    }
}

impl Actor for TokenCacheActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!("TokenCacheActor started with TTL: {}s", self.ttl.num_seconds());

        ctx.run_interval(Duration::from_secs(self.cleanup_interval), |act, _ctx| {
            let expired_count = act.cleanup_tokens();
            if expired_count > 0 {
                tracing::info!("Cleaned up {} expired tokens", expired_count);
            }
        });
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(
            "TokenCacheActor stopped. {} tokens stored, {} expired during lifetime",
            self.stored_count,
            self.expired_count
        );
    }
}

impl Handler<StoreToken> for TokenCacheActor {
    type Result = MessageResult<StoreToken>;

    fn handle(&mut self, msg: StoreToken, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.store(msg.token))
    }
}

impl Handler<SnapshotTokens> for TokenCacheActor {
    type Result = MessageResult<SnapshotTokens>;

    fn handle(&mut self, _msg: SnapshotTokens, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.snapshot())
    }
}

impl Handler<CleanupExpiredTokens> for TokenCacheActor {
    type Result = MessageResult<CleanupExpiredTokens>;

    fn handle(&mut self, _msg: CleanupExpiredTokens, _ctx: &mut Self::Context) -> Self::Result {
        let expired_count = self.cleanup_tokens();
        tracing::debug!("Cleaned up {} expired tokens", expired_count);
        MessageResult(expired_count)
    }
}

/// Storage seam used by the HTTP handlers
#[async_trait(?Send)]
pub trait TokenStore: Send + Sync {
    /// Store a non-empty token and return its fresh verification id
    async fn store(&self, token: String) -> AppResult<String>;

    /// Every record that has not expired yet
    async fn live_tokens(&self) -> AppResult<BTreeMap<String, String>>;
}

#[async_trait(?Send)]
impl TokenStore for Addr<TokenCacheActor> {
    async fn store(&self, token: String) -> AppResult<String> {
        self.send(StoreToken { token })
            .await
            .map_err(|e| AppError::unavailable(format!("token cache: {}", e)))
    }

    async fn live_tokens(&self) -> AppResult<BTreeMap<String, String>> {
        self.send(SnapshotTokens)
            .await
            .map_err(|e| AppError::unavailable(format!("token cache: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[actix_web::test]
    async fn stored_tokens_appear_in_snapshot() {
        let cache = TokenCacheActor::new().start();

        let first = cache.store("abc123".to_string()).await.unwrap();
        let second = cache.store("def456".to_string()).await.unwrap();

        let live = cache.live_tokens().await.unwrap();
        assert_eq!(live.len(), 2);
        assert_eq!(live.get(&first).map(String::as_str), Some("abc123"));
        assert_eq!(live.get(&second).map(String::as_str), Some("def456"));
    }

    #[actix_web::test]
    async fn identifiers_are_never_reused() {
        let cache = TokenCacheActor::new().start();

        let mut seen = HashSet::new();
        for _ in 0..200 {
            let id = cache.store("same-token".to_string()).await.unwrap();
            assert_eq!(id.len(), 32);
            assert!(seen.insert(id));
        }
    }

    #[actix_web::test]
    async fn expired_tokens_are_not_exported() {
        let cache = TokenCacheActor::new()
            .with_ttl(ChronoDuration::milliseconds(50))
            .start();

        cache.store("short-lived".to_string()).await.unwrap();
        assert_eq!(cache.live_tokens().await.unwrap().len(), 1);

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(cache.live_tokens().await.unwrap().is_empty());
        assert_eq!(cache.send(CleanupExpiredTokens).await.unwrap(), 1);
        assert_eq!(cache.send(CleanupExpiredTokens).await.unwrap(), 0);
    }

    #[actix_web::test]
    async fn cleanup_keeps_live_tokens() {
        let cache = TokenCacheActor::new().start();
        let id = cache.store("long-lived".to_string()).await.unwrap();

        assert_eq!(cache.send(CleanupExpiredTokens).await.unwrap(), 0);
        assert!(cache.live_tokens().await.unwrap().contains_key(&id));
    }
}
