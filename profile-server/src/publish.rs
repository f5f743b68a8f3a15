// profile-server/src/publish.rs
use async_trait::async_trait;
use common::models::{AccessToken, StoreTokenRequest, StoreTokenResponse};
use common::AppResult;
use tokio_util::sync::CancellationToken;
use crate::http::fetch_json;

/// Hands a linked token to the token cache for later export
#[async_trait(?Send)]
pub trait TokenPublisher: Send + Sync {
    /// Returns the verification identifier assigned by the cache
    async fn publish(&self, token: &AccessToken, cancel: &CancellationToken) -> AppResult<String>;
}

pub struct SecretsServerClient {
    http: reqwest::Client,
    store_url: String,
}

impl SecretsServerClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            store_url: format!("{}/store-token", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait(?Send)]
impl TokenPublisher for SecretsServerClient {
    async fn publish(&self, token: &AccessToken, cancel: &CancellationToken) -> AppResult<String> {
        let body = StoreTokenRequest {
            access_token: Some(token.as_str().to_string()),
        };
        let response: StoreTokenResponse =
            fetch_json(self.http.post(&self.store_url).json(&body), cancel).await?;

        tracing::info!("Published token as {}", response.verification_id);
        Ok(response.verification_id)
    }
}
