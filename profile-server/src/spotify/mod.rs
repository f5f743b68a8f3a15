// profile-server/src/spotify/mod.rs
pub mod oauth;

use async_trait::async_trait;
use common::models::{AccessToken, Artist, Paging, SpotifyProfile, Track};
use common::AppResult;
use tokio_util::sync::CancellationToken;
use crate::http::fetch_json;

pub use oauth::{SpotifyOAuth, TokenExchange};

/// Window the provider computes top items over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    /// Roughly the last four weeks
    ShortTerm,
    /// Several years of history
    LongTerm,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::ShortTerm => "short_term",
            TimeRange::LongTerm => "long_term",
        }
    }
}

/// Authorized reads against the music provider.
///
/// Every call is aborted when `cancel` fires and then returns `Cancelled`.
#[async_trait(?Send)]
pub trait SpotifyApi: Send + Sync {
    async fn current_user(
        &self,
        token: &AccessToken,
        cancel: &CancellationToken,
    ) -> AppResult<SpotifyProfile>;

    async fn top_artists(
        &self,
        token: &AccessToken,
        range: TimeRange,
        limit: usize,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<Artist>>;

    async fn top_tracks(
        &self,
        token: &AccessToken,
        range: TimeRange,
        limit: usize,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<Track>>;
}

pub struct SpotifyClient {
    http: reqwest::Client,
    api_url: String,
}

impl SpotifyClient {
    pub fn new(http: reqwest::Client, api_url: &str) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    fn get(&self, path: &str, token: &AccessToken) -> reqwest::RequestBuilder {
        self.http
            .get(format!("{}{}", self.api_url, path))
            .bearer_auth(token.as_str())
    }

    fn top_items(
        &self,
        kind: &str,
        token: &AccessToken,
        range: TimeRange,
        limit: usize,
    ) -> reqwest::RequestBuilder {
        self.get(&format!("/me/top/{}", kind), token).query(&[
            ("time_range", range.as_str().to_string()),
            ("limit", limit.to_string()),
        ])
    }
}

#[async_trait(?Send)]
impl SpotifyApi for SpotifyClient {
    async fn current_user(
        &self,
        token: &AccessToken,
        cancel: &CancellationToken,
    ) -> AppResult<SpotifyProfile> {
        fetch_json(self.get("/me", token), cancel).await
    }

    async fn top_artists(
        &self,
        token: &AccessToken,
        range: TimeRange,
        limit: usize,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<Artist>> {
        let page: Paging<Artist> =
            fetch_json(self.top_items("artists", token, range, limit), cancel).await?;
        Ok(page.items)
    }

    async fn top_tracks(
        &self,
        token: &AccessToken,
        range: TimeRange,
        limit: usize,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<Track>> {
        let page: Paging<Track> =
            fetch_json(self.top_items("tracks", token, range, limit), cancel).await?;
        Ok(page.items)
    }
}
