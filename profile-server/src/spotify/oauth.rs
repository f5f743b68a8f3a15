// profile-server/src/spotify/oauth.rs
use async_trait::async_trait;
use common::models::{AccessToken, TokenResponse};
use common::{token_fingerprint, AppError, AppResult, SpotifyConfig};
use tokio_util::sync::CancellationToken;
use url::Url;
use crate::http::fetch_json;

/// Authorization-code flow against the music provider
#[async_trait(?Send)]
pub trait TokenExchange: Send + Sync {
    /// Where to send the browser to grant access
    fn authorize_url(&self) -> String;

    /// Trade an authorization code for a bearer token
    async fn exchange_code(&self, code: &str, cancel: &CancellationToken) -> AppResult<AccessToken>;
}

pub struct SpotifyOAuth {
    http: reqwest::Client,
    authorize_url: Url,
    token_url: Url,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl SpotifyOAuth {
    pub fn from_config(config: &SpotifyConfig, http: reqwest::Client) -> AppResult<Self> {
        let accounts_url = config.accounts_url.trim_end_matches('/');

        let authorize_url = Url::parse_with_params(
            &format!("{}/authorize", accounts_url),
            &[
                ("client_id", config.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", config.redirect_uri.as_str()),
                ("scope", config.scopes.as_str()),
            ],
        )
        .map_err(|e| AppError::invalid_input(format!("accounts url: {}", e)))?;

        let token_url = Url::parse(&format!("{}/api/token", accounts_url))
            .map_err(|e| AppError::invalid_input(format!("accounts url: {}", e)))?;

        Ok(Self {
            http,
            authorize_url,
            token_url,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
        })
    }
}

#[async_trait(?Send)]
impl TokenExchange for SpotifyOAuth {
    fn authorize_url(&self) -> String {
        self.authorize_url.to_string()
    }

    async fn exchange_code(&self, code: &str, cancel: &CancellationToken) -> AppResult<AccessToken> {
        if code.is_empty() {
            return Err(AppError::invalid_input("Authorization code required"));
        }

        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        tracing::info!("Exchanging Spotify authorization code for a token");

        // `form` sets application/x-www-form-urlencoded
        let request = self.http.post(self.token_url.clone()).form(&params);
        let response: TokenResponse = fetch_json(request, cancel).await?;

        tracing::info!(
            "Obtained Spotify token {}",
            token_fingerprint(response.access_token.as_str())
        );
        Ok(response.access_token)
    }
}
