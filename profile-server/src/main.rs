// profile-server/src/main.rs
mod aggregator;
mod api;
mod error;
mod http;
mod profile;
mod publish;
mod smart_account;
mod spotify;

use std::io;
use std::sync::Arc;
use std::time::Duration;
use actix_web::{web, App, HttpServer};
use common::{setup_tracing, Config};
use api::session::SessionCookies;
use api::WalletSettings;
use profile::ProfileController;
use publish::{SecretsServerClient, TokenPublisher};
use smart_account::SmartAccountSettings;
use spotify::{SpotifyApi, SpotifyClient, SpotifyOAuth, TokenExchange};

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    setup_tracing();

    let config = Config::from_env();
    let server_addr = config.profile_server_addr.clone();

    if config.spotify.client_id.is_empty() {
        tracing::warn!("No Spotify client id configured, authorization will fail");
    }

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.spotify.request_timeout_seconds))
        .build()
        .map_err(|e| startup_error("http client", e))?;

    let oauth: Arc<dyn TokenExchange> = Arc::new(
        SpotifyOAuth::from_config(&config.spotify, http.clone())
            .map_err(|e| startup_error("spotify oauth", e))?,
    );
    let spotify: Arc<dyn SpotifyApi> = Arc::new(SpotifyClient::new(http.clone(), &config.spotify.api_url));
    let controller = web::Data::new(ProfileController::new(oauth, spotify));

    let sessions = controller.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(SESSION_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = sessions.cleanup_expired_sessions();
            if removed > 0 {
                tracing::info!("Cleaned up {} idle profile sessions", removed);
            }
        }
    });

    let publisher: Arc<dyn TokenPublisher> =
        Arc::new(SecretsServerClient::new(http, &config.secrets_server_url));
    let publisher: web::Data<dyn TokenPublisher> = web::Data::from(publisher);

    let smart_account = match SmartAccountSettings::from_config(&config.smart_account) {
        Ok(settings) => Some(settings),
        Err(e) => {
            tracing::warn!("Smart account settings unavailable: {}", e);
            None
        }
    };
    let smart_account = web::Data::new(smart_account);

    let cookies = web::Data::new(SessionCookies::for_redirect_uri(&config.spotify.redirect_uri));
    let wallet = web::Data::new(WalletSettings {
        environment_id: config.wallet.environment_id.clone(),
    });

    tracing::info!("Publishing tokens to {}", config.secrets_server_url);
    tracing::info!("Starting Profile Server on {}", server_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(api::json_config())
            .app_data(controller.clone())
            .app_data(publisher.clone())
            .app_data(smart_account.clone())
            .app_data(cookies.clone())
            .app_data(wallet.clone())
            .configure(api::configure)
    })
    .bind(&server_addr)?
    .run()
    .await
}
