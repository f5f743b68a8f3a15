// profile-server/src/api/mod.rs
pub mod profile;
pub mod session;
pub mod wallet;

use actix_web::{get, web, HttpResponse, Responder};
use common::models::{Artist, ListeningProfile, SpotifyProfile, Track};
use common::{truncate_wallet_address, AppError};
use serde::Serialize;
use serde_json::json;
use crate::error::ApiError;
use crate::profile::{ProfileSession, ProfileState};

/// Wallet-auth environment the browser SDK is initialised with
#[derive(Clone, Debug)]
pub struct WalletSettings {
    pub environment_id: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(api_index)
        .service(profile::connect)
        .service(profile::get_profile)
        .service(profile::refresh_profile)
        .service(profile::publish_token)
        .service(profile::disconnect)
        .service(wallet::sign_in)
        .service(wallet::sign_out)
        .service(wallet::smart_account);
}

/// Malformed JSON bodies are reported like any other invalid input
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        tracing::warn!("Rejected request body: {}", err);
        ApiError::from(AppError::invalid_input("Invalid request body")).into()
    })
}

#[get("/")]
pub async fn api_index() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "name": "Tunecred Profile Server",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// What the profile page renders for the current state
#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum ProfileView {
    Disconnected {
        #[serde(rename = "connectUrl")]
        connect_url: String,
    },
    Authorizing,
    ConnectedLoading,
    ConnectedReady { profile: ProfileDetails },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistCard {
    #[serde(flatten)]
    pub artist: Artist,
    pub thumbnail_url: Option<String>,
}

impl From<&Artist> for ArtistCard {
    fn from(artist: &Artist) -> Self {
        Self {
            thumbnail_url: artist.thumbnail().map(|image| image.url.clone()),
            artist: artist.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackCard {
    #[serde(flatten)]
    pub track: Track,
    pub thumbnail_url: Option<String>,
    pub artist_names: String,
}

impl From<&Track> for TrackCard {
    fn from(track: &Track) -> Self {
        Self {
            thumbnail_url: track.thumbnail().map(|image| image.url.clone()),
            artist_names: track.artist_names(),
            track: track.clone(),
        }
    }
}

/// Ready profile with the display fields the page shows per item
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDetails {
    pub spotify_profile: SpotifyProfile,
    pub top_artists: Vec<ArtistCard>,
    pub top_tracks: Vec<TrackCard>,
    pub hype_artist: ArtistCard,
}

impl From<&ListeningProfile> for ProfileDetails {
    fn from(profile: &ListeningProfile) -> Self {
        Self {
            spotify_profile: profile.spotify_profile.clone(),
            top_artists: profile.top_artists.iter().map(ArtistCard::from).collect(),
            top_tracks: profile.top_tracks.iter().map(TrackCard::from).collect(),
            hype_artist: ArtistCard::from(&profile.hype_artist),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePage {
    #[serde(flatten)]
    pub view: ProfileView,
    pub spotify_connected: bool,
    pub username: String,
    pub wallet_address: Option<String>,
    pub wallet_environment_id: String,
}

impl ProfilePage {
    pub fn render(session: &ProfileSession, connect_url: String, wallet: &WalletSettings) -> Self {
        let view = match session.state() {
            ProfileState::Disconnected => ProfileView::Disconnected { connect_url },
            ProfileState::Authorizing => ProfileView::Authorizing,
            ProfileState::Loading { .. } => ProfileView::ConnectedLoading,
            ProfileState::Ready { profile, .. } => ProfileView::ConnectedReady {
                profile: ProfileDetails::from(profile.as_ref()),
            },
        };

        let identity = session.wallet();
        Self {
            view,
            spotify_connected: session.state().token().is_some(),
            username: identity
                .and_then(|w| w.username.clone())
                .unwrap_or_else(|| "Guest".to_string()),
            wallet_address: identity.map(|w| truncate_wallet_address(&w.address)),
            wallet_environment_id: wallet.environment_id.clone(),
        }
    }
}
