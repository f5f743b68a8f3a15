// common/src/models/spotify.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bearer credential for the music provider API
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens end up in logs through `{:?}` on containing structs
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken({})", crate::utils::token_fingerprint(&self.0))
    }
}

/// Response of the OAuth token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: AccessToken,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
}

impl Image {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self { url: url.into(), height: None, width: None }
    }
}

/// `GET /me`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotifyProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<u32>,
}

impl Artist {
    /// Stand-in used when the short-term window has no artist yet
    pub fn placeholder() -> Self {
        Self {
            id: None,
            name: "None".to_string(),
            images: vec![Image::from_url("-")],
            genres: Vec::new(),
            popularity: None,
        }
    }

    /// The provider orders images largest first; the last one is the thumbnail
    pub fn thumbnail(&self) -> Option<&Image> {
        self.images.last()
    }
}

/// Artist reference embedded in a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    pub album: Album,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

impl Track {
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|artist| artist.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn thumbnail(&self) -> Option<&Image> {
        self.album.images.last()
    }
}

/// Paged `items` envelope returned by the top-items endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct Paging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// Aggregated view model built from the four provider reads
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListeningProfile {
    pub spotify_profile: SpotifyProfile,
    pub top_artists: Vec<Artist>,
    pub top_tracks: Vec<Track>,
    pub hype_artist: Artist,
}

impl ListeningProfile {
    pub const TOP_ARTISTS_LIMIT: usize = 5;
    pub const TOP_TRACKS_LIMIT: usize = 10;

    /// Reduce the four provider responses into a single profile.
    ///
    /// Lists keep the provider order. The hype artist is the first
    /// short-term artist, or [`Artist::placeholder`] when there is none.
    pub fn assemble(
        spotify_profile: SpotifyProfile,
        mut top_artists: Vec<Artist>,
        mut top_tracks: Vec<Track>,
        recent_artists: Vec<Artist>,
    ) -> Self {
        top_artists.truncate(Self::TOP_ARTISTS_LIMIT);
        top_tracks.truncate(Self::TOP_TRACKS_LIMIT);
        let hype_artist = recent_artists
            .into_iter()
            .next()
            .unwrap_or_else(Artist::placeholder);

        Self {
            spotify_profile,
            top_artists,
            top_tracks,
            hype_artist,
        }
    }
}
