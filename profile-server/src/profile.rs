// profile-server/src/profile.rs
use common::models::{AccessToken, ListeningProfile};
use common::{token_fingerprint, AppError};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use crate::aggregator::fetch_listening_profile;
use crate::spotify::{SpotifyApi, TokenExchange};

/// Where a session is in the connect and load flow
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileState {
    Disconnected,
    /// Authorization code received, exchange in flight
    Authorizing,
    /// Token held, aggregation in flight or failed
    Loading { token: AccessToken },
    Ready {
        token: AccessToken,
        profile: Arc<ListeningProfile>,
    },
}

impl ProfileState {
    pub fn token(&self) -> Option<&AccessToken> {
        match self {
            ProfileState::Loading { token } | ProfileState::Ready { token, .. } => Some(token),
            _ => None,
        }
    }
}

/// Handle for one unit of network work. Its result may only be applied
/// while `generation` is still the session's current one.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub generation: u64,
    pub cancel: CancellationToken,
}

/// Signed-in wallet shown next to the profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletIdentity {
    pub address: String,
    pub username: Option<String>,
}

#[derive(Debug)]
pub struct ProfileSession {
    state: ProfileState,
    generation: u64,
    cancel: CancellationToken,
    wallet: Option<WalletIdentity>,
}

impl Default for ProfileSession {
    fn default() -> Self {
        Self {
            state: ProfileState::Disconnected,
            generation: 0,
            cancel: CancellationToken::new(),
            wallet: None,
        }
    }
}

impl ProfileSession {
    pub fn state(&self) -> &ProfileState {
        &self.state
    }

    pub fn wallet(&self) -> Option<&WalletIdentity> {
        self.wallet.as_ref()
    }

    /// Fires on the next transition; used by one-off calls like publishing
    pub fn current_cancel(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.generation == self.generation && !ticket.cancel.is_cancelled()
    }

    /// Abort whatever is in flight and hand out a fresh ticket
    fn issue_ticket(&mut self) -> Ticket {
        self.cancel.cancel();
        self.generation += 1;
        self.cancel = CancellationToken::new();
        Ticket {
            generation: self.generation,
            cancel: self.cancel.clone(),
        }
    }

    /// Disconnected -> Authorizing. Any other state ignores the code.
    pub fn begin_authorization(&mut self) -> Option<Ticket> {
        if self.state != ProfileState::Disconnected {
            return None;
        }
        self.state = ProfileState::Authorizing;
        Some(self.issue_ticket())
    }

    /// Authorizing -> Loading, returning the ticket for the aggregation
    pub fn token_received(&mut self, ticket: &Ticket, token: AccessToken) -> Option<Ticket> {
        if !self.is_current(ticket) || self.state != ProfileState::Authorizing {
            return None;
        }
        self.state = ProfileState::Loading { token };
        Some(self.issue_ticket())
    }

    pub fn authorization_failed(&mut self, ticket: &Ticket) {
        if self.is_current(ticket) && self.state == ProfileState::Authorizing {
            self.state = ProfileState::Disconnected;
        }
    }

    /// Restart aggregation. A `Ready` session keeps showing its profile
    /// until the new one arrives.
    pub fn begin_refresh(&mut self) -> Option<(AccessToken, Ticket)> {
        let token = self.state.token()?.clone();
        Some((token, self.issue_ticket()))
    }

    /// Replace the profile wholesale. Returns false for stale tickets.
    pub fn profile_loaded(&mut self, ticket: &Ticket, profile: ListeningProfile) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        let token = match self.state.token() {
            Some(token) => token.clone(),
            None => return false,
        };
        self.state = ProfileState::Ready {
            token,
            profile: Arc::new(profile),
        };
        true
    }

    /// Drop the token and profile, aborting in-flight work
    pub fn disconnect(&mut self) {
        self.issue_ticket();
        self.state = ProfileState::Disconnected;
    }

    pub fn sign_in(&mut self, wallet: WalletIdentity) {
        self.wallet = Some(wallet);
    }

    /// Wallet sign-out also unlinks the music account
    pub fn sign_out(&mut self) {
        self.wallet = None;
        self.disconnect();
    }
}

pub type SharedSession = Arc<Mutex<ProfileSession>>;

// Idle sessions live as long as their cookie (24 hours)
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

struct SessionEntry {
    session: SharedSession,
    last_seen: Instant,
}

/// Drives the per-session state machines against the provider
pub struct ProfileController {
    oauth: Arc<dyn TokenExchange>,
    spotify: Arc<dyn SpotifyApi>,
    sessions: DashMap<Uuid, SessionEntry>,
    session_ttl: Duration,
}

impl ProfileController {
    pub fn new(oauth: Arc<dyn TokenExchange>, spotify: Arc<dyn SpotifyApi>) -> Self {
        Self {
            oauth,
            spotify,
            sessions: DashMap::new(),
            session_ttl: SESSION_TTL,
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn authorize_url(&self) -> String {
        self.oauth.authorize_url()
    }

    /// Get or create the session for `id`
    pub fn open_session(&self, id: Uuid) -> SharedSession {
        let mut entry = self.sessions.entry(id).or_insert_with(|| SessionEntry {
            session: SharedSession::default(),
            last_seen: Instant::now(),
        });
        entry.last_seen = Instant::now();
        entry.session.clone()
    }

    /// Existing session only; unknown ids are never inserted
    pub fn find_session(&self, id: Uuid) -> Option<SharedSession> {
        self.sessions.get_mut(&id).map(|mut entry| {
            entry.last_seen = Instant::now();
            entry.session.clone()
        })
    }

    /// Evict sessions idle for longer than the session TTL, aborting their work
    pub fn cleanup_expired_sessions(&self) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| {
            let live = now.duration_since(entry.last_seen) < self.session_ttl;
            if !live {
                if let Ok(mut session) = entry.session.try_lock() {
                    session.disconnect();
                }
            }
            live
        });
        before.saturating_sub(self.sessions.len())
    }

    #[cfg(test)]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Exchange `code` for a token and then load the profile.
    /// Errors are logged and leave the session disconnected.
    pub async fn complete_authorization(&self, session: SharedSession, ticket: Ticket, code: String) {
        match self.oauth.exchange_code(&code, &ticket.cancel).await {
            Ok(token) => {
                let load_ticket = session.lock().await.token_received(&ticket, token.clone());
                match load_ticket {
                    Some(load_ticket) => self.load(&session, token, load_ticket).await,
                    None => tracing::debug!("Discarding token from superseded authorization"),
                }
            }
            Err(AppError::Cancelled) => {
                tracing::debug!("Authorization {} cancelled", ticket.generation);
            }
            Err(e) => {
                tracing::warn!("Spotify authorization failed: {}", e);
                session.lock().await.authorization_failed(&ticket);
            }
        }
    }

    /// Aggregate and apply the profile if the ticket is still current.
    /// A failure leaves the session as it was.
    pub async fn load(&self, session: &SharedSession, token: AccessToken, ticket: Ticket) {
        tracing::info!("Loading listening profile for {}", token_fingerprint(token.as_str()));

        match fetch_listening_profile(self.spotify.as_ref(), &token, &ticket.cancel).await {
            Ok(profile) => {
                if !session.lock().await.profile_loaded(&ticket, profile) {
                    tracing::debug!("Discarding stale profile for generation {}", ticket.generation);
                }
            }
            Err(AppError::Cancelled) => {
                tracing::debug!("Profile load {} cancelled", ticket.generation);
            }
            Err(e) => {
                tracing::error!("Failed to load listening profile: {}", e);
            }
        }
    }
}
