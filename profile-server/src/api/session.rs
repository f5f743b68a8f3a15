// profile-server/src/api/session.rs
use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::{HttpRequest, HttpResponseBuilder};
use uuid::Uuid;
use crate::profile::SESSION_TTL;

// Cookie name for session tracking
pub const SESSION_COOKIE_NAME: &str = "tunecred_session";

/// How session cookies are minted for this deployment
#[derive(Clone, Debug)]
pub struct SessionCookies {
    secure: bool,
}

impl SessionCookies {
    /// Cookies are `Secure` only when the app itself is served over https
    pub fn for_redirect_uri(redirect_uri: &str) -> Self {
        Self {
            secure: redirect_uri.starts_with("https://"),
        }
    }

    fn build(&self, id: Uuid) -> Cookie<'static> {
        // Lax so the cookie survives the provider's redirect back to /profile
        Cookie::build(SESSION_COOKIE_NAME, id.to_string())
            .path("/")
            .secure(self.secure)
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(CookieDuration::seconds(SESSION_TTL.as_secs() as i64))
            .finish()
    }
}

/// Session resolved from the request cookie, or a fresh one
#[derive(Clone, Copy, Debug)]
pub struct SessionId {
    pub id: Uuid,
    pub is_new: bool,
}

impl SessionId {
    /// Id carried by the request cookie, if it parses
    pub fn existing(req: &HttpRequest) -> Option<Uuid> {
        req.cookie(SESSION_COOKIE_NAME)
            .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
    }

    pub fn resolve(req: &HttpRequest) -> Self {
        match Self::existing(req) {
            Some(id) => Self { id, is_new: false },
            None => {
                let id = Uuid::new_v4();
                tracing::info!("Created new profile session: {}", id);
                Self { id, is_new: true }
            }
        }
    }

    /// Set the cookie on the response when the session was just created
    pub fn attach(&self, response: &mut HttpResponseBuilder, cookies: &SessionCookies) {
        if self.is_new {
            response.cookie(cookies.build(self.id));
        }
    }
}
