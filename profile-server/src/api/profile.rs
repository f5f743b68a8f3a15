// profile-server/src/api/profile.rs
use actix_web::{delete, get, http::header, post, web, HttpRequest, HttpResponse};
use common::models::StoreTokenResponse;
use common::AppError;
use serde::Deserialize;
use crate::error::ApiError;
use crate::profile::{ProfileController, ProfileSession};
use crate::publish::TokenPublisher;
use super::session::{SessionCookies, SessionId};
use super::{ProfilePage, WalletSettings};

/// Query string the provider redirects back with
#[derive(Debug, Default, Deserialize)]
pub struct AuthorizationCallback {
    pub code: Option<String>,
    pub error: Option<String>,
}

fn not_connected() -> ApiError {
    AppError::invalid_input("Spotify account not connected").into()
}

// Send the browser to the provider's consent screen
#[get("/connect")]
pub async fn connect(
    req: HttpRequest,
    controller: web::Data<ProfileController>,
    cookies: web::Data<SessionCookies>,
) -> HttpResponse {
    let session = SessionId::resolve(&req);

    let mut response = HttpResponse::Found();
    session.attach(&mut response, &cookies);
    response
        .insert_header((header::LOCATION, controller.authorize_url()))
        .finish()
}

// Render the profile page; a `code` starts the token exchange
#[get("/profile")]
pub async fn get_profile(
    req: HttpRequest,
    query: web::Query<AuthorizationCallback>,
    controller: web::Data<ProfileController>,
    cookies: web::Data<SessionCookies>,
    wallet: web::Data<WalletSettings>,
) -> HttpResponse {
    let session_id = SessionId::resolve(&req);
    let session = controller.open_session(session_id.id);
    let connect_url = controller.authorize_url();
    let callback = query.into_inner();

    if let Some(error) = &callback.error {
        tracing::warn!("Spotify authorization denied for {}: {}", session_id.id, error);
    }

    let mut guard = session.lock().await;

    // Absent or empty code is a plain page view
    if let Some(code) = callback.code.filter(|code| !code.is_empty()) {
        match guard.begin_authorization() {
            Some(ticket) => {
                let controller = controller.into_inner();
                let session = session.clone();
                actix_web::rt::spawn(async move {
                    controller.complete_authorization(session, ticket, code).await;
                });
                tracing::info!("Started Spotify authorization for {}", session_id.id);
            }
            None => tracing::debug!("Ignoring authorization code, session {} already linked", session_id.id),
        }
    }

    let page = ProfilePage::render(&guard, connect_url, &wallet);
    drop(guard);

    let mut response = HttpResponse::Ok();
    session_id.attach(&mut response, &cookies);
    response.json(page)
}

// Manual retry; the view stays in its current state until the new profile lands
#[post("/profile/refresh")]
pub async fn refresh_profile(
    req: HttpRequest,
    controller: web::Data<ProfileController>,
    wallet: web::Data<WalletSettings>,
) -> Result<HttpResponse, ApiError> {
    let session = SessionId::existing(&req)
        .and_then(|id| controller.find_session(id))
        .ok_or_else(not_connected)?;
    let mut guard = session.lock().await;

    let (token, ticket) = guard.begin_refresh().ok_or_else(not_connected)?;
    let page = ProfilePage::render(&guard, controller.authorize_url(), &wallet);
    drop(guard);

    let controller = controller.into_inner();
    actix_web::rt::spawn(async move {
        controller.load(&session, token, ticket).await;
    });

    Ok(HttpResponse::Accepted().json(page))
}

// Hand the linked token to the secrets server
#[post("/profile/publish")]
pub async fn publish_token(
    req: HttpRequest,
    controller: web::Data<ProfileController>,
    publisher: web::Data<dyn TokenPublisher>,
) -> Result<HttpResponse, ApiError> {
    let session = SessionId::existing(&req)
        .and_then(|id| controller.find_session(id))
        .ok_or_else(not_connected)?;

    let (token, cancel) = {
        let guard = session.lock().await;
        let token = guard.state().token().cloned().ok_or_else(not_connected)?;
        (token, guard.current_cancel())
    };

    let verification_id = publisher.publish(&token, &cancel).await.map_err(|e| {
        tracing::error!("Error publishing token: {}", e);
        e
    })?;

    Ok(HttpResponse::Ok().json(StoreTokenResponse { verification_id }))
}

// Unlink the music account and drop the profile
#[delete("/profile")]
pub async fn disconnect(
    req: HttpRequest,
    controller: web::Data<ProfileController>,
    wallet: web::Data<WalletSettings>,
) -> HttpResponse {
    let connect_url = controller.authorize_url();
    let found = SessionId::existing(&req).and_then(|id| controller.find_session(id).map(|s| (id, s)));
    let Some((id, session)) = found else {
        return HttpResponse::Ok().json(ProfilePage::render(&ProfileSession::default(), connect_url, &wallet));
    };
    let mut guard = session.lock().await;

    guard.disconnect();
    tracing::info!("Disconnected Spotify for {}", id);

    HttpResponse::Ok().json(ProfilePage::render(&guard, connect_url, &wallet))
}
