// profile-server/src/api/wallet.rs
use actix_web::{delete, get, post, web, HttpRequest, HttpResponse};
use common::AppError;
use serde::{Deserialize, Serialize};
use crate::error::ApiError;
use crate::profile::{ProfileController, ProfileSession, WalletIdentity};
use crate::smart_account::SmartAccountSettings;
use super::session::{SessionCookies, SessionId};
use super::{ProfilePage, WalletSettings};

/// Reported by the browser after the wallet-auth SDK signs the user in
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSignIn {
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SmartAccountResponse<'a> {
    #[serde(flatten)]
    settings: &'a SmartAccountSettings,
    owner_address: String,
}

#[post("/wallet")]
pub async fn sign_in(
    req: HttpRequest,
    body: web::Json<WalletSignIn>,
    controller: web::Data<ProfileController>,
    cookies: web::Data<SessionCookies>,
    wallet: web::Data<WalletSettings>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let address = body
        .wallet_address
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .ok_or_else(|| AppError::invalid_input("Wallet address required"))?;

    let session_id = SessionId::resolve(&req);
    let session = controller.open_session(session_id.id);
    let mut guard = session.lock().await;

    tracing::info!("Wallet {} signed in", common::truncate_wallet_address(&address));
    guard.sign_in(WalletIdentity {
        address,
        username: body.username.filter(|u| !u.is_empty()),
    });

    let mut response = HttpResponse::Ok();
    session_id.attach(&mut response, &cookies);
    Ok(response.json(ProfilePage::render(&guard, controller.authorize_url(), &wallet)))
}

// Signing out of the wallet also unlinks Spotify for this session
#[delete("/wallet")]
pub async fn sign_out(
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

    guard.sign_out();
    tracing::info!("Session {} signed out", id);

    HttpResponse::Ok().json(ProfilePage::render(&guard, connect_url, &wallet))
}

#[get("/smart-account")]
pub async fn smart_account(
    req: HttpRequest,
    controller: web::Data<ProfileController>,
    settings: web::Data<Option<SmartAccountSettings>>,
) -> Result<HttpResponse, ApiError> {
    let session = SessionId::existing(&req).and_then(|id| controller.find_session(id));
    let owner_address = match session {
        Some(session) => {
            let guard = session.lock().await;
            guard.wallet().map(|w| w.address.clone())
        }
        None => None,
    }
    .ok_or_else(|| AppError::invalid_input("Wallet sign-in required"))?;

    let settings = settings
        .get_ref()
        .as_ref()
        .ok_or_else(|| AppError::unavailable("Smart account not configured"))?;

    Ok(HttpResponse::Ok().json(SmartAccountResponse {
        settings,
        owner_address,
    }))
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use crate::aggregator::fakes::FakeSpotify;
    use crate::smart_account::SmartAccountSettings;
    use actix_web::{http::StatusCode, test, App};
    use common::models::AccessToken;
    use common::SmartAccountConfig;
    use serde_json::{json, Value};

    fn sign_in_request(body: Value) -> test::TestRequest {
        test::TestRequest::post().uri("/wallet").set_json(body)
    }

    #[actix_web::test]
    async fn sign_in_shows_truncated_address() {
        let harness = Harness::new(Ok(AccessToken::new("tok")), FakeSpotify::new(5, 1, 10));
        let app = test::init_service(App::new().configure(|cfg| harness.configure(cfg))).await;

        let req = sign_in_request(json!({
            "walletAddress": "0x1234567890abcdef1234",
            "username": "ana"
        }));
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        session_cookie(&resp);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["walletAddress"], "0x12...1234");
        assert_eq!(body["username"], "ana");
    }

    #[actix_web::test]
    async fn sign_in_requires_an_address() {
        let harness = Harness::new(Ok(AccessToken::new("tok")), FakeSpotify::new(5, 1, 10));
        let app = test::init_service(App::new().configure(|cfg| harness.configure(cfg))).await;

        for body in [json!({}), json!({ "walletAddress": "" }), json!({ "walletAddress": null })] {
            let resp = test::call_service(&app, sign_in_request(body).to_request()).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["error"], "Wallet address required");
        }
    }

    #[actix_web::test]
    async fn sign_out_unlinks_spotify() {
        let harness = Harness::new(Ok(AccessToken::new("tok")), FakeSpotify::new(5, 1, 10));
        let app = test::init_service(App::new().configure(|cfg| harness.configure(cfg))).await;

        let req = sign_in_request(json!({ "walletAddress": "0x1234567890abcdef1234" }));
        let resp = test::call_service(&app, req.to_request()).await;
        let cookie = session_cookie(&resp);

        let req = test::TestRequest::get().uri("/profile?code=abc").cookie(cookie.clone()).to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::delete().uri("/wallet").cookie(cookie.clone()).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["state"], "disconnected");
        assert_eq!(body["spotifyConnected"], false);
        assert_eq!(body["walletAddress"], Value::Null);
        assert_eq!(body["username"], "Guest");
    }

    #[actix_web::test]
    async fn smart_account_needs_wallet_and_configuration() {
        let mut harness = Harness::new(Ok(AccessToken::new("tok")), FakeSpotify::new(5, 1, 10));
        let app = test::init_service(App::new().configure(|cfg| harness.configure(cfg))).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/smart-account").to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = sign_in_request(json!({ "walletAddress": "0xabc0000000000000000000000000000000000001" }));
        let resp = test::call_service(&app, req.to_request()).await;
        let cookie = session_cookie(&resp);

        let req = test::TestRequest::get().uri("/smart-account").cookie(cookie.clone()).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        drop(app);

        harness.smart_account = Some(
            SmartAccountSettings::from_config(&SmartAccountConfig {
                bundler_url: "https://bundler.example/api".to_string(),
                paymaster_url: "https://paymaster.example/api".to_string(),
                ..SmartAccountConfig::default()
            })
            .unwrap(),
        );
        let app = test::init_service(App::new().configure(|cfg| harness.configure(cfg))).await;

        let req = test::TestRequest::get().uri("/smart-account").cookie(cookie).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["chainId"], 11155111);
        assert_eq!(body["bundlerUrl"], "https://bundler.example/api");
        assert_eq!(body["ownerAddress"], "0xabc0000000000000000000000000000000000001");
    }

    #[actix_web::test]
    async fn sign_out_without_session_stays_anonymous() {
        let harness = Harness::new(Ok(AccessToken::new("tok")), FakeSpotify::new(5, 1, 10));
        let app = test::init_service(App::new().configure(|cfg| harness.configure(cfg))).await;

        for _ in 0..10 {
            let body: Value =
                test::call_and_read_body_json(&app, test::TestRequest::delete().uri("/wallet").to_request()).await;
            assert_eq!(body["username"], "Guest");
            let resp = test::call_service(&app, test::TestRequest::get().uri("/smart-account").to_request()).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }
        assert_eq!(harness.controller.session_count(), 0);
    }
}
