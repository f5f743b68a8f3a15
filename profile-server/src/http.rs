// profile-server/src/http.rs
use common::{AppError, AppResult};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

/// Send a request and decode its JSON body.
///
/// The whole exchange is raced against `cancel`; when the token fires first
/// the in-flight request is dropped, which aborts it, and `Cancelled` is
/// returned. Non-2xx statuses are upstream failures.
pub async fn fetch_json<T: DeserializeOwned>(
    request: RequestBuilder,
    cancel: &CancellationToken,
) -> AppResult<T> {
    let exchange = async {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let url = response.url().clone();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::upstream(format!(
                "request to {} returned {}: {}",
                url.path(),
                status,
                body
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::upstream(format!("invalid response body: {}", e)))
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AppError::Cancelled),
        result = exchange => result,
    }
}
