// secrets-server/src/middleware/rate_limiter.rs
use std::sync::Arc;
use std::time::{Duration, Instant};
use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::{header, StatusCode},
    Error, ResponseError,
    HttpResponse
};
use common::models::ErrorResponse;
use common::RateLimitConfig;
use dashmap::DashMap;
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::fmt;

// Custom error for rate limiting
#[derive(Debug)]
struct RateLimitExceeded {
    retry_after: u64,
}

impl fmt::Display for RateLimitExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rate limit exceeded")
    }
}

impl ResponseError for RateLimitExceeded {
    fn status_code(&self) -> StatusCode {
        StatusCode::TOO_MANY_REQUESTS
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::TooManyRequests()
            .append_header((header::RETRY_AFTER, self.retry_after.to_string()))
            .json(ErrorResponse {
                error: "Too many requests, please try again later.".to_string(),
            })
    }
}

/// Fixed quota per peer IP over a sliding window; excess requests are rejected
#[derive(Debug, Clone)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    store: Arc<DashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            store: Arc::new(DashMap::new()),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_secs(config.window_seconds))
    }

    fn is_rate_limited(&self, ip: &str) -> bool {
        let now = Instant::now();
        let mut hits = self.store.entry(ip.to_string()).or_default();

        hits.retain(|time| now.duration_since(*time) < self.window);

        if hits.len() >= self.max_requests {
            true
        } else {
            hits.push(now);
            false
        }
    }

    /// Drop callers whose window has emptied, returns how many were removed
    pub fn prune_idle(&self) -> usize {
        let now = Instant::now();
        let before = self.store.len();
        self.store.retain(|_, hits| {
            hits.retain(|time| now.duration_since(*time) < self.window);
            !hits.is_empty()
        });
        before.saturating_sub(self.store.len())
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

// Socket address only; forwarding headers are client controlled
fn caller_key(req: &ServiceRequest) -> String {
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

impl<S, B> Transform<S, ServiceRequest> for RateLimiter
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RateLimiterMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimiterMiddleware {
            service,
            limiter: self.clone(),
        }))
    }
}

pub struct RateLimiterMiddleware<S> {
    service: S,
    limiter: RateLimiter,
}

impl<S, B> Service<ServiceRequest> for RateLimiterMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<ServiceResponse<B>, Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let ip = caller_key(&req);

        if self.limiter.is_rate_limited(&ip) {
            tracing::warn!("Rate limit exceeded for IP: {}", ip);

            let retry_after = self.limiter.window.as_secs();
            return Box::pin(async move {
                Err(RateLimitExceeded { retry_after }.into())
            });
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            fut.await
        })
    }
}
