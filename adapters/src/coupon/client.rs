use std::time::Duration;

use async_trait::async_trait;
use corelib::{CouponSpec, User};
use reqwest::{Client, Response};
use tracing::{debug, instrument, warn};

use super::cancel::CancelSignal;
use super::errors::ApiError;
use super::types::{ClaimRequest, ErrorEnvelope, UsersEnvelope};
use super::CouponApi;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Service root, e.g. `http://localhost:3500`. A trailing `/` is ignored.
    pub base_url: String,

    /// Hard limit for a single claim. Past it the claim settles as a timeout.
    pub claim_timeout: Duration,

    /// Limit for coupon creation and the reachability check.
    pub request_timeout: Duration,

    /// Limit for bulk user generation, which the service may take a while on.
    pub generate_timeout: Duration,
}

impl ClientConfig {
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:3500";
    pub const DEFAULT_CLAIM_TIMEOUT: Duration = Duration::from_millis(10_000);

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            claim_timeout: Self::DEFAULT_CLAIM_TIMEOUT,
            request_timeout: Duration::from_millis(10_000),
            generate_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_claim_timeout(mut self, timeout: Duration) -> Self {
        self.claim_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASE_URL)
    }
}

/// reqwest-backed [`CouponApi`]. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct HttpCouponClient {
    http: Client,
    config: ClientConfig,
}

impl HttpCouponClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(ApiError::Transport)?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn claim_once(&self, user_id: &str, coupon_id: &str) -> Result<serde_json::Value, ApiError> {
        let timeout = self.config.claim_timeout;

        let resp = self
            .http
            .post(self.url("/user-coupons"))
            .json(&ClaimRequest { user_id, coupon_id })
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(e, timeout))?;

        let resp = check_status(resp, timeout).await?;
        let body = resp
            .text()
            .await
            .map_err(|e| ApiError::from_reqwest(e, timeout))?;

        Ok(parse_payload(&body))
    }
}

#[async_trait]
impl CouponApi for HttpCouponClient {
    #[instrument(skip(self), fields(base_url = %self.config.base_url), level = "debug")]
    async fn ping(&self) -> Result<(), ApiError> {
        let timeout = self.config.request_timeout;

        let resp = self
            .http
            .get(&self.config.base_url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(e, timeout))?;

        check_status(resp, timeout).await?;
        debug!("coupon service reachable");
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn generate_users(&self, count: usize) -> Result<Vec<User>, ApiError> {
        let timeout = self.config.generate_timeout;

        let resp = self
            .http
            .post(self.url("/users/random"))
            .query(&[("count", count)])
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(e, timeout))?;

        let envelope: UsersEnvelope = check_status(resp, timeout)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::from_reqwest(e, timeout))?;

        let users: Vec<User> = envelope.data.into_iter().map(User::from).collect();

        if users.len() != count {
            warn!(requested = count, received = users.len(), "user count mismatch");
        }
        debug!(received = users.len(), "users generated");

        Ok(users)
    }

    #[instrument(skip(self, spec), fields(coupon_id = %spec.coupon_id, quantity = spec.quantity), level = "debug")]
    async fn create_coupon(&self, spec: &CouponSpec) -> Result<(), ApiError> {
        let timeout = self.config.request_timeout;

        let resp = self
            .http
            .post(self.url("/coupons"))
            .json(spec)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(e, timeout))?;

        check_status(resp, timeout).await?;
        debug!("coupon created");
        Ok(())
    }

    #[instrument(skip(self, cancel), level = "debug")]
    async fn claim_coupon(
        &self,
        user_id: &str,
        coupon_id: &str,
        cancel: &CancelSignal,
    ) -> Result<serde_json::Value, ApiError> {
        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        tokio::select! {
            biased;

            _ = cancel.cancelled() => Err(ApiError::Cancelled),
            res = self.claim_once(user_id, coupon_id) => res,
        }
    }
}

/// Passes 2xx responses through; turns anything else into `ApiError::Server`
/// carrying the service's `error.message` when present.
async fn check_status(resp: Response, timeout: Duration) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp
        .text()
        .await
        .map_err(|e| ApiError::from_reqwest(e, timeout))?;

    Err(ApiError::server(status, ErrorEnvelope::message_from(&body)))
}

/// Success bodies are kept verbatim: JSON when they parse, text otherwise.
fn parse_payload(body: &str) -> serde_json::Value {
    if body.trim().is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| serde_json::Value::String(body.to_string()))
}
