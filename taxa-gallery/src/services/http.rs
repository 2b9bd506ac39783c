//! Shared HTTP plumbing for the remote API clients
//!
//! Every client gets a `reqwest::Client` with the standard user agent and
//! timeouts, plus a direct `governor` rate limiter sized for the service.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, Quota, RateLimiter};
use reqwest::header::ACCEPT;
use serde_json::Value;
use tracing::debug;

use crate::error::{GalleryError, GalleryResult};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// HTTP client bound to one remote service
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    rate_limiter: Arc<DirectRateLimiter>,
    service: &'static str,
}

impl ApiClient {
    /// Build a client allowing `requests_per_second` requests
    pub fn new(service: &'static str, requests_per_second: u32) -> GalleryResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(taxa_common::config::get_user_agent())
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| GalleryError::Network(e.to_string()))?;

        let per_second = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            http,
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_second(per_second))),
            service,
        })
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    /// GET `url` with query parameters and decode the JSON body
    pub async fn get_json(&self, url: &str, query: &[(&str, String)]) -> GalleryResult<Value> {
        self.get_json_accepting(url, query, "application/json").await
    }

    /// GET with an explicit `Accept` header (SPARQL endpoints need one)
    pub async fn get_json_accepting(
        &self,
        url: &str,
        query: &[(&str, String)],
        accept: &str,
    ) -> GalleryResult<Value> {
        self.rate_limiter.until_ready().await;

        debug!(service = self.service, url = %url, params = query.len(), "HTTP GET");

        let response = self
            .http
            .get(url)
            .query(query)
            .header(ACCEPT, accept)
            .send()
            .await
            .map_err(|e| GalleryError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GalleryError::Api(status.as_u16(), error_text));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| GalleryError::Parse(e.to_string()))
    }
}
