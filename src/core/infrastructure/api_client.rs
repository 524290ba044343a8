//! Internal HTTP client that talks JSON to the GNS3 controller.

use crate::core::{
    domain::{
        error::{Gns3Error, Gns3Result},
        model::client_config::ClientConfig,
        value_object::Gns3Url,
    },
    infrastructure::transport::ControllerTransport,
};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, Method, Response};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Internal HTTP client that provides methods to call the GNS3 controller API.
///
/// Every request is sent below the versioned API root of the controller. When
/// a rate limit is configured, requests wait for capacity before being sent.
#[derive(Debug)]
pub struct ApiClient {
    http_client: Client,
    base_url: Arc<Gns3Url>,
    rate_limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl ApiClient {
    /// Creates a new `ApiClient`.
    ///
    /// # Errors
    /// Returns `Gns3Error::Connection` if the HTTP client cannot be built and
    /// `Gns3Error::Validation` if the rate limit is zero.
    pub fn new(base_url: Gns3Url, config: &ClientConfig) -> Gns3Result<Self> {
        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Gns3Error::Connection(e.to_string()))?;

        let rate_limiter = match config.rate_limit {
            Some(rl) => {
                let (rate, burst) = rl.quota()?;
                let quota = Quota::per_second(rate).allow_burst(burst);
                Some(Arc::new(RateLimiter::direct(quota)))
            }
            None => None,
        };

        Ok(Self {
            http_client,
            base_url: Arc::new(base_url),
            rate_limiter,
        })
    }

    /// Returns the root URL of the controller.
    pub fn base_url(&self) -> &Gns3Url {
        &self.base_url
    }

    /// Performs a GET request.
    ///
    /// # Type Parameters
    /// - `T`: The expected response type (must implement `DeserializeOwned`).
    ///
    /// # Errors
    /// Returns `Gns3Error` if the request fails or the response cannot be parsed.
    pub async fn get<T>(&self, path: &str) -> Gns3Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.execute_request(Method::GET, path, None::<&()>).await
    }

    /// Core request execution method. It applies rate limiting, sends the
    /// request, and parses the response.
    async fn execute_request<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Gns3Result<T>
    where
        B: serde::Serialize,
        T: serde::de::DeserializeOwned,
    {
        let url = self.base_url.endpoint(path)?;

        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        debug!(%method, %url, "sending controller request");
        let mut req_builder = self.http_client.request(method, &url);
        if let Some(body) = body {
            req_builder = req_builder.json(body);
        }

        let response = req_builder
            .send()
            .await
            .map_err(|e| Gns3Error::Connection(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let text = response
            .text()
            .await
            .map_err(|e| Gns3Error::Connection(format!("Failed to read response: {}", e)))?;
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };

        serde_json::from_str::<T>(text)
            .map_err(|e| Gns3Error::Connection(format!("Failed to parse response: {}", e)))
    }

    /// Builds the error for a non-success response, preferring the
    /// controller's own `message` field over the raw body.
    async fn api_error(response: Response) -> Gns3Error {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown".to_string());

        let message = serde_json::from_str::<Value>(&error_text)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or(error_text);

        warn!(status = status.as_u16(), %message, "controller reported an error");
        Gns3Error::Api {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl ControllerTransport for ApiClient {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Gns3Result<Value> {
        self.execute_request(method, path, body.as_ref()).await
    }
}
