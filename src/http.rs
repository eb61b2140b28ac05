//! HTTP client for the GiroPro journeys API.
//!
//! Implements [`JourneyApi`] over reqwest with:
//! - Connection pooling via a shared client
//! - Per-request timeout from [`ApiConfig`]
//! - Automatic retry with exponential backoff on 429, 5xx and transport errors
//!
//! Only requests that can be replayed without side effects (`GET`, `PUT`) are
//! retried after a 5xx or transport error; the server may already have
//! applied a `POST` or `DELETE` that failed on the way back. A 429 is retried
//! for every method since the server refused the request outright.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;

use crate::api::{check_acknowledgement, decode_payload, failure_message, JourneyApi};
use crate::config::ApiConfig;
use crate::error::{GiroError, Result};
use crate::journey::{Journey, JourneyInput, JourneyPatch};

const JOURNEYS_PATH: &str = "/journeys";

/// Backoff before retry number `attempt` (1-based): 500ms, 1s, 2s, 4s...
fn backoff_for(attempt: u32) -> Duration {
    Duration::from_millis(500 * (1 << attempt.saturating_sub(1).min(4)))
}

/// reqwest-backed journeys client
pub struct HttpJourneyApi {
    client: Client,
    config: ApiConfig,
}

impl HttpJourneyApi {
    pub fn new(config: ApiConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| GiroError::Config {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.config.url(path));
        match &self.config.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request, retrying transient failures. Returns the success body.
    async fn send<B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Vec<u8>> {
        let start = Instant::now();
        let mut attempt = 0;

        loop {
            let mut request = self.request(method.clone(), path);
            if let Some(body) = body {
                request = request.json(body);
            }

            let error = match request.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    let bytes = resp.bytes().await.map_err(|e| GiroError::Http {
                        message: e.to_string(),
                    })?;

                    if status.is_success() {
                        debug!(
                            "[JourneyApi] {} {} -> {} in {:?}",
                            method,
                            path,
                            status,
                            start.elapsed()
                        );
                        return Ok(bytes.to_vec());
                    }

                    status_error(status, &bytes)
                }
                Err(e) => GiroError::Http {
                    message: e.to_string(),
                },
            };

            attempt += 1;
            if !should_retry(&method, &error) || attempt > self.config.max_retries {
                warn!("[JourneyApi] {} {} failed: {}", method, path, error);
                return Err(error);
            }

            let backoff = backoff_for(attempt);
            warn!(
                "[JourneyApi] {} {}: {}, retry {} after {:?}",
                method, path, error, attempt, backoff
            );
            tokio::time::sleep(backoff).await;
        }
    }
}

fn should_retry(method: &Method, error: &GiroError) -> bool {
    match error {
        GiroError::Api {
            status_code: Some(429),
            ..
        } => true,
        _ => error.is_transient() && (*method == Method::GET || *method == Method::PUT),
    }
}

fn status_error(status: StatusCode, body: &[u8]) -> GiroError {
    GiroError::Api {
        message: failure_message(body).unwrap_or_default(),
        status_code: Some(status.as_u16()),
    }
}

fn journey_path(id: &str) -> String {
    format!("{}/{}", JOURNEYS_PATH, id)
}

#[async_trait]
impl JourneyApi for HttpJourneyApi {
    async fn list(&self) -> Result<Vec<Journey>> {
        let body = self.send::<()>(Method::GET, JOURNEYS_PATH, None).await?;
        let journeys: Vec<Journey> = decode_payload(&body)?;
        info!("[JourneyApi] Loaded {} journeys", journeys.len());
        Ok(journeys)
    }

    async fn create(&self, input: &JourneyInput) -> Result<()> {
        let body = self.send(Method::POST, JOURNEYS_PATH, Some(input)).await?;
        check_acknowledgement(&body)
    }

    async fn update(&self, id: &str, patch: &JourneyPatch) -> Result<()> {
        let body = self.send(Method::PUT, &journey_path(id), Some(patch)).await?;
        check_acknowledgement(&body)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let body = self
            .send::<()>(Method::DELETE, &journey_path(id), None)
            .await?;
        check_acknowledgement(&body)
    }
}
