//! The REST contract the journey store consumes.
//!
//! The backend lives outside this crate. [`JourneyApi`] is the seam: the
//! reqwest client in [`crate::http`] implements it for production, tests
//! plug in an in-memory double.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{GiroError, Result};
use crate::journey::{Journey, JourneyInput, JourneyPatch};

/// Remote journey resource: `GET/POST /journeys`, `PUT/DELETE /journeys/{id}`.
#[async_trait]
pub trait JourneyApi: Send + Sync {
    /// Fetch the full journey list.
    async fn list(&self) -> Result<Vec<Journey>>;

    async fn create(&self, input: &JourneyInput) -> Result<()>;

    async fn update(&self, id: &str, patch: &JourneyPatch) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<()>;
}

/// Wrapper some endpoints put around their payload.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default = "Option::default")]
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl<T> Envelope<T> {
    fn failure_message(&self) -> Option<String> {
        self.error.clone().or_else(|| self.message.clone())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Body<T> {
    Bare(T),
    Wrapped(Envelope<T>),
}

/// Decode a success body that is either the payload itself or an envelope
/// `{success, data, error|message}`.
pub fn decode_payload<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let parsed: Body<T> = serde_json::from_slice(body).map_err(|e| GiroError::Decode {
        message: e.to_string(),
    })?;

    match parsed {
        Body::Bare(payload) => Ok(payload),
        Body::Wrapped(envelope) => {
            if envelope.success == Some(false) {
                return Err(GiroError::Api {
                    message: envelope
                        .failure_message()
                        .unwrap_or_else(|| "Request failed".to_string()),
                    status_code: None,
                });
            }
            let fallback = envelope.failure_message();
            envelope.data.ok_or_else(|| GiroError::Decode {
                message: fallback.unwrap_or_else(|| "response has no data".to_string()),
            })
        }
    }
}

/// Check a mutation's success body. Empty bodies count as success.
pub fn check_acknowledgement(body: &[u8]) -> Result<()> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(());
    }
    match serde_json::from_slice::<Envelope<serde_json::Value>>(body) {
        Ok(envelope) if envelope.success == Some(false) => Err(GiroError::Api {
            message: envelope
                .failure_message()
                .unwrap_or_else(|| "Request failed".to_string()),
            status_code: None,
        }),
        // Any other body (the created record, a bare object) is an ack
        _ => Ok(()),
    }
}

/// Extract the human-readable message from a failure body.
pub fn failure_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<Envelope<serde_json::Value>>(body)
        .ok()
        .and_then(|e| e.failure_message())
        .filter(|m| !m.trim().is_empty())
}
