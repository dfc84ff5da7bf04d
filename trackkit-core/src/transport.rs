//! Single-attempt JSON delivery to the collection endpoint.

use std::time::Duration;

use reqwest::Url;
use serde::Serialize;
use thiserror::Error;

/// Errors raised while delivering a payload.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The configured collection endpoint is not a valid URL.
    #[error("invalid_endpoint: {0}")]
    InvalidEndpoint(String),
    /// The payload could not be encoded as JSON.
    #[error("encoding_failed: {0}")]
    EncodingFailed(String),
    /// The endpoint answered with a non-2xx status.
    #[error("server_rejected: {0}")]
    ServerRejected(u16),
    /// The network exchange itself failed.
    #[error(transparent)]
    Network(#[from] reqwest::Error),
}

/// A thin wrapper on an HTTP client for delivering payloads. Sets a fixed
/// timeout and user-agent; treats any 2xx status as success.
///
/// One attempt per invocation: no retries, no queueing, no persistence of
/// undelivered payloads. A failed send loses exactly that payload.
pub struct Transport {
    client: reqwest::Client,
    endpoint: Url,
}

impl Transport {
    const TIMEOUT: Duration = Duration::from_secs(5);

    /// Creates a transport bound to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidEndpoint`] if `endpoint` does not
    /// parse as a URL.
    pub fn new(endpoint: &str) -> Result<Self, TransportError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|err| TransportError::InvalidEndpoint(format!("{endpoint}: {err}")))?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
        })
    }

    /// Serializes `payload` and POSTs it to the endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::EncodingFailed`] if serialization fails,
    /// [`TransportError::ServerRejected`] on a non-2xx response, or
    /// [`TransportError::Network`] if the exchange itself fails.
    pub async fn send<T>(&self, payload: &T) -> Result<(), TransportError>
    where
        T: Serialize + Send + Sync,
    {
        let body = serde_json::to_vec(payload)
            .map_err(|err| TransportError::EncodingFailed(err.to_string()))?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .timeout(Self::TIMEOUT)
            .header("Content-Type", "application/json")
            .header(
                "User-Agent",
                format!("trackkit-core/{}", env!("CARGO_PKG_VERSION")),
            )
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            log::debug!("payload delivered with status {status}");
            Ok(())
        } else {
            log::warn!("collection endpoint rejected payload with status {status}");
            Err(TransportError::ServerRejected(status.as_u16()))
        }
    }
}
