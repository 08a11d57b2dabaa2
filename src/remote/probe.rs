//! HTTP probes for hosted documents
//!
//! A probe answers one question per URL: does it serve the real file? A 2xx
//! status is not enough, because large-object storage hands out a small text
//! pointer in place of the content when the wrong endpoint is used.

use crate::error::ApiError;
use async_trait::async_trait;
use reqwest::header::{HeaderValue, RANGE};
use reqwest::Client;
use std::time::Duration;
use tracing::trace;

/// Leading bytes of a large-object storage pointer file.
pub const LFS_POINTER_MAGIC: &[u8] = b"version https://git-lfs";

const PROBE_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of probing a single URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// 2xx and the content is not a pointer stub
    Accessible,
    /// 2xx but the body is a storage pointer
    PointerStub,
    /// Non-2xx final status (after redirects)
    HttpStatus(u16),
    /// No HTTP answer. `transient` failures (timeouts, resets, refused
    /// connections) are worth retrying.
    Network { message: String, transient: bool },
}

impl ProbeOutcome {
    pub fn is_transient(&self) -> bool {
        matches!(self, ProbeOutcome::Network { transient: true, .. })
    }
}

/// Probe seam used by the remote verifier
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeOutcome;
}

/// True when `body` starts with the pointer magic.
pub fn is_pointer_stub(body: &[u8]) -> bool {
    body.starts_with(LFS_POINTER_MAGIC)
}

/// `reqwest`-backed prober: HEAD for reachability, then a ranged GET of the
/// first bytes for the pointer check.
pub struct HttpProber {
    client: Client,
    probe_bytes: usize,
}

impl HttpProber {
    /// Build a prober whose requests time out after `timeout`.
    pub fn new(timeout: Duration, probe_bytes: usize) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("resman/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(PROBE_CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::HttpClient(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self::with_client(client, probe_bytes))
    }

    /// Use a preconfigured client.
    pub fn with_client(client: Client, probe_bytes: usize) -> Self {
        Self {
            client,
            probe_bytes: probe_bytes.max(LFS_POINTER_MAGIC.len()),
        }
    }

    async fn leading_bytes(&self, url: &str) -> Result<Vec<u8>, ProbeOutcome> {
        let range = HeaderValue::from_str(&format!("bytes=0-{}", self.probe_bytes - 1))
            .map_err(|e| ProbeOutcome::Network {
                message: e.to_string(),
                transient: false,
            })?;
        let mut response = self
            .client
            .get(url)
            .header(RANGE, range)
            .send()
            .await
            .map_err(map_network_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeOutcome::HttpStatus(status.as_u16()));
        }

        let mut body = Vec::with_capacity(self.probe_bytes);
        while body.len() < self.probe_bytes {
            match response.chunk().await.map_err(map_network_error)? {
                Some(chunk) => body.extend_from_slice(&chunk),
                None => break,
            }
        }
        body.truncate(self.probe_bytes);
        Ok(body)
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        let head = match self.client.head(url).send().await {
            Ok(response) => response,
            Err(e) => return map_network_error(e),
        };
        let status = head.status();
        trace!(url, status = status.as_u16(), "HEAD");
        if !status.is_success() {
            return ProbeOutcome::HttpStatus(status.as_u16());
        }

        match self.leading_bytes(url).await {
            Ok(body) if is_pointer_stub(&body) => ProbeOutcome::PointerStub,
            Ok(_) => ProbeOutcome::Accessible,
            Err(outcome) => outcome,
        }
    }
}

fn map_network_error(error: reqwest::Error) -> ProbeOutcome {
    if let Some(status) = error.status() {
        return ProbeOutcome::HttpStatus(status.as_u16());
    }
    let transient =
        error.is_timeout() || error.is_connect() || error.is_request() || error.is_body();
    let message = if error.is_timeout() {
        format!("Request timeout: {}", error)
    } else if error.is_connect() {
        format!("Connection error: {}", error)
    } else {
        format!("HTTP error: {}", error)
    };
    ProbeOutcome::Network { message, transient }
}
