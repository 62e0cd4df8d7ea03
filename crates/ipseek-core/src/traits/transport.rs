// # Echo Transport Trait
//
// Defines the interface for fetching one response from an address-echo
// endpoint.
//
// ## Implementations
//
// - HTTP (reqwest): `ipseek-http` crate
// - Test doubles: scripted transports in `tests/common`
//
// ## Usage
//
// ```rust,ignore
// use ipseek_core::traits::EchoTransport;
// use std::time::Duration;
//
// let transport = /* EchoTransport implementation */;
// let response = transport
//     .fetch(&"https://api.ipify.org".into(), Duration::from_secs(5))
//     .await?;
// println!("{} -> {}", response.status, response.body);
// ```

use async_trait::async_trait;
use std::time::Duration;

use crate::endpoint::Endpoint;
use crate::error::ProbeFailure;

/// Raw response from an echo endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl EchoResponse {
    /// Create a new response
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// A `200 OK` response with the given body
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for echo transport implementations
///
/// A transport performs exactly one read-only request per call and reports
/// what came back. It does not interpret the body and does not retry.
///
/// Implementations must be safe for concurrent use: every probe of a race
/// calls `fetch` on the same shared instance at the same time.
#[async_trait]
pub trait EchoTransport: Send + Sync {
    /// Fetch the endpoint once
    ///
    /// `timeout` is a hint for the underlying client. The probe executor
    /// enforces it independently, so a transport that overruns it is still
    /// bounded.
    ///
    /// # Returns
    ///
    /// - `Ok(EchoResponse)`: A response was received, whatever its status
    /// - `Err(ProbeFailure)`: Transport-level failure (DNS, connect, TLS, read)
    async fn fetch(
        &self,
        endpoint: &Endpoint,
        timeout: Duration,
    ) -> Result<EchoResponse, ProbeFailure>;

    /// Short name used in log lines
    fn transport_name(&self) -> &'static str {
        "unknown"
    }
}
