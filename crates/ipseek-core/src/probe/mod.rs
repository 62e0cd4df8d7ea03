//! Probe executor
//!
//! Turns one (endpoint, timeout) pair into exactly one [`ProbeOutcome`].
//!
//! A probe succeeds only when all of these hold:
//! 1. The transport returned a response before the timeout
//! 2. The status is 2xx
//! 3. The body is not blank
//! 4. The body contains an address literal
//!
//! Anything else is a [`ProbeFailure`]; nothing partial is ever reported as
//! a success.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::endpoint::Endpoint;
use crate::error::ProbeFailure;
use crate::extract::extract_address;
use crate::traits::EchoTransport;

/// Result of a single probe, produced exactly once per probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The endpoint reported this address
    Success(IpAddr),
    /// The probe failed; the reason is only used for logging
    Failure(ProbeFailure),
}

impl ProbeOutcome {
    /// Whether this outcome carries an address
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The address, if any
    pub fn address(&self) -> Option<IpAddr> {
        match self {
            Self::Success(addr) => Some(*addr),
            Self::Failure(_) => None,
        }
    }
}

impl From<Result<IpAddr, ProbeFailure>> for ProbeOutcome {
    fn from(result: Result<IpAddr, ProbeFailure>) -> Self {
        match result {
            Ok(addr) => Self::Success(addr),
            Err(failure) => Self::Failure(failure),
        }
    }
}

/// Runs single probes against a shared transport
///
/// Stateless apart from the transport handle; cloning is cheap and every
/// clone may probe concurrently.
#[derive(Clone)]
pub struct ProbeExecutor {
    transport: Arc<dyn EchoTransport>,
    timeout: Duration,
}

impl ProbeExecutor {
    /// Create a new executor
    ///
    /// # Parameters
    ///
    /// - `transport`: Shared transport used for every probe
    /// - `timeout`: Per-probe deadline
    pub fn new(transport: Arc<dyn EchoTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Per-probe deadline
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Name of the underlying transport
    pub fn transport_name(&self) -> &'static str {
        self.transport.transport_name()
    }

    /// Probe one endpoint
    ///
    /// Resolves within the timeout plus scheduling overhead, even when the
    /// transport itself never returns.
    pub async fn execute(&self, endpoint: &Endpoint) -> ProbeOutcome {
        let outcome: ProbeOutcome = self.try_execute(endpoint).await.into();

        match &outcome {
            ProbeOutcome::Success(addr) => debug!("Probe {} reported {}", endpoint, addr),
            ProbeOutcome::Failure(reason) => debug!("Probe {} failed: {}", endpoint, reason),
        }

        outcome
    }

    async fn try_execute(&self, endpoint: &Endpoint) -> Result<IpAddr, ProbeFailure> {
        let fetch = self.transport.fetch(endpoint, self.timeout);
        let response = tokio::time::timeout(self.timeout, fetch)
            .await
            .map_err(|_| ProbeFailure::Timeout(self.timeout))??;

        if !response.is_success() {
            return Err(ProbeFailure::Status(response.status));
        }

        let body = response.body.trim();
        if body.is_empty() {
            return Err(ProbeFailure::EmptyBody);
        }

        extract_address(body).ok_or(ProbeFailure::NoAddressLiteral)
    }
}

impl std::fmt::Debug for ProbeExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeExecutor")
            .field("transport", &self.transport.transport_name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::EchoResponse;
    use async_trait::async_trait;

    /// Replies with a fixed result after an optional delay
    struct FixedTransport {
        delay: Duration,
        reply: Result<EchoResponse, ProbeFailure>,
    }

    impl FixedTransport {
        fn replying(reply: Result<EchoResponse, ProbeFailure>) -> Arc<Self> {
            Arc::new(Self {
                delay: Duration::ZERO,
                reply,
            })
        }
    }

    #[async_trait]
    impl EchoTransport for FixedTransport {
        async fn fetch(
            &self,
            _endpoint: &Endpoint,
            _timeout: Duration,
        ) -> Result<EchoResponse, ProbeFailure> {
            tokio::time::sleep(self.delay).await;
            self.reply.clone()
        }

        fn transport_name(&self) -> &'static str {
            "fixed"
        }
    }

    async fn probe(transport: Arc<FixedTransport>) -> ProbeOutcome {
        ProbeExecutor::new(transport, Duration::from_secs(1))
            .execute(&Endpoint::from("http://echo.test/"))
            .await
    }

    #[tokio::test]
    async fn test_success_extracts_address() {
        let outcome = probe(FixedTransport::replying(Ok(EchoResponse::ok("203.0.113.5\n")))).await;
        assert_eq!(outcome, ProbeOutcome::Success("203.0.113.5".parse().unwrap()));
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_non_success_status_fails() {
        let outcome =
            probe(FixedTransport::replying(Ok(EchoResponse::new(503, "203.0.113.5")))).await;
        assert_eq!(outcome, ProbeOutcome::Failure(ProbeFailure::Status(503)));
    }

    #[tokio::test]
    async fn test_blank_body_fails() {
        let outcome = probe(FixedTransport::replying(Ok(EchoResponse::ok(" \n")))).await;
        assert_eq!(outcome, ProbeOutcome::Failure(ProbeFailure::EmptyBody));
    }

    #[tokio::test]
    async fn test_body_without_address_fails() {
        let outcome = probe(FixedTransport::replying(Ok(EchoResponse::ok("try later")))).await;
        assert_eq!(outcome, ProbeOutcome::Failure(ProbeFailure::NoAddressLiteral));
        assert_eq!(outcome.address(), None);
    }

    #[tokio::test]
    async fn test_transport_error_fails() {
        let failure = ProbeFailure::transport("connection refused");
        let outcome = probe(FixedTransport::replying(Err(failure.clone()))).await;
        assert_eq!(outcome, ProbeOutcome::Failure(failure));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_transport_times_out() {
        let transport = Arc::new(FixedTransport {
            delay: Duration::from_secs(3600),
            reply: Ok(EchoResponse::ok("203.0.113.5")),
        });
        let executor = ProbeExecutor::new(transport, Duration::from_millis(250));

        let started = tokio::time::Instant::now();
        let outcome = executor.execute(&Endpoint::from("http://slow.test/")).await;

        assert_eq!(
            outcome,
            ProbeOutcome::Failure(ProbeFailure::Timeout(Duration::from_millis(250)))
        );
        assert!(started.elapsed() < Duration::from_millis(300));
    }

    #[test]
    fn test_debug_names_transport() {
        let executor = ProbeExecutor::new(
            FixedTransport::replying(Ok(EchoResponse::ok(""))),
            Duration::from_secs(2),
        );
        let debug = format!("{:?}", executor);
        assert!(debug.contains("fixed"));
        assert_eq!(executor.timeout(), Duration::from_secs(2));
    }
}
