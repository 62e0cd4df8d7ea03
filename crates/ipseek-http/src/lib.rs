// # HTTP Echo Transport
//
// This crate provides the reqwest-based transport used to probe
// address-echo services, plus the one-call `resolve_public_address` entry
// point.
//
// ## Connection Reuse
//
// Clients are cached per endpoint in a process-wide map so repeated
// resolutions reuse pooled connections. The cache has no teardown; entries
// live for the life of the process.
//
// ## Timeouts
//
// Each request carries the probe timeout. The core probe executor enforces
// the same bound on its side, so a stuck connection never outlives it.

use ipseek_core::{
    EchoResponse, EchoTransport, Endpoint, Error, ProbeFailure, PublicAddressResolver,
    ResolverConfig, Result,
};

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use once_cell::sync::Lazy;

/// User agent sent with every probe
const USER_AGENT: &str = concat!("ipseek/", env!("CARGO_PKG_VERSION"));

/// Connect timeout for new connections
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Process-wide transport shared by `resolve_public_address`
static SHARED_TRANSPORT: Lazy<Arc<HttpTransport>> = Lazy::new(|| Arc::new(HttpTransport::new()));

/// HTTP transport with a per-endpoint client cache
#[derive(Default)]
pub struct HttpTransport {
    clients: RwLock<HashMap<String, reqwest::Client>>,
}

impl HttpTransport {
    /// Create a transport with an empty client cache
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide transport
    pub fn shared() -> Arc<HttpTransport> {
        Arc::clone(&SHARED_TRANSPORT)
    }

    /// Number of cached clients
    pub fn cached_clients(&self) -> usize {
        self.clients
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Get the cached client for `endpoint`, building one on first use
    fn client_for(&self, endpoint: &Endpoint) -> std::result::Result<reqwest::Client, ProbeFailure> {
        if let Some(client) = self
            .clients
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(endpoint.as_str())
        {
            return Ok(client.clone());
        }

        let mut clients = self
            .clients
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Another probe for the same endpoint may have won the write lock
        if let Some(client) = clients.get(endpoint.as_str()) {
            return Ok(client.clone());
        }

        let client = build_client()
            .map_err(|e| ProbeFailure::transport(format!("Failed to build client: {}", e)))?;
        tracing::debug!("Caching HTTP client for {}", endpoint);
        clients.insert(endpoint.as_str().to_string(), client.clone());
        Ok(client)
    }
}

fn build_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
}

#[async_trait::async_trait]
impl EchoTransport for HttpTransport {
    async fn fetch(
        &self,
        endpoint: &Endpoint,
        timeout: Duration,
    ) -> std::result::Result<EchoResponse, ProbeFailure> {
        let client = self.client_for(endpoint)?;

        let response = client
            .get(endpoint.as_str())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ProbeFailure::transport(format!("Request failed: {}", e)))?;

        let status = response.status().as_u16();

        let body = response
            .text()
            .await
            .map_err(|e| ProbeFailure::transport(format!("Failed to read response: {}", e)))?;

        Ok(EchoResponse { status, body })
    }

    fn transport_name(&self) -> &'static str {
        "http"
    }
}

/// Build a resolver over the shared HTTP transport
pub fn resolver(config: ResolverConfig) -> Result<PublicAddressResolver> {
    PublicAddressResolver::new(HttpTransport::shared(), config)
}

/// Build the resolver `resolve_public_address` races with
///
/// Built-in endpoints come first, then `extra_endpoints` in order.
pub fn public_resolver(
    extra_endpoints: &[Endpoint],
    probe_timeout: Duration,
) -> Result<PublicAddressResolver> {
    let config = ResolverConfig::new()
        .with_extra_endpoints(extra_endpoints.iter().cloned())
        .with_probe_timeout(probe_timeout);

    resolver(config)
}

/// Resolve the public address
///
/// Races the built-in endpoints plus `extra_endpoints`, each bounded by
/// `probe_timeout`.
///
/// # Returns
///
/// - `Ok(IpAddr)`: First address any endpoint reported
/// - `Err(Error::NoAddressFound)`: Every endpoint failed
/// - `Err(Error::Config)`: An extra endpoint is malformed or the timeout is zero
pub async fn resolve_public_address(
    extra_endpoints: &[Endpoint],
    probe_timeout: Duration,
) -> Result<IpAddr> {
    public_resolver(extra_endpoints, probe_timeout)?
        .resolve()
        .await
}

/// Check that an HTTP client can be built in this environment
///
/// TLS backends can fail to initialize (missing roots, sandboxing); callers
/// that want to fail fast can check this before racing.
pub fn check_client() -> Result<()> {
    build_client()
        .map(|_| ())
        .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))
}
