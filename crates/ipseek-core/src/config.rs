//! Configuration types for address discovery
//!
//! This module defines the resolver configuration and the address family
//! selector.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::endpoint::Endpoint;

/// Default per-probe timeout in milliseconds
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 15_000;

/// Default per-probe timeout
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS);

/// Upper bound accepted for `probe_timeout_ms` read from files or the
/// environment. Timeouts set in code are not capped.
pub const MAX_PROBE_TIMEOUT_MS: u64 = 300_000;

/// Public address resolver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Endpoints raced in addition to the built-in set
    #[serde(default)]
    pub extra_endpoints: Vec<Endpoint>,

    /// Per-probe timeout (in milliseconds)
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Whether the built-in endpoints take part in the race
    #[serde(default = "default_use_default_endpoints")]
    pub use_default_endpoints: bool,

    /// Abort losing probes once a winner is known
    #[serde(default)]
    pub cancel_losers: bool,
}

impl ResolverConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            extra_endpoints: Vec::new(),
            probe_timeout_ms: default_probe_timeout_ms(),
            use_default_endpoints: default_use_default_endpoints(),
            cancel_losers: false,
        }
    }

    /// Add endpoints to race alongside the defaults
    pub fn with_extra_endpoints(mut self, endpoints: impl IntoIterator<Item = Endpoint>) -> Self {
        self.extra_endpoints.extend(endpoints);
        self
    }

    /// Set the per-probe timeout
    ///
    /// Sub-millisecond remainders round up, so a non-zero timeout never
    /// becomes zero.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_nanos().div_ceil(1_000_000);
        self.probe_timeout_ms = u64::try_from(millis).unwrap_or(u64::MAX);
        self
    }

    /// Race only the extra endpoints
    pub fn without_default_endpoints(mut self) -> Self {
        self.use_default_endpoints = false;
        self
    }

    /// Abort or detach losing probes
    pub fn with_cancel_losers(mut self, cancel_losers: bool) -> Self {
        self.cancel_losers = cancel_losers;
        self
    }

    /// Per-probe timeout as a `Duration`
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Parse a configuration from JSON
    pub fn from_json_str(json: &str) -> Result<Self, crate::Error> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Validate a configuration read from a file or the environment
    ///
    /// Adds the `MAX_PROBE_TIMEOUT_MS` cap on top of [`Self::ensure_usable`].
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.ensure_usable()?;

        if self.probe_timeout_ms > MAX_PROBE_TIMEOUT_MS {
            return Err(crate::Error::config(format!(
                "Probe timeout must be at most {} ms. Got: {}",
                MAX_PROBE_TIMEOUT_MS, self.probe_timeout_ms
            )));
        }

        Ok(())
    }

    /// Checks a resolver needs before it can race
    ///
    /// The timeout must be non-zero and every extra endpoint well-formed.
    pub fn ensure_usable(&self) -> Result<(), crate::Error> {
        if self.probe_timeout_ms == 0 {
            return Err(crate::Error::config("Probe timeout must be > 0"));
        }

        for endpoint in &self.extra_endpoints {
            endpoint.validate()?;
        }

        Ok(())
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_probe_timeout_ms() -> u64 {
    DEFAULT_PROBE_TIMEOUT_MS
}

fn default_use_default_endpoints() -> bool {
    true
}

/// Address family selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpFamily {
    /// IPv4
    #[default]
    V4,
    /// IPv6
    V6,
}

impl IpFamily {
    /// Whether `addr` belongs to this family
    pub fn matches(&self, addr: &std::net::IpAddr) -> bool {
        match self {
            IpFamily::V4 => addr.is_ipv4(),
            IpFamily::V6 => addr.is_ipv6(),
        }
    }
}

impl TryFrom<u8> for IpFamily {
    type Error = crate::Error;

    fn try_from(version: u8) -> Result<Self, Self::Error> {
        match version {
            4 => Ok(IpFamily::V4),
            6 => Ok(IpFamily::V6),
            other => Err(crate::Error::invalid_argument(format!(
                "IP version must be 4 or 6. Got: {}",
                other
            ))),
        }
    }
}
