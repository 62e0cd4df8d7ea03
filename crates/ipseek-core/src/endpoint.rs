//! Probe endpoints and the built-in default set

use serde::{Deserialize, Serialize};
use std::fmt;

/// Built-in address-echo services
///
/// Each returns either a bare address literal or readable text that
/// contains one.
pub const DEFAULT_ENDPOINTS: &[&str] = &[
    "https://ipinfo.io/ip",
    "https://ip.cn",
    "http://icanhazip.com/",
    "http://ident.me/",
    "http://tnx.nl/ip",
    "http://ipecho.net/plain",
    "http://diagnostic.opendns.com/myip",
    "https://api.ipify.org",
];

/// One address-echo source
///
/// Endpoints are opaque to the race. Duplicates are allowed and simply race
/// against each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Endpoint(String);

impl Endpoint {
    /// Create a new endpoint
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// The endpoint URL
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check that the endpoint looks like something a transport can fetch
    pub fn validate(&self) -> Result<(), crate::Error> {
        let url = self.0.trim();
        if url.is_empty() {
            return Err(crate::Error::config("Endpoint URL cannot be empty"));
        }

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(crate::Error::config(format!(
                "Endpoint must use HTTP or HTTPS scheme. Got: {}",
                url
            )));
        }

        Ok(())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Endpoint {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for Endpoint {
    fn from(url: String) -> Self {
        Self(url)
    }
}

/// The built-in endpoints as owned values
pub fn default_endpoints() -> Vec<Endpoint> {
    DEFAULT_ENDPOINTS.iter().copied().map(Endpoint::from).collect()
}

/// Built-in endpoints followed by `extra`, in order
pub fn with_defaults(extra: &[Endpoint]) -> Vec<Endpoint> {
    let mut endpoints = default_endpoints();
    endpoints.extend_from_slice(extra);
    endpoints
}
