//! Public address resolver
//!
//! Glues configuration, endpoint merging and the racer together. Transports
//! plug in from their own crates.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ResolverConfig;
use crate::endpoint::{self, Endpoint};
use crate::error::Result;
use crate::probe::ProbeExecutor;
use crate::race::{RacePolicy, RaceWinner, Racer};
use crate::traits::EchoTransport;

/// Resolves the host's public address by racing echo endpoints
#[derive(Debug, Clone)]
pub struct PublicAddressResolver {
    racer: Racer,
    endpoints: Vec<Endpoint>,
}

impl PublicAddressResolver {
    /// Create a new resolver
    ///
    /// # Parameters
    ///
    /// - `transport`: Transport shared by every probe
    /// - `config`: Resolver configuration. Only [`ResolverConfig::ensure_usable`]
    ///   is applied here; the timeout cap belongs to file and env loading.
    pub fn new(transport: Arc<dyn EchoTransport>, config: ResolverConfig) -> Result<Self> {
        config.ensure_usable()?;

        let endpoints = if config.use_default_endpoints {
            endpoint::with_defaults(&config.extra_endpoints)
        } else {
            config.extra_endpoints.clone()
        };

        let executor = ProbeExecutor::new(transport, config.probe_timeout());
        let racer = Racer::new(executor).with_policy(RacePolicy {
            cancel_losers: config.cancel_losers,
        });

        Ok(Self { racer, endpoints })
    }

    /// Per-probe deadline
    pub fn probe_timeout(&self) -> Duration {
        self.racer.executor().timeout()
    }

    /// Endpoints raced on every call, in launch order
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Resolve the public address
    ///
    /// Fails with `Error::NoAddressFound` when every endpoint fails.
    pub async fn resolve(&self) -> Result<IpAddr> {
        self.racer.race(&self.endpoints).await
    }

    /// Resolve the public address and report which endpoint won
    pub async fn resolve_detailed(&self) -> Result<RaceWinner> {
        self.racer.race_detailed(&self.endpoints).await
    }
}
