//! Racing aggregator
//!
//! Launches one probe per endpoint, all at once, and returns the first
//! success by completion time.
//!
//! ## Architecture
//!
//! ```text
//!   endpoints ──┬── probe(A) ──┐
//!               ├── probe(B) ──┼── JoinSet::join_next_with_id ──► RaceSession ──► winner
//!               └── probe(C) ──┘   (completion order, id → endpoint)     │
//!                                                                        └──► NoAddressFound
//! ```
//!
//! ## Termination
//!
//! 1. First `Success` observed: commit it as the winner and return at once.
//!    Remaining probes are detached (or aborted, see [`RacePolicy`]) and
//!    never awaited.
//! 2. Every probe completed with `Failure`: return `NoAddressFound`, and only
//!    once the last one has completed.
//!
//! The session is owned by the single task draining the join set, so the
//! completion counter and the winner need no locking and the winner can be
//! committed at most once.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{Id, JoinError, JoinSet};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::endpoint::Endpoint;
use crate::error::{Error, ProbeFailure, Result};
use crate::probe::{ProbeExecutor, ProbeOutcome};

/// Lifecycle of one race
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceState {
    /// Created, no probes launched yet
    Pending,
    /// Probes launched, collecting outcomes
    Racing,
    /// A probe succeeded; terminal
    WinnerFound(IpAddr),
    /// Every probe failed; terminal
    Exhausted,
}

impl RaceState {
    /// Whether the race is over
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::WinnerFound(_) | Self::Exhausted)
    }
}

/// Completion tracking for one race
///
/// Exactly one of {winner set, all probes failed} holds once the session is
/// terminal. Outcomes recorded after that are ignored.
#[derive(Debug)]
pub struct RaceSession {
    launched: usize,
    completed: usize,
    state: RaceState,
}

impl RaceSession {
    /// Create a session for `launched` probes
    pub fn new(launched: usize) -> Self {
        Self {
            launched,
            completed: 0,
            state: RaceState::Pending,
        }
    }

    /// Move out of `Pending`
    ///
    /// A session with no probes is exhausted immediately.
    pub fn start(&mut self) -> RaceState {
        if self.state == RaceState::Pending {
            self.state = if self.launched == 0 {
                RaceState::Exhausted
            } else {
                RaceState::Racing
            };
        }
        self.state
    }

    /// Record the completion of one probe
    pub fn record(&mut self, outcome: &ProbeOutcome) -> RaceState {
        if self.state != RaceState::Racing {
            return self.state;
        }

        self.completed += 1;

        if let ProbeOutcome::Success(addr) = outcome {
            self.state = RaceState::WinnerFound(*addr);
        } else if self.completed >= self.launched {
            self.state = RaceState::Exhausted;
        }

        self.state
    }

    /// Current state
    pub fn state(&self) -> RaceState {
        self.state
    }

    /// Number of probes launched
    pub fn launched(&self) -> usize {
        self.launched
    }

    /// Number of probes whose outcome has been recorded
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// The committed winner, if any
    pub fn winner(&self) -> Option<IpAddr> {
        match self.state {
            RaceState::WinnerFound(addr) => Some(addr),
            _ => None,
        }
    }
}

/// What happens to losing probes once a winner is committed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RacePolicy {
    /// Abort outstanding probes instead of letting them run to completion
    pub cancel_losers: bool,
}

/// Details of a won race
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceWinner {
    /// The winning address
    pub address: IpAddr,
    /// Endpoint that reported it
    pub endpoint: Endpoint,
    /// Time from launch to the winning completion
    pub elapsed: Duration,
}

/// The racing aggregator
///
/// # Example
///
/// ```rust,ignore
/// let executor = ProbeExecutor::new(transport, Duration::from_secs(15));
/// let racer = Racer::new(executor);
/// let address = racer.race(&endpoints).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Racer {
    executor: Arc<ProbeExecutor>,
    policy: RacePolicy,
}

impl Racer {
    /// Create a racer with the default policy
    pub fn new(executor: ProbeExecutor) -> Self {
        Self {
            executor: Arc::new(executor),
            policy: RacePolicy::default(),
        }
    }

    /// Set the loser policy
    pub fn with_policy(mut self, policy: RacePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The probe executor shared by every probe
    pub fn executor(&self) -> &ProbeExecutor {
        &self.executor
    }

    /// Race all endpoints and return the winning address
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: First address reported by any endpoint
    /// - `Err(Error::NoAddressFound)`: Every probe failed, or `endpoints` is empty
    pub async fn race(&self, endpoints: &[Endpoint]) -> Result<IpAddr> {
        self.race_detailed(endpoints)
            .await
            .map(|winner| winner.address)
    }

    /// Race all endpoints and return the winner with its source
    pub async fn race_detailed(&self, endpoints: &[Endpoint]) -> Result<RaceWinner> {
        let mut session = RaceSession::new(endpoints.len());
        if session.start() == RaceState::Exhausted {
            debug!("No endpoints to race");
            return Err(Error::no_address_found(0));
        }

        info!(
            "Racing {} endpoint(s) via {} (timeout={:?})",
            endpoints.len(),
            self.executor.transport_name(),
            self.executor.timeout()
        );

        let started = Instant::now();
        let mut probes = JoinSet::new();
        let mut in_flight = HashMap::with_capacity(endpoints.len());
        for endpoint in endpoints.iter().cloned() {
            let executor = Arc::clone(&self.executor);
            let probe = endpoint.clone();
            let handle = probes.spawn(async move { executor.execute(&probe).await });
            in_flight.insert(handle.id(), endpoint);
        }

        while let Some(joined) = probes.join_next_with_id().await {
            let Some((endpoint, outcome)) = settle(&mut in_flight, joined) else {
                continue;
            };

            match session.record(&outcome) {
                RaceState::WinnerFound(address) => {
                    let elapsed = started.elapsed();
                    info!(
                        "Address {} won via {} after {:?} ({}/{} probes completed)",
                        address,
                        endpoint,
                        elapsed,
                        session.completed(),
                        session.launched()
                    );
                    self.release_losers(probes);
                    return Ok(RaceWinner {
                        address,
                        endpoint,
                        elapsed,
                    });
                }
                RaceState::Exhausted => break,
                RaceState::Pending | RaceState::Racing => {}
            }
        }

        warn!(
            "All {} probe(s) failed after {:?}",
            session.launched(),
            started.elapsed()
        );
        Err(Error::no_address_found(session.launched()))
    }

    fn release_losers(&self, mut probes: JoinSet<ProbeOutcome>) {
        if probes.is_empty() {
            return;
        }

        if self.policy.cancel_losers {
            debug!("Aborting {} losing probe(s)", probes.len());
            probes.abort_all();
        } else {
            debug!("Detaching {} losing probe(s)", probes.len());
            probes.detach_all();
        }
    }
}

/// Pair a finished probe task with the endpoint it was launched for
///
/// A task that panicked or was cancelled becomes an `Aborted` failure for
/// its own endpoint. Returns `None` only for an id this race never spawned.
fn settle(
    in_flight: &mut HashMap<Id, Endpoint>,
    joined: std::result::Result<(Id, ProbeOutcome), JoinError>,
) -> Option<(Endpoint, ProbeOutcome)> {
    match joined {
        Ok((id, outcome)) => in_flight.remove(&id).map(|endpoint| (endpoint, outcome)),
        Err(e) => {
            let endpoint = in_flight.remove(&e.id())?;
            warn!("Probe task for {} did not complete: {}", endpoint, e);
            let failure = ProbeFailure::Aborted(e.to_string());
            Some((endpoint, ProbeOutcome::Failure(failure)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success(s: &str) -> ProbeOutcome {
        ProbeOutcome::Success(s.parse().unwrap())
    }

    fn failure() -> ProbeOutcome {
        ProbeOutcome::Failure(ProbeFailure::EmptyBody)
    }

    #[test]
    fn test_empty_session_is_exhausted_on_start() {
        let mut session = RaceSession::new(0);
        assert_eq!(session.state(), RaceState::Pending);
        assert_eq!(session.start(), RaceState::Exhausted);
        assert!(session.state().is_terminal());
    }

    #[test]
    fn test_outcomes_ignored_before_start() {
        let mut session = RaceSession::new(2);
        assert_eq!(session.record(&success("192.0.2.1")), RaceState::Pending);
        assert_eq!(session.completed(), 0);
    }

    #[test]
    fn test_first_success_wins_and_is_immutable() {
        let mut session = RaceSession::new(3);
        session.start();

        assert_eq!(session.record(&failure()), RaceState::Racing);
        let first = session.record(&success("192.0.2.1"));
        assert_eq!(first, RaceState::WinnerFound("192.0.2.1".parse().unwrap()));

        // Late arrivals change nothing
        assert_eq!(session.record(&success("192.0.2.2")), first);
        assert_eq!(session.winner(), Some("192.0.2.1".parse().unwrap()));
        assert_eq!(session.completed(), 2);
    }

    #[test]
    fn test_exhausted_only_after_last_failure() {
        let mut session = RaceSession::new(3);
        session.start();

        assert_eq!(session.record(&failure()), RaceState::Racing);
        assert_eq!(session.record(&failure()), RaceState::Racing);
        assert_eq!(session.record(&failure()), RaceState::Exhausted);
        assert_eq!(session.winner(), None);
        assert_eq!(session.completed(), 3);
    }

    #[test]
    fn test_success_on_last_completion_wins() {
        let mut session = RaceSession::new(2);
        session.start();

        session.record(&failure());
        assert_eq!(
            session.record(&success("192.0.2.9")),
            RaceState::WinnerFound("192.0.2.9".parse().unwrap())
        );
    }

    async fn explode() -> ProbeOutcome {
        panic!("transport bug")
    }

    #[tokio::test]
    async fn test_panicked_task_is_attributed_to_its_endpoint() {
        let mut tasks: JoinSet<ProbeOutcome> = JoinSet::new();
        let mut in_flight = HashMap::new();

        let steady = tasks.spawn(async { failure() });
        in_flight.insert(steady.id(), Endpoint::from("http://steady.test/"));
        let broken = tasks.spawn(explode());
        in_flight.insert(broken.id(), Endpoint::from("http://broken.test/"));

        let mut settled = Vec::new();
        while let Some(joined) = tasks.join_next_with_id().await {
            settled.extend(settle(&mut in_flight, joined));
        }

        let (endpoint, outcome) = settled
            .iter()
            .find(|(_, outcome)| matches!(outcome, ProbeOutcome::Failure(ProbeFailure::Aborted(_))))
            .expect("panicked task is settled");
        assert_eq!(endpoint.as_str(), "http://broken.test/");
        assert!(!outcome.is_success());
        assert_eq!(settled.len(), 2);
        assert!(in_flight.is_empty());
    }

    #[test]
    fn test_default_policy_keeps_losers_running() {
        assert!(!RacePolicy::default().cancel_losers);
    }
}
