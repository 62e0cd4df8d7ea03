// # ipseek-core
//
// Core library for discovering a host's public network address.
//
// ## Architecture Overview
//
// - **EchoTransport**: Trait for fetching one response from an echo endpoint
// - **ProbeExecutor**: One endpoint + timeout → one `ProbeOutcome`
// - **Racer**: Runs every probe concurrently, first success wins
// - **PublicAddressResolver**: Config + default endpoints + racer
//
// ## Design Principles
//
// 1. **Failure Isolation**: A failing probe never affects the others
// 2. **Early Termination**: The caller gets the first success, not the slowest
// 3. **Bounded Wait**: Every probe resolves within its timeout
// 4. **Plugin-Based Transports**: HTTP lives in `ipseek-http`, not here

pub mod config;
pub mod endpoint;
pub mod error;
pub mod extract;
pub mod probe;
pub mod race;
pub mod resolver;
pub mod traits;

// Re-export core types for convenience
pub use config::{DEFAULT_PROBE_TIMEOUT, IpFamily, ResolverConfig};
pub use endpoint::{DEFAULT_ENDPOINTS, Endpoint};
pub use error::{Error, ProbeFailure, Result};
pub use probe::{ProbeExecutor, ProbeOutcome};
pub use race::{RacePolicy, RaceSession, RaceState, RaceWinner, Racer};
pub use resolver::PublicAddressResolver;
pub use traits::{EchoResponse, EchoTransport};
