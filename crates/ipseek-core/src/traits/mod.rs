//! Core traits for address discovery
//!
//! - [`EchoTransport`]: Fetch one response from an address-echo endpoint

pub mod transport;

pub use transport::{EchoResponse, EchoTransport};
