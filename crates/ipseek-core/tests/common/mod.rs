//! Test doubles and common utilities for race contract tests
//!
//! The scripted transport answers each endpoint with a fixed reply after a
//! fixed delay and records which fetches started and which ran to the end.

#![allow(dead_code)]

use ipseek_core::{EchoResponse, EchoTransport, Endpoint, ProbeExecutor, ProbeFailure, Racer};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What a scripted endpoint does once its delay has elapsed
#[derive(Debug, Clone)]
pub enum Reply {
    /// `200 OK` with the given body
    Body(&'static str),
    /// Arbitrary status and body
    Status(u16, &'static str),
    /// Transport-level failure
    TransportError,
    /// The fetch panics
    Panic,
}

#[derive(Debug, Clone)]
struct Script {
    delay: Duration,
    reply: Reply,
}

/// A transport whose behavior is fixed per endpoint
///
/// Endpoints without a script fail with a transport error.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: HashMap<String, Script>,
    started: AtomicUsize,
    finished: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script an endpoint
    pub fn on(mut self, endpoint: &str, delay_ms: u64, reply: Reply) -> Self {
        self.scripts.insert(
            endpoint.to_string(),
            Script {
                delay: Duration::from_millis(delay_ms),
                reply,
            },
        );
        self
    }

    /// Number of fetches that were started
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Endpoints whose fetch ran past its delay, in completion order
    pub fn finished(&self) -> Vec<String> {
        self.finished.lock().unwrap().clone()
    }

    /// Whether the fetch for `endpoint` ran to the end
    pub fn has_finished(&self, endpoint: &str) -> bool {
        self.finished().iter().any(|e| e == endpoint)
    }
}

#[async_trait::async_trait]
impl EchoTransport for ScriptedTransport {
    async fn fetch(
        &self,
        endpoint: &Endpoint,
        _timeout: Duration,
    ) -> Result<EchoResponse, ProbeFailure> {
        self.started.fetch_add(1, Ordering::SeqCst);

        let Some(script) = self.scripts.get(endpoint.as_str()).cloned() else {
            return Err(ProbeFailure::transport("no route to host"));
        };

        tokio::time::sleep(script.delay).await;
        self.finished
            .lock()
            .unwrap()
            .push(endpoint.as_str().to_string());

        match script.reply {
            Reply::Body(body) => Ok(EchoResponse::ok(body)),
            Reply::Status(status, body) => Ok(EchoResponse::new(status, body)),
            Reply::TransportError => Err(ProbeFailure::transport("connection reset")),
            Reply::Panic => panic!("scripted panic for {}", endpoint),
        }
    }

    fn transport_name(&self) -> &'static str {
        "scripted"
    }
}

/// Build a racer over a shared scripted transport
pub fn racer(transport: &Arc<ScriptedTransport>, timeout_ms: u64) -> Racer {
    let transport: Arc<dyn EchoTransport> = transport.clone();
    Racer::new(ProbeExecutor::new(
        transport,
        Duration::from_millis(timeout_ms),
    ))
}

/// Endpoints from plain names
pub fn endpoints(names: &[&str]) -> Vec<Endpoint> {
    names.iter().copied().map(Endpoint::from).collect()
}

/// Parse an address literal
pub fn addr(s: &str) -> IpAddr {
    s.parse().expect("valid address literal")
}
