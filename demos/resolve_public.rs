//! Public address lookup, configured from the environment
//!
//! Demonstrates embedding ipseek in an application: configuration is read
//! from environment variables, logging goes through `tracing`, and the
//! outcome maps to a process exit code.
//!
//! ## Configuration
//!
//! - `IPSEEK_CONFIG`: Optional JSON config file (env vars below override it)
//! - `IPSEEK_EXTRA_ENDPOINTS`: Comma-separated extra echo endpoints
//! - `IPSEEK_PROBE_TIMEOUT_MS`: Per-probe timeout in milliseconds
//! - `IPSEEK_NO_DEFAULTS`: Race only the extra endpoints (`true`/`false`)
//! - `IPSEEK_CANCEL_LOSERS`: Abort losing probes (`true`/`false`)
//! - `IPSEEK_LOG_LEVEL`: trace, debug, info, warn, error
//!
//! ## Example
//!
//! ```bash
//! export IPSEEK_EXTRA_ENDPOINTS=https://echo.internal/ip
//! export IPSEEK_PROBE_TIMEOUT_MS=5000
//! resolve_public
//! ```

use anyhow::{Context, Result};
use ipseek_core::{Endpoint, ResolverConfig};
use std::env;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for the possible outcomes
#[derive(Debug, Clone, Copy)]
enum DemoExitCode {
    /// Address printed
    Found = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected)
    RuntimeError = 2,
    /// Every endpoint failed
    NoAddress = 3,
}

impl From<DemoExitCode> for ExitCode {
    fn from(code: DemoExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Settings read from the environment
struct Settings {
    resolver: ResolverConfig,
    log_level: Level,
}

impl Settings {
    /// Load settings from environment variables
    fn from_env() -> Result<Self> {
        let mut resolver = match env::var("IPSEEK_CONFIG") {
            Ok(path) => ResolverConfig::from_file(&path)
                .with_context(|| format!("Failed to load IPSEEK_CONFIG from {}", path))?,
            Err(_) => ResolverConfig::new(),
        };

        if let Ok(extra) = env::var("IPSEEK_EXTRA_ENDPOINTS") {
            resolver = resolver.with_extra_endpoints(
                extra
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(Endpoint::from),
            );
        }

        if let Ok(timeout) = env::var("IPSEEK_PROBE_TIMEOUT_MS") {
            let millis: u64 = timeout
                .parse()
                .with_context(|| format!("IPSEEK_PROBE_TIMEOUT_MS is not a number: {}", timeout))?;
            resolver = resolver.with_probe_timeout(Duration::from_millis(millis));
        }

        if parse_flag("IPSEEK_NO_DEFAULTS")? {
            resolver = resolver.without_default_endpoints();
        }

        if env::var("IPSEEK_CANCEL_LOSERS").is_ok() {
            resolver = resolver.with_cancel_losers(parse_flag("IPSEEK_CANCEL_LOSERS")?);
        }

        resolver
            .validate()
            .context("Resolver configuration is invalid")?;

        Ok(Self {
            resolver,
            log_level: parse_log_level()?,
        })
    }
}

/// Read a boolean flag; unset means false
fn parse_flag(name: &str) -> Result<bool> {
    match env::var(name) {
        Ok(value) => match value.to_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" | "" => Ok(false),
            other => anyhow::bail!("{} must be true or false. Got: {}", name, other),
        },
        Err(_) => Ok(false),
    }
}

fn parse_log_level() -> Result<Level> {
    let level = env::var("IPSEEK_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "IPSEEK_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DemoExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(settings.log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DemoExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DemoExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run(settings.resolver)).into()
}

async fn run(config: ResolverConfig) -> DemoExitCode {
    if let Err(e) = ipseek_http::check_client() {
        error!("{}", e);
        return DemoExitCode::ConfigError;
    }

    let resolver = match ipseek_http::resolver(config) {
        Ok(resolver) => resolver,
        Err(e) => {
            error!("Failed to build resolver: {}", e);
            return DemoExitCode::ConfigError;
        }
    };

    info!("Racing {} endpoint(s)", resolver.endpoints().len());

    match resolver.resolve_detailed().await {
        Ok(winner) => {
            info!("Resolved via {} in {:?}", winner.endpoint, winner.elapsed);
            println!("{}", winner.address);
            DemoExitCode::Found
        }
        Err(e) if e.is_no_address_found() => {
            warn!("{}", e);
            DemoExitCode::NoAddress
        }
        Err(e) => {
            error!("Resolution failed: {}", e);
            DemoExitCode::RuntimeError
        }
    }
}
