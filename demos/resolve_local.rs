//! Local interface address lookup
//!
//! Prints the first non-loopback address of the family selected by
//! `IPSEEK_IP_VERSION` (4 or 6, default 4).

use ipseek_core::Error;
use std::process::ExitCode;
use tracing::{Level, error};
use tracing_subscriber::FmtSubscriber;

fn main() -> ExitCode {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ExitCode::from(1);
    }

    let version = match std::env::var("IPSEEK_IP_VERSION") {
        Ok(v) => match v.trim().parse::<u8>() {
            Ok(version) => version,
            Err(_) => {
                error!("IPSEEK_IP_VERSION must be 4 or 6. Got: {}", v);
                return ExitCode::from(1);
            }
        },
        Err(_) => 4,
    };

    match ipseek_local::resolve_local_address_for(version) {
        Ok(ip) => {
            println!("{}", ip);
            ExitCode::SUCCESS
        }
        Err(e @ Error::InvalidArgument(_)) => {
            error!("{}", e);
            ExitCode::from(1)
        }
        Err(e) => {
            error!("Local lookup failed: {}", e);
            ExitCode::from(2)
        }
    }
}
