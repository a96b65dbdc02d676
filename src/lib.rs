#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::unsafe_derive_deserialize)]
#![allow(clippy::module_name_repetitions)]

use anyhow::Result;

mod app;
mod cli;
pub mod batch;
pub mod config;
pub mod export;
pub mod output;
pub mod providers;
pub mod report;
pub mod validate;

/// Entry point of the `ipcheck` binary: single-IP reputation lookup.
///
/// # Errors
///
/// Returns an error when the HTTP client cannot be built or no API key is
/// available; API-level lookup failures are reported without failing.
pub async fn run_ipcheck() -> Result<()> {
  app::IpApp::new()?.run().await
}

/// Entry point of the `whois-analyzer` binary: single or batch WHOIS
/// analysis with optional report export.
///
/// # Errors
///
/// Returns an error for invalid domains, unreadable input files, engine
/// misuse, or export failures.
pub async fn run_whois_analyzer() -> Result<()> {
  app::WhoisApp::new().run().await
}
