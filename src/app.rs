use std::env;
use std::net::IpAddr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use console::style;
use indicatif::ProgressBar;
use reqwest::Client;
use tracing::{error, info};

use crate::batch::{self, BatchOptions};
use crate::cli::{ExportFormat, IpCli, WhoisCli, WhoisCommand};
use crate::config;
use crate::export;
use crate::output;
use crate::providers::{vt, whois};
use crate::report::DomainReport;
use crate::validate;

fn spinner(message: String) -> ProgressBar {
  let pb = ProgressBar::new_spinner().with_message(message);
  pb.enable_steady_tick(Duration::from_millis(100));
  pb
}

pub struct IpApp {
  cli: IpCli,
  client: Client,
  api_key: Option<String>,
}

impl IpApp {
  /// Parses the command line and resolves the API key (flag, then
  /// `VT_API_KEY`, then the saved user config).
  ///
  /// # Errors
  ///
  /// Fails when the HTTP client cannot be built.
  pub fn new() -> Result<Self> {
    let cli = IpCli::parse();
    let client = Client::builder()
      .user_agent(format!("domintel/{}", env!("CARGO_PKG_VERSION")))
      .build()?;

    let api_key = cli
      .api_key
      .clone()
      .or_else(|| env::var("VT_API_KEY").ok().filter(|key| !key.is_empty()))
      .or_else(|| config::load().vt_api_key);

    Ok(Self {
      cli,
      client,
      api_key,
    })
  }

  /// Runs the reputation lookup. API-level conditions (not found, quota,
  /// transport failures) are reported but non-fatal; only a missing API
  /// key is an error.
  pub async fn run(&self) -> Result<()> {
    if self.cli.ip.parse::<IpAddr>().is_err() {
      eprintln!(
        "{}",
        style(format!("Invalid IP address: {}", self.cli.ip)).red()
      );
      return Ok(());
    }

    let Some(api_key) = self.api_key.as_deref() else {
      bail!(
        "API key is required. Pass --api-key, set VT_API_KEY, or save one \
with --save-key."
      );
    };

    if self.cli.save_key {
      config::store(&config::UserConfig {
        vt_api_key: Some(api_key.to_string()),
      })
      .context("Failed to persist the API key")?;
      info!("API key saved to the user config");
    }

    let pb = (!self.cli.quiet)
      .then(|| spinner(format!("Querying VirusTotal for {}...", self.cli.ip)));
    let outcome = vt::fetch_ip_report(&self.cli.ip, api_key, &self.client).await;
    if let Some(pb) = pb {
      pb.finish_and_clear();
    }

    match outcome {
      Ok(vt::Outcome::Report(report)) => {
        if !self.cli.quiet {
          output::print_ip_report(&self.cli.ip, &report.attributes);
        }
        if let Some(path) = &self.cli.output {
          self.save_report(&report.raw, path);
        }
      }
      Ok(vt::Outcome::NotFound) => {
        println!(
          "{}",
          style(format!(
            "IP address {} not found in the VirusTotal database.",
            self.cli.ip
          ))
          .yellow()
        );
      }
      Ok(vt::Outcome::QuotaExceeded) => {
        eprintln!(
          "{}",
          style("API request quota exceeded. Please try again later.").red()
        );
      }
      Ok(vt::Outcome::ApiError { status, body }) => {
        eprintln!(
          "{}",
          style(format!("API error {status}: {}", body.trim())).red()
        );
      }
      Err(e) => {
        eprintln!("{}", style(format!("Connection error: {e:#}")).red());
      }
    }

    Ok(())
  }

  /// Persists the raw API response verbatim. A write failure is reported
  /// but does not fail the run; the lookup itself already completed.
  fn save_report(&self, raw: &serde_json::Value, path: &std::path::Path) {
    let result = serde_json::to_string_pretty(raw)
      .map_err(anyhow::Error::from)
      .and_then(|text| {
        std::fs::write(path, text + "\n")
          .with_context(|| format!("Failed to write {}", path.display()))
      });
    match result {
      Ok(()) => {
        println!(
          "{}",
          style(format!("Report saved to {}", path.display())).green()
        );
      }
      Err(e) => {
        error!("report not saved: {e:#}");
        eprintln!("{}", style(format!("Error saving report: {e:#}")).red());
      }
    }
  }
}

pub struct WhoisApp {
  cli: WhoisCli,
}

impl WhoisApp {
  #[must_use]
  pub fn new() -> Self {
    Self { cli: WhoisCli::parse() }
  }

  /// Dispatches the requested subcommand.
  ///
  /// # Errors
  ///
  /// Invalid domains, unreadable input files, engine misuse, and export
  /// failures all surface here and exit non-zero.
  pub async fn run(&self) -> Result<()> {
    match &self.cli.command {
      WhoisCommand::Single {
        domain,
        output,
        timeout,
      } => {
        Self::run_single(domain, output.as_deref(), Duration::from_secs(*timeout))
          .await
      }
      WhoisCommand::Batch {
        input_file,
        output,
        format,
        workers,
        timeout,
      } => {
        Self::run_batch(
          input_file,
          output.as_deref(),
          *format,
          BatchOptions {
            workers: *workers,
            timeout: Duration::from_secs(*timeout),
          },
        )
        .await
      }
    }
  }

  async fn run_single(
    domain: &str,
    output: Option<&std::path::Path>,
    timeout: Duration,
  ) -> Result<()> {
    let domain = domain.to_ascii_lowercase();
    if !validate::is_valid_domain(&domain) {
      bail!("invalid domain: {domain}");
    }

    let pb = spinner(format!("Querying WHOIS for {domain}..."));
    let report = match whois::lookup(&domain, timeout).await {
      Ok(record) => DomainReport::from_record(&domain, &record, Utc::now()),
      Err(e) => DomainReport::from_error(&domain, &e.to_string(), Utc::now()),
    };
    pb.finish_and_clear();

    output::print_domain_report(&report);

    if let Some(path) = output {
      export::save_json(std::slice::from_ref(&report), path)?;
      info!(file = %path.display(), "result saved");
      println!(
        "{}",
        style(format!("Result saved to {}", path.display())).green()
      );
    }
    Ok(())
  }

  async fn run_batch(
    input_file: &std::path::Path,
    output: Option<&std::path::Path>,
    format: ExportFormat,
    options: BatchOptions,
  ) -> Result<()> {
    let domains = validate::read_domain_list(input_file)?;

    let pb = ProgressBar::new(domains.len() as u64);
    let timeout = options.timeout;
    let reports = batch::run_batch(
      domains,
      &options,
      move |domain| async move { whois::lookup(&domain, timeout).await },
      |_| pb.inc(1),
    )
    .await?;
    pb.finish_and_clear();

    if let Some(path) = output {
      match format {
        ExportFormat::Csv => export::save_csv(&reports, path)?,
        ExportFormat::Json => export::save_json(&reports, path)?,
      }
      info!(file = %path.display(), count = reports.len(), "results saved");
      println!(
        "{}",
        style(format!("Results saved to {}", path.display())).green()
      );
    } else {
      output::print_batch_summary(&reports);
    }
    Ok(())
  }
}

impl Default for WhoisApp {
  fn default() -> Self {
    Self::new()
  }
}
