//! Bounded-concurrency batch query engine.
//!
//! Fans a domain list out over at most `workers` concurrent lookups and
//! collects one [`DomainReport`] per input element. A lookup failure is
//! captured into that domain's report and never aborts its siblings; the
//! engine itself only fails on malformed arguments, before any lookup is
//! issued.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{debug, info};

use crate::providers::whois;
use crate::report::DomainReport;

#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
  /// Upper bound on concurrently in-flight lookups.
  pub workers: usize,
  /// Per-lookup deadline; an elapsed lookup becomes an error report.
  pub timeout: Duration,
}

impl Default for BatchOptions {
  fn default() -> Self {
    Self {
      workers: 5,
      timeout: Duration::from_secs(10),
    }
  }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
  #[error("invalid argument: {0}")]
  InvalidArgument(&'static str),
}

/// Runs every domain through `lookup` and returns one report per input
/// element, duplicates included. Results arrive in completion order, not
/// input order; callers that need determinism sort afterwards.
///
/// `on_complete` fires once per finished domain (success or error) and
/// exists to drive progress reporting without the engine knowing about it.
///
/// # Errors
///
/// `EngineError::InvalidArgument` for an empty domain list or a zero
/// worker count. Lookup failures never surface here; they are folded into
/// the corresponding report.
pub async fn run_batch<L, Fut, C>(
  domains: Vec<String>,
  options: &BatchOptions,
  lookup: L,
  mut on_complete: C,
) -> Result<Vec<DomainReport>, EngineError>
where
  L: Fn(String) -> Fut,
  Fut: Future<Output = Result<whois::Record, whois::Error>>,
  C: FnMut(&DomainReport),
{
  if domains.is_empty() {
    return Err(EngineError::InvalidArgument("domain list is empty"));
  }
  if options.workers == 0 {
    return Err(EngineError::InvalidArgument("worker count must be positive"));
  }

  let total = domains.len();
  info!(total, workers = options.workers, "starting batch WHOIS query");

  let timeout = options.timeout;
  let lookup = &lookup;
  let mut reports = stream::iter(domains)
    .map(|domain| async move {
      debug!(%domain, "querying");
      match tokio::time::timeout(timeout, lookup(domain.clone())).await {
        Ok(Ok(record)) => {
          DomainReport::from_record(&domain, &record, Utc::now())
        }
        Ok(Err(e)) => DomainReport::from_error(&domain, &e.to_string(), Utc::now()),
        Err(_) => DomainReport::from_error(
          &domain,
          &format!("lookup timed out after {timeout:?}"),
          Utc::now(),
        ),
      }
    })
    .buffer_unordered(options.workers);

  let mut results = Vec::with_capacity(total);
  while let Some(report) = reports.next().await {
    on_complete(&report);
    results.push(report);
  }

  info!(
    succeeded = results.iter().filter(|r| r.is_success()).count(),
    failed = results.iter().filter(|r| !r.is_success()).count(),
    "batch WHOIS query finished"
  );
  Ok(results)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::providers::whois::Record;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Arc;

  fn canned_record() -> Record {
    Record {
      registrar: Some("Test Registrar".into()),
      ..Record::default()
    }
  }

  fn opts(workers: usize) -> BatchOptions {
    BatchOptions {
      workers,
      timeout: Duration::from_secs(1),
    }
  }

  #[tokio::test]
  async fn one_report_per_input_duplicates_included() {
    let domains = vec![
      "a.com".to_string(),
      "a.com".to_string(),
      "b.com".to_string(),
    ];
    let results = run_batch(
      domains,
      &opts(2),
      |_| async { Ok(canned_record()) },
      |_| {},
    )
    .await
    .unwrap();

    assert_eq!(results.len(), 3);
    let mut domains: Vec<_> = results.iter().map(|r| r.domain.as_str()).collect();
    domains.sort_unstable();
    assert_eq!(domains, vec!["a.com", "a.com", "b.com"]);
  }

  #[tokio::test]
  async fn concurrency_never_exceeds_worker_count() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let high_water = Arc::new(AtomicUsize::new(0));

    let domains: Vec<String> =
      (0..12).map(|i| format!("domain{i}.com")).collect();
    let workers = 3;

    let in_flight_ref = Arc::clone(&in_flight);
    let high_water_ref = Arc::clone(&high_water);
    let results = run_batch(
      domains,
      &opts(workers),
      move |_| {
        let in_flight = Arc::clone(&in_flight_ref);
        let high_water = Arc::clone(&high_water_ref);
        async move {
          let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
          high_water.fetch_max(now, Ordering::SeqCst);
          tokio::time::sleep(Duration::from_millis(20)).await;
          in_flight.fetch_sub(1, Ordering::SeqCst);
          Ok(canned_record())
        }
      },
      |_| {},
    )
    .await
    .unwrap();

    assert_eq!(results.len(), 12);
    assert!(high_water.load(Ordering::SeqCst) <= workers);
  }

  #[tokio::test]
  async fn failures_are_isolated_into_error_reports() {
    let domains: Vec<String> = (0..5).map(|i| format!("d{i}.com")).collect();
    let results = run_batch(
      domains,
      &opts(2),
      |_| async { Err(whois::Error::NoUsefulFields) },
      |_| {},
    )
    .await
    .unwrap();

    assert_eq!(results.len(), 5);
    assert!(results.iter().all(|r| !r.is_success()));
    assert!(results
      .iter()
      .all(|r| r.error.as_deref() == Some("WHOIS response contained no useful fields")));
  }

  #[tokio::test]
  async fn slow_lookups_become_timeout_reports() {
    let options = BatchOptions {
      workers: 2,
      timeout: Duration::from_millis(20),
    };
    let results = run_batch(
      vec!["slow.com".to_string()],
      &options,
      |_| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(canned_record())
      },
      |_| {},
    )
    .await
    .unwrap();

    assert_eq!(results.len(), 1);
    assert!(!results[0].is_success());
    assert!(results[0].error.as_deref().unwrap().contains("timed out"));
  }

  #[tokio::test]
  async fn empty_domain_list_is_rejected() {
    let err = run_batch(
      Vec::new(),
      &opts(2),
      |_| async { Ok(canned_record()) },
      |_| {},
    )
    .await
    .unwrap_err();
    assert_eq!(err, EngineError::InvalidArgument("domain list is empty"));
  }

  #[tokio::test]
  async fn zero_workers_is_rejected() {
    let err = run_batch(
      vec!["a.com".to_string()],
      &opts(0),
      |_| async { Ok(canned_record()) },
      |_| {},
    )
    .await
    .unwrap_err();
    assert_eq!(
      err,
      EngineError::InvalidArgument("worker count must be positive")
    );
  }

  #[tokio::test]
  async fn completion_callback_fires_once_per_domain() {
    let seen = Arc::new(AtomicUsize::new(0));
    let seen_ref = Arc::clone(&seen);
    let domains: Vec<String> = (0..4).map(|i| format!("cb{i}.com")).collect();
    run_batch(
      domains,
      &opts(2),
      |_| async { Ok(canned_record()) },
      move |_| {
        seen_ref.fetch_add(1, Ordering::SeqCst);
      },
    )
    .await
    .unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 4);
  }
}
