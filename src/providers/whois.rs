use std::{collections::HashSet, sync::LazyLock, time::Duration};

use memchr::memchr;
use regex::Regex;
use thiserror::Error;
use whois_rust::{WhoIs, WhoIsLookupOptions};

static DEFAULT_SERVERS_JSON: &str = include_str!("../config/servers.json");

const IGNORE_PREFIXES: [&str; 4] = ["%", ">>>", "NOTE:", "Registrar URL:"];

static RE_REDACTED: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)REDACTED\s+FOR\s+PRIVACY").unwrap());

static RE_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap()
});

static WHOIS_CLIENT: LazyLock<WhoIs> = LazyLock::new(|| {
  WhoIs::from_string(DEFAULT_SERVERS_JSON).expect("init whois client")
});

/// Raw field candidates pulled out of a WHOIS response.
///
/// Date fields keep every candidate value the registry reported (some
/// registries list a field more than once, in different formats); the
/// normalization layer decides what to do with them.
#[derive(Debug, Clone, Default)]
pub struct Record {
  pub domain_name: Option<String>,
  pub registrar: Option<String>,
  pub creation_dates: Vec<String>,
  pub updated_dates: Vec<String>,
  pub expiration_dates: Vec<String>,
  pub name_servers: Vec<String>,
  pub statuses: Vec<String>,
  pub emails: Vec<String>,
  pub dnssec: Option<String>,
  pub registrant_name: Option<String>,
  pub registrant_organization: Option<String>,
  pub registrant_country: Option<String>,
}

impl Record {
  #[inline]
  #[must_use]
  pub fn has_data(&self) -> bool {
    self.domain_name.is_some()
      || self.registrar.is_some()
      || !self.creation_dates.is_empty()
      || !self.expiration_dates.is_empty()
      || !self.name_servers.is_empty()
      || self.registrant_organization.is_some()
      || self.registrant_country.is_some()
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("whois operation failed: {0}")]
  WhoIs(#[from] whois_rust::WhoIsError),
  #[error("whois lookup timed out after {0:?}")]
  Timeout(Duration),
  #[error("WHOIS response contained no useful fields")]
  NoUsefulFields,
}

#[derive(Default)]
struct ParseCtx {
  record: Record,
  ns: HashSet<String>,
  status: HashSet<String>,
  emails: HashSet<String>,
}

impl ParseCtx {
  fn process_line(&mut self, line: &str) {
    let trimmed = line.trim();
    if trimmed.is_empty()
      || ignored_prefix(trimmed)
      || RE_REDACTED.is_match(trimmed)
    {
      return;
    }

    for m in RE_EMAIL.find_iter(trimmed) {
      self.emails.insert(m.as_str().to_ascii_lowercase());
    }

    if let Some(idx) = memchr(b':', trimmed.as_bytes()) {
      let (raw_key, raw_val) = trimmed.split_at(idx);
      let key_lc = raw_key.trim().to_ascii_lowercase();
      let val = raw_val[1..].trim(); // skip ':'
      if val.is_empty() {
        return;
      }

      match key_lc.as_str() {
        "domain name" | "domain" => {
          self
            .record
            .domain_name
            .get_or_insert_with(|| val.to_ascii_lowercase());
        }
        "registrar" | "sponsoring registrar" => {
          self.record.registrar.get_or_insert(val.to_string());
        }
        "creation date" | "registered on" | "created" => {
          push_unique(&mut self.record.creation_dates, val);
        }
        "updated date" | "changed" | "last-updated" => {
          push_unique(&mut self.record.updated_dates, val);
        }
        "registry expiry date" | "expiry date" | "expires on" | "paid-till" => {
          push_unique(&mut self.record.expiration_dates, val);
        }
        "name server" | "name servers" | "nserver" => {
          val.split_whitespace().for_each(|s| {
            self.ns.insert(s.to_ascii_lowercase());
          });
        }
        "domain status" | "status" => {
          let s = val
            .split_once(" https://")
            .map_or(val, |(left, _)| left)
            .trim();
          if !s.is_empty() {
            self.status.insert(s.to_string());
          }
        }
        "dnssec" => {
          self.record.dnssec.get_or_insert(val.to_string());
        }
        "registrant name" => {
          self.record.registrant_name.get_or_insert(val.to_string());
        }
        "registrant organization" | "org" | "organization" => {
          self
            .record
            .registrant_organization
            .get_or_insert(val.to_string());
        }
        "registrant country" | "country" => {
          self
            .record
            .registrant_country
            .get_or_insert(val.to_string());
        }
        _ => {}
      }
    }
  }

  fn finalize(mut self) -> Record {
    self.record.name_servers = self.ns.into_iter().collect();
    self.record.name_servers.sort_unstable();

    self.record.statuses = self.status.into_iter().collect();
    self.record.statuses.sort_unstable();

    self.record.emails = self.emails.into_iter().collect();
    self.record.emails.sort_unstable();

    self.record
  }
}

fn push_unique(values: &mut Vec<String>, candidate: &str) {
  if !values.iter().any(|v| v == candidate) {
    values.push(candidate.to_string());
  }
}

/// Fast check for ignorable line prefixes (case-insensitive)
#[inline]
fn ignored_prefix(line: &str) -> bool {
  let bytes = line.as_bytes();
  IGNORE_PREFIXES.iter().any(|p| {
    bytes.len() >= p.len()
      && bytes[..p.len()].eq_ignore_ascii_case(p.as_bytes())
  })
}

#[must_use]
pub fn parse(raw: &str) -> Record {
  let mut ctx = ParseCtx::default();
  for line in raw.lines() {
    ctx.process_line(line);
  }
  ctx.finalize()
}

/// Query WHOIS for a domain, bounded by `timeout`.
///
/// The lookup follows one registrar referral (the registry often holds only
/// a skeleton record) and parses the raw response on a best-effort basis.
///
/// # Errors
///
/// Returns an error if the lookup fails, exceeds `timeout`, or if the
/// response contains no recognizable fields.
pub async fn lookup(domain: &str, timeout: Duration) -> Result<Record, Error> {
  let whois = &*WHOIS_CLIENT;
  let normalized = domain.trim_end_matches('.').to_ascii_lowercase();

  let mut opts = WhoIsLookupOptions::from_string(&normalized)?;
  opts.follow = 1;
  opts.timeout = Some(timeout);

  let raw = tokio::time::timeout(timeout, whois.lookup_async(opts))
    .await
    .map_err(|_| Error::Timeout(timeout))??;

  let record = parse(&raw);
  if record.has_data() {
    Ok(record)
  } else {
    Err(Error::NoUsefulFields)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SAMPLE: &str = "\
Domain Name: EXAMPLE.COM
Registrar: Example Registrar, LLC
Registrar URL: http://www.example-registrar.test
Creation Date: 1995-08-14T04:00:00Z
Updated Date: 2024-08-14T07:01:31Z
Registry Expiry Date: 2025-08-13T04:00:00Z
Name Server: B.IANA-SERVERS.NET
Name Server: A.IANA-SERVERS.NET
Domain Status: clientDeleteProhibited https://icann.org/epp#clientDeleteProhibited
Domain Status: clientTransferProhibited https://icann.org/epp#clientTransferProhibited
DNSSEC: signedDelegation
Registrant Organization: Internet Assigned Numbers Authority
Registrant Country: US
Registrant Email: RESERVED@iana.org
>>> Last update of whois database: 2025-01-01T00:00:00Z <<<
% Terms of use apply.
";

  #[test]
  fn parses_core_fields() {
    let record = parse(SAMPLE);
    assert_eq!(record.domain_name.as_deref(), Some("example.com"));
    assert_eq!(record.registrar.as_deref(), Some("Example Registrar, LLC"));
    assert_eq!(record.creation_dates, vec!["1995-08-14T04:00:00Z"]);
    assert_eq!(record.expiration_dates, vec!["2025-08-13T04:00:00Z"]);
    assert_eq!(record.updated_dates, vec!["2024-08-14T07:01:31Z"]);
    assert_eq!(record.dnssec.as_deref(), Some("signedDelegation"));
    assert!(record.has_data());
  }

  #[test]
  fn name_servers_lowercased_and_sorted() {
    let record = parse(SAMPLE);
    assert_eq!(
      record.name_servers,
      vec!["a.iana-servers.net", "b.iana-servers.net"]
    );
  }

  #[test]
  fn status_urls_are_trimmed() {
    let record = parse(SAMPLE);
    assert_eq!(
      record.statuses,
      vec!["clientDeleteProhibited", "clientTransferProhibited"]
    );
  }

  #[test]
  fn emails_collected_and_lowercased() {
    let record = parse(SAMPLE);
    assert_eq!(record.emails, vec!["reserved@iana.org"]);
  }

  #[test]
  fn registrant_block() {
    let record = parse(SAMPLE);
    assert_eq!(
      record.registrant_organization.as_deref(),
      Some("Internet Assigned Numbers Authority")
    );
    assert_eq!(record.registrant_country.as_deref(), Some("US"));
    assert!(record.registrant_name.is_none());
  }

  #[test]
  fn duplicate_date_lines_kept_once() {
    let raw =
      "Creation Date: 2001-01-01\nCreation Date: 2001-01-01\ncreated: 2001.01.01\n";
    let record = parse(raw);
    assert_eq!(record.creation_dates, vec!["2001-01-01", "2001.01.01"]);
  }

  #[test]
  fn redacted_lines_are_skipped() {
    let raw =
      "Registrant Organization: REDACTED FOR PRIVACY\nRegistrar: Real Registrar\n";
    let record = parse(raw);
    assert!(record.registrant_organization.is_none());
    assert_eq!(record.registrar.as_deref(), Some("Real Registrar"));
  }

  #[test]
  fn boilerplate_only_response_has_no_data() {
    let raw = "% This query returned 0 objects.\n>>> nothing here <<<\n";
    assert!(!parse(raw).has_data());
  }
}
