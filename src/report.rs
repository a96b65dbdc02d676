//! Normalized per-domain query results.
//!
//! A [`DomainReport`] is produced exactly once per requested domain, by the
//! worker that ran the lookup, and is never mutated afterwards. Lookup
//! failures become reports too; they carry the failure description instead
//! of registration data.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::providers::whois::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
  Success,
  Error,
}

impl QueryStatus {
  #[must_use]
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Success => "success",
      Self::Error => "error",
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registrant {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub organization: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub country: Option<String>,
}

impl Registrant {
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.name.is_none() && self.organization.is_none() && self.country.is_none()
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainReport {
  pub domain: String,
  pub status: QueryStatus,
  /// RFC 3339 instant the report was produced.
  pub timestamp: String,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub registrar: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub creation_date: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub expiration_date: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub updated_date: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub name_servers: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub status_codes: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub emails: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub dnssec: Option<String>,
  #[serde(default, skip_serializing_if = "Registrant::is_empty")]
  pub registrant: Registrant,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub days_to_expiration: Option<i64>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl DomainReport {
  /// Builds a success report from a raw WHOIS record.
  #[must_use]
  pub fn from_record(
    domain: &str,
    record: &Record,
    now: DateTime<Utc>,
  ) -> Self {
    let expiration_date = normalize_dates(&record.expiration_dates);
    let days = days_to_expiration(expiration_date.as_deref(), now);

    Self {
      domain: domain.to_string(),
      status: QueryStatus::Success,
      timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, true),
      registrar: record.registrar.clone(),
      creation_date: normalize_dates(&record.creation_dates),
      expiration_date,
      updated_date: normalize_dates(&record.updated_dates),
      name_servers: record.name_servers.clone(),
      status_codes: record.statuses.clone(),
      emails: record.emails.clone(),
      dnssec: record.dnssec.clone(),
      registrant: Registrant {
        name: record.registrant_name.clone(),
        organization: record.registrant_organization.clone(),
        country: record.registrant_country.clone(),
      },
      days_to_expiration: days,
      error: None,
    }
  }

  /// Builds an error report carrying the failure description.
  #[must_use]
  pub fn from_error(domain: &str, message: &str, now: DateTime<Utc>) -> Self {
    Self {
      domain: domain.to_string(),
      status: QueryStatus::Error,
      timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, true),
      registrar: None,
      creation_date: None,
      expiration_date: None,
      updated_date: None,
      name_servers: Vec::new(),
      status_codes: Vec::new(),
      emails: Vec::new(),
      dnssec: None,
      registrant: Registrant::default(),
      days_to_expiration: None,
      error: Some(message.to_string()),
    }
  }

  #[inline]
  #[must_use]
  pub const fn is_success(&self) -> bool {
    matches!(self.status, QueryStatus::Success)
  }
}

/// Date formats seen in the wild across registries, tried in order after
/// RFC 3339. The first match wins.
const NAIVE_DATETIME_FORMATS: [&str; 3] = [
  "%Y-%m-%dT%H:%M:%S",
  "%Y-%m-%d %H:%M:%S",
  "%Y.%m.%d %H:%M:%S",
];
const NAIVE_DATE_FORMATS: [&str; 4] =
  ["%Y-%m-%d", "%d-%b-%Y", "%Y.%m.%d", "%d.%m.%Y"];

fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
  let trimmed = raw.trim();

  if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
    return Some(dt.with_timezone(&Utc));
  }
  for fmt in NAIVE_DATETIME_FORMATS {
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
      return Some(dt.and_utc());
    }
  }
  for fmt in NAIVE_DATE_FORMATS {
    if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
      return Some(d.and_hms_opt(0, 0, 0)?.and_utc());
    }
  }
  None
}

/// Normalizes one raw date value to ISO-8601. Unparseable input passes
/// through unchanged rather than failing.
#[must_use]
pub fn normalize_date(raw: &str) -> String {
  parse_instant(raw).map_or_else(
    || raw.trim().to_string(),
    |dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true),
  )
}

/// Normalizes every candidate value of a date field and joins them for
/// display. Registries that report a field twice keep both candidates.
#[must_use]
pub fn normalize_dates(values: &[String]) -> Option<String> {
  if values.is_empty() {
    return None;
  }
  Some(
    values
      .iter()
      .map(|v| normalize_date(v))
      .collect::<Vec<_>>()
      .join(", "),
  )
}

/// Whole days until the expiration instant, negative once expired.
///
/// Only the first candidate of a multi-valued expiration field is used.
/// Returns `None` when the field is absent or does not parse; never errors.
#[must_use]
pub fn days_to_expiration(
  expiration: Option<&str>,
  now: DateTime<Utc>,
) -> Option<i64> {
  let first = expiration?.split(',').next()?.trim();
  let instant = parse_instant(first)?;
  Some((instant - now).num_days())
}
