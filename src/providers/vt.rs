use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct LastAnalysisStats {
  pub harmless: u32,
  pub malicious: u32,
  pub suspicious: u32,
  pub undetected: u32,
  pub timeout: Option<u32>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct VendorVerdict {
  pub category: Option<String>,
  pub result: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Attributes {
  pub country: Option<String>,
  pub asn: Option<i64>,
  pub as_owner: Option<String>,
  /// Unix timestamp of the last analysis run.
  pub last_analysis_date: Option<i64>,
  #[serde(rename = "last_analysis_stats")]
  pub stats: LastAnalysisStats,
  #[serde(default, rename = "last_analysis_results")]
  pub vendor_results: HashMap<String, VendorVerdict>,
  /// Overall VT reputation score (-100…100, >0 means "good")
  pub reputation: Option<i32>,
  pub whois: Option<String>,
}

/// A successful reputation report: the verbatim API response plus the
/// typed attribute view used for terminal rendering. The raw value is what
/// gets persisted, byte-for-byte what the API returned.
#[derive(Debug, Clone)]
pub struct Report {
  pub raw: Value,
  pub attributes: Attributes,
}

/// Non-transport outcomes of a reputation query. None of these abort the
/// run; the caller reports them and finishes normally.
#[derive(Debug)]
pub enum Outcome {
  Report(Box<Report>),
  NotFound,
  QuotaExceeded,
  ApiError { status: StatusCode, body: String },
}

/// Queries the `VirusTotal` v3 API for an IP address reputation report.
///
/// # Arguments
///
/// * `ip` - The IP address to query (already validated by the caller).
/// * `api_key` - The `VirusTotal` API key.
/// * `client` - A `reqwest::Client` instance to use for the HTTP request.
///
/// # Errors
///
/// Returns an error only for transport failures (connection refused, TLS,
/// request build) or when a 200 response cannot be deserialized. API-level
/// conditions (not found, quota, other statuses) are `Outcome` variants.
pub async fn fetch_ip_report(
  ip: &str,
  api_key: &str,
  client: &Client,
) -> Result<Outcome> {
  let endpoint = format!("https://www.virustotal.com/api/v3/ip_addresses/{ip}");

  let response = client
    .get(&endpoint)
    .header(header::ACCEPT, "application/json")
    .header("x-apikey", api_key)
    .send()
    .await
    .with_context(|| format!("Failed to send request to {endpoint}"))?;

  match response.status() {
    StatusCode::OK => {
      let raw: Value = response
        .json()
        .await
        .map_err(|e| anyhow!("Invalid VT JSON: {e}"))?;
      let attributes = parse_attributes(&raw)?;
      Ok(Outcome::Report(Box::new(Report { raw, attributes })))
    }
    StatusCode::NOT_FOUND => Ok(Outcome::NotFound),
    StatusCode::TOO_MANY_REQUESTS => Ok(Outcome::QuotaExceeded),
    status => {
      let body = response.text().await.unwrap_or_default();
      Ok(Outcome::ApiError { status, body })
    }
  }
}

fn parse_attributes(raw: &Value) -> Result<Attributes> {
  let attrs = raw
    .pointer("/data/attributes")
    .ok_or_else(|| anyhow!("VT response missing data.attributes"))?;
  serde_json::from_value(attrs.clone())
    .map_err(|e| anyhow!("Unexpected VT attribute shape: {e}"))
}
