//! Console rendering for both tools.

use console::{style, Style};

use crate::providers::vt;
use crate::report::DomainReport;

/// Helper: coloured keys so the summary is easy to scan.
fn key(s: &str) -> console::StyledObject<&str> {
  style(s).bold().cyan()
}

/// Helper: print a section header ("📜 WHOIS") once.
fn header(title: &str, emoji: &str) {
  println!(
    "\n{} {}",
    style(emoji).bold(),
    Style::new().bold().underlined().apply_to(title)
  );
}

fn opt(value: Option<&str>) -> &str {
  value.unwrap_or("N/A")
}

fn joined(values: &[String]) -> String {
  if values.is_empty() {
    "N/A".into()
  } else {
    values.join(", ")
  }
}

/// Renders one domain report the way the single-lookup command shows it.
pub fn print_domain_report(report: &DomainReport) {
  header(&format!("WHOIS: {}", report.domain), "📜");

  if !report.is_success() {
    println!(
      "  {} {}",
      key("Status:"),
      style(report.status.as_str()).red().bold()
    );
    println!("  {} {}", key("Error:"), opt(report.error.as_deref()));
    println!("  {} {}", key("Queried:"), report.timestamp);
    return;
  }

  println!(
    "  {} {}",
    key("Status:"),
    style(report.status.as_str()).green()
  );
  println!("  {} {}", key("Registrar:"), opt(report.registrar.as_deref()));
  println!(
    "  {} {}",
    key("Created:"),
    opt(report.creation_date.as_deref())
  );
  println!(
    "  {} {}",
    key("Updated:"),
    opt(report.updated_date.as_deref())
  );
  println!(
    "  {} {}",
    key("Expires:"),
    opt(report.expiration_date.as_deref())
  );
  if let Some(days) = report.days_to_expiration {
    let styled = if days < 30 {
      style(format!("{days} days")).red()
    } else {
      style(format!("{days} days")).green()
    };
    println!("  {} {}", key("Days to expiration:"), styled);
  }
  println!("  {} {}", key("Name Servers:"), joined(&report.name_servers));
  println!("  {} {}", key("Domain Status:"), joined(&report.status_codes));
  println!("  {} {}", key("Emails:"), joined(&report.emails));
  println!("  {} {}", key("DNSSEC:"), opt(report.dnssec.as_deref()));
  println!(
    "  {} {}",
    key("Registrant:"),
    opt(report.registrant.name.as_deref())
  );
  println!(
    "  {} {}",
    key("Registrant Org:"),
    report
      .registrant
      .organization
      .as_deref()
      .unwrap_or("N/A (or Redacted)")
  );
  println!(
    "  {} {}",
    key("Registrant Country:"),
    report
      .registrant
      .country
      .as_deref()
      .unwrap_or("N/A (or Redacted)")
  );
  println!("  {} {}", key("Queried:"), report.timestamp);
}

/// Summary shown after a batch run without an output file: totals plus the
/// first few results in full, and a hint for getting the rest.
pub fn print_batch_summary(reports: &[DomainReport]) {
  const DETAILED: usize = 3;

  let succeeded = reports.iter().filter(|r| r.is_success()).count();
  let failed = reports.len() - succeeded;

  header(&format!("Batch results for {} domains", reports.len()), "📦");
  println!("  {} {}", key("Succeeded:"), style(succeeded).green());
  println!("  {} {}", key("Failed:"), style(failed).red());

  for report in reports.iter().take(DETAILED) {
    print_domain_report(report);
  }

  if reports.len() > DETAILED {
    println!(
      "\n{}",
      style(format!(
        "Showing {DETAILED} of {} results. Re-run with --output to save the full set.",
        reports.len()
      ))
      .dim()
    );
  }
}

fn format_analysis_date(ts: Option<i64>) -> String {
  ts.and_then(|t| chrono::DateTime::from_timestamp(t, 0))
    .map_or_else(
      || "Unknown".to_string(),
      |dt| dt.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

/// Renders the VirusTotal reputation report for an IP address.
pub fn print_ip_report(ip: &str, attrs: &vt::Attributes) {
  header(&format!("Reputation: {ip}"), "🕵️");
  println!("  {} {}", key("Country:"), opt(attrs.country.as_deref()));
  println!(
    "  {} {}",
    key("ASN:"),
    attrs
      .asn
      .map_or_else(|| "Unknown".to_string(), |a| a.to_string())
  );
  println!("  {} {}", key("ASN Owner:"), opt(attrs.as_owner.as_deref()));
  println!(
    "  {} {}",
    key("Last Analysis:"),
    format_analysis_date(attrs.last_analysis_date)
  );

  let s = &attrs.stats;
  let total = s.malicious + s.harmless + s.suspicious + s.undetected;
  header("Detection Statistics", "🧪");
  println!(
    "  {} {}/{} engines {}  (suspicious: {}, harmless: {}, undetected: {})",
    key("Malicious:"),
    s.malicious,
    total,
    if s.malicious == 0 {
      style("✅").green()
    } else {
      style("⚠️").yellow()
    },
    s.suspicious,
    s.harmless,
    s.undetected
  );
  if let Some(rep) = attrs.reputation {
    println!("  {} {}", key("Overall score:"), rep);
  }

  let mut flagged: Vec<(&String, &vt::VendorVerdict)> = attrs
    .vendor_results
    .iter()
    .filter(|(_, v)| {
      matches!(v.category.as_deref(), Some("malicious" | "suspicious"))
    })
    .collect();
  flagged.sort_by(|a, b| a.0.cmp(b.0));

  if flagged.is_empty() {
    println!("  {}", style("No engines flagged this address").green());
  } else {
    header("Flagged Engines", "🚩");
    for (vendor, verdict) in flagged {
      println!(
        "  {} {} ({})",
        key(vendor),
        style(verdict.result.as_deref().unwrap_or("N/A")).red(),
        verdict.category.as_deref().unwrap_or("unknown")
      );
    }
  }

  if let Some(whois) = attrs.whois.as_deref() {
    header("WHOIS", "📜");
    for line in whois.lines().filter(|l| !l.trim().is_empty()) {
      println!("  {line}");
    }
  }
}
