//! Input validation for domains and batch files.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use regex::Regex;
use tracing::{info, warn};

/// One or more labels of 1-63 alphanumeric-or-hyphen characters (no
/// leading/trailing hyphen), dot-separated, ending in an alphabetic TLD of
/// at least two characters.
static RE_DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,}$")
    .unwrap()
});

#[must_use]
pub fn is_valid_domain(candidate: &str) -> bool {
  RE_DOMAIN.is_match(candidate)
}

/// Reads a batch input file: one domain per line, blank lines and `#`
/// comments skipped, entries lower-cased. Lines that fail validation are
/// dropped from the batch; the drop is logged so it never goes unnoticed.
///
/// # Errors
///
/// Fails when the file cannot be read or contains no valid domains.
pub fn read_domain_list(path: &Path) -> Result<Vec<String>> {
  let content = fs::read_to_string(path)
    .with_context(|| format!("Failed to read input file: {}", path.display()))?;

  let mut domains = Vec::new();
  let mut dropped = 0usize;

  for line in content.lines() {
    let entry = line.trim();
    if entry.is_empty() || entry.starts_with('#') {
      continue;
    }
    let normalized = entry.to_ascii_lowercase();
    if is_valid_domain(&normalized) {
      domains.push(normalized);
    } else {
      warn!(entry, "dropping invalid domain from batch input");
      dropped += 1;
    }
  }

  if domains.is_empty() {
    bail!("no valid domains found in {}", path.display());
  }
  if dropped > 0 {
    warn!(dropped, "invalid entries were dropped from the batch");
  }
  info!(count = domains.len(), file = %path.display(), "read domain list");

  Ok(domains)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn accepts_regular_domains() {
    assert!(is_valid_domain("example.com"));
    assert!(is_valid_domain("sub.example.co.uk"));
    assert!(is_valid_domain("xn--bcher-kva.ch"));
    assert!(is_valid_domain("a-b.example.io"));
  }

  #[test]
  fn rejects_malformed_domains() {
    assert!(!is_valid_domain("-bad.com"));
    assert!(!is_valid_domain("bad-.com"));
    assert!(!is_valid_domain("no_tld"));
    assert!(!is_valid_domain(""));
    assert!(!is_valid_domain("example.c"));
    assert!(!is_valid_domain("example.123"));
    assert!(!is_valid_domain(".com"));
  }

  #[test]
  fn label_length_limit_is_enforced() {
    let long_label = "a".repeat(63);
    assert!(is_valid_domain(&format!("{long_label}.com")));
    let too_long = "a".repeat(64);
    assert!(!is_valid_domain(&format!("{too_long}.com")));
  }

  #[test]
  fn batch_file_drops_invalid_and_lowercases() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "Example.COM").unwrap();
    writeln!(file, "# a comment").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "-bad.com").unwrap();
    writeln!(file, "second.org").unwrap();

    let domains = read_domain_list(file.path()).unwrap();
    assert_eq!(domains, vec!["example.com", "second.org"]);
  }

  #[test]
  fn batch_file_with_no_valid_domains_errors() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "# only comments").unwrap();
    writeln!(file, "no_tld").unwrap();
    assert!(read_domain_list(file.path()).is_err());
  }

  #[test]
  fn missing_file_errors() {
    assert!(read_domain_list(Path::new("/nonexistent/domains.txt")).is_err());
  }
}
