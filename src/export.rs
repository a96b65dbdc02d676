//! Report export: JSON envelope and fixed-column CSV.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::report::DomainReport;

/// Column set of the CSV export. Multi-valued fields are joined into a
/// single cell; absent fields render as empty cells.
const CSV_COLUMNS: [&str; 9] = [
  "domain",
  "status",
  "registrar",
  "creation_date",
  "expiration_date",
  "updated_date",
  "days_to_expiration",
  "name_servers",
  "emails",
];

#[derive(Debug, Error)]
pub enum ExportError {
  #[error("nothing to export: the result set is empty")]
  Empty,
  #[error("failed to write {path}: {source}")]
  Io {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("failed to encode CSV: {0}")]
  Csv(#[from] csv::Error),
  #[error("failed to encode JSON: {0}")]
  Json(#[from] serde_json::Error),
}

/// JSON export wrapper. Field order is the serialization order here, so
/// re-parsing a report file is stable across versions.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope {
  pub generated_at: String,
  pub count: usize,
  pub results: Vec<DomainReport>,
}

fn create_file(path: &Path) -> Result<File, ExportError> {
  File::create(path).map_err(|source| ExportError::Io {
    path: path.to_path_buf(),
    source,
  })
}

/// Writes the full result sequence as a pretty-printed JSON envelope.
///
/// # Errors
///
/// `ExportError::Empty` for an empty result set, `ExportError::Io` when the
/// target path cannot be created or written.
pub fn save_json(
  reports: &[DomainReport],
  path: &Path,
) -> Result<(), ExportError> {
  if reports.is_empty() {
    return Err(ExportError::Empty);
  }

  let envelope = Envelope {
    generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    count: reports.len(),
    results: reports.to_vec(),
  };

  let mut file = create_file(path)?;
  serde_json::to_writer_pretty(&mut file, &envelope)?;
  file
    .write_all(b"\n")
    .and_then(|()| file.flush())
    .map_err(|source| ExportError::Io {
      path: path.to_path_buf(),
      source,
    })
}

/// Writes the result sequence as CSV with the fixed column set.
///
/// # Errors
///
/// `ExportError::Empty` for an empty result set, `ExportError::Io`/
/// `ExportError::Csv` when the target cannot be created or a row fails to
/// encode.
pub fn save_csv(
  reports: &[DomainReport],
  path: &Path,
) -> Result<(), ExportError> {
  if reports.is_empty() {
    return Err(ExportError::Empty);
  }

  let mut writer = csv::Writer::from_writer(create_file(path)?);
  writer.write_record(CSV_COLUMNS)?;

  for report in reports {
    writer.write_record([
      report.domain.as_str(),
      report.status.as_str(),
      report.registrar.as_deref().unwrap_or_default(),
      report.creation_date.as_deref().unwrap_or_default(),
      report.expiration_date.as_deref().unwrap_or_default(),
      report.updated_date.as_deref().unwrap_or_default(),
      &report
        .days_to_expiration
        .map(|d| d.to_string())
        .unwrap_or_default(),
      &report.name_servers.join(", "),
      &report.emails.join(", "),
    ])?;
  }

  writer.flush().map_err(|source| ExportError::Io {
    path: path.to_path_buf(),
    source,
  })
}
