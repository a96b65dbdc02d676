use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug, Clone)]
#[command(name = "ipcheck", version)]
#[command(
  about = "Check the reputation of an IP address using the VirusTotal API.",
  long_about = "Queries the VirusTotal v3 API for an IP address and reports \
detection statistics, flagged engines, and registration details. The API \
key is taken from --api-key, the VT_API_KEY environment variable, or the \
saved user configuration, in that order."
)]
pub struct IpCli {
  /// The IP address to check.
  pub ip: String,

  /// `VirusTotal` API key.
  /// Overrides the `VT_API_KEY` environment variable if both are set.
  #[arg(short = 'k', long = "api-key", value_name = "API_KEY")]
  pub api_key: Option<String>,

  /// Write the raw API response to this file (JSON).
  #[arg(short, long, value_name = "FILE")]
  pub output: Option<PathBuf>,

  /// Quiet mode: skip terminal rendering, only save the report.
  #[arg(short, long)]
  pub quiet: bool,

  /// Persist the API key into the user config file for later runs.
  #[arg(long)]
  pub save_key: bool,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "whois-analyzer", version)]
#[command(about = "Query and analyze WHOIS information for domain names.")]
pub struct WhoisCli {
  #[command(subcommand)]
  pub command: WhoisCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum WhoisCommand {
  /// Look up WHOIS information for a single domain.
  Single {
    /// The domain name to look up.
    domain: String,

    /// Write the result to this file (JSON).
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Per-query timeout in seconds.
    #[arg(short, long, default_value_t = 10)]
    timeout: u64,
  },

  /// Look up WHOIS information for a list of domains.
  Batch {
    /// File with one domain per line ('#' starts a comment).
    input_file: PathBuf,

    /// Write the results to this file.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format for --output.
    #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
    format: ExportFormat,

    /// Maximum number of concurrent lookups.
    #[arg(short, long, default_value_t = 5)]
    workers: usize,

    /// Per-query timeout in seconds.
    #[arg(short, long, default_value_t = 10)]
    timeout: u64,
  },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
  Csv,
  Json,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ip_args(args: &[&str]) -> Vec<String> {
    std::iter::once("ipcheck".to_string())
      .chain(args.iter().map(std::string::ToString::to_string))
      .collect()
  }

  fn whois_args(args: &[&str]) -> Vec<String> {
    std::iter::once("whois-analyzer".to_string())
      .chain(args.iter().map(std::string::ToString::to_string))
      .collect()
  }

  #[test]
  fn ip_basic_target() {
    let cli = IpCli::try_parse_from(ip_args(&["8.8.8.8"]))
      .expect("Should parse a bare IP");
    assert_eq!(cli.ip, "8.8.8.8");
    assert!(cli.api_key.is_none());
    assert!(cli.output.is_none());
    assert!(!cli.quiet);
    assert!(!cli.save_key);
  }

  #[test]
  fn ip_all_flags() {
    let cli = IpCli::try_parse_from(ip_args(&[
      "1.1.1.1",
      "-k",
      "secret",
      "-o",
      "report.json",
      "-q",
      "--save-key",
    ]))
    .expect("Should parse all flags");
    assert_eq!(cli.api_key.as_deref(), Some("secret"));
    assert_eq!(cli.output.as_deref(), Some(std::path::Path::new("report.json")));
    assert!(cli.quiet);
    assert!(cli.save_key);
  }

  #[test]
  fn ip_missing_target_fails() {
    let result = IpCli::try_parse_from(ip_args(&[]));
    assert!(
      matches!(
        result.unwrap_err().kind(),
        clap::error::ErrorKind::MissingRequiredArgument
      ),
      "Error kind should be MissingRequiredArgument"
    );
  }

  #[test]
  fn whois_single_defaults() {
    let cli = WhoisCli::try_parse_from(whois_args(&["single", "example.com"]))
      .expect("Should parse single lookup");
    match cli.command {
      WhoisCommand::Single {
        domain,
        output,
        timeout,
      } => {
        assert_eq!(domain, "example.com");
        assert!(output.is_none());
        assert_eq!(timeout, 10);
      }
      WhoisCommand::Batch { .. } => panic!("expected single subcommand"),
    }
  }

  #[test]
  fn whois_batch_defaults() {
    let cli = WhoisCli::try_parse_from(whois_args(&["batch", "domains.txt"]))
      .expect("Should parse batch lookup");
    match cli.command {
      WhoisCommand::Batch {
        input_file,
        output,
        format,
        workers,
        timeout,
      } => {
        assert_eq!(input_file, PathBuf::from("domains.txt"));
        assert!(output.is_none());
        assert_eq!(format, ExportFormat::Csv);
        assert_eq!(workers, 5);
        assert_eq!(timeout, 10);
      }
      WhoisCommand::Single { .. } => panic!("expected batch subcommand"),
    }
  }

  #[test]
  fn whois_batch_full_flags() {
    let cli = WhoisCli::try_parse_from(whois_args(&[
      "batch",
      "domains.txt",
      "-o",
      "out.json",
      "-f",
      "json",
      "-w",
      "12",
      "-t",
      "30",
    ]))
    .expect("Should parse batch with flags");
    match cli.command {
      WhoisCommand::Batch {
        output,
        format,
        workers,
        timeout,
        ..
      } => {
        assert_eq!(output, Some(PathBuf::from("out.json")));
        assert_eq!(format, ExportFormat::Json);
        assert_eq!(workers, 12);
        assert_eq!(timeout, 30);
      }
      WhoisCommand::Single { .. } => panic!("expected batch subcommand"),
    }
  }

  #[test]
  fn whois_rejects_unknown_format() {
    let result =
      WhoisCli::try_parse_from(whois_args(&["batch", "d.txt", "-f", "xml"]));
    assert!(result.is_err(), "xml is not a supported export format");
  }

  #[test]
  fn whois_requires_a_subcommand() {
    let result = WhoisCli::try_parse_from(whois_args(&[]));
    assert!(result.is_err(), "Parsing should fail without a subcommand");
  }
}
