pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use crate::app::report::ReportFormat;
#[cfg(feature = "cli")]
use crate::config::toml_config::FleetConfig;
#[cfg(feature = "cli")]
use crate::domain::model::TableKind;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{validate_csv_extension, validate_path, Validate};
#[cfg(feature = "cli")]
use clap::{Parser, ValueEnum};
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "fleet-anonymize")]
#[command(about = "Strip personal data from a fleet payments or trips export")]
pub struct AnonymizeCli {
    /// Which export the input file is
    #[arg(long, value_enum)]
    pub kind: TableKind,

    /// Raw CSV export
    #[arg(short, long)]
    pub input: String,

    /// Destination, defaults to <input stem>_anonymized.csv next to the input
    #[arg(short, long)]
    pub output: Option<String>,

    /// Optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Value that must never appear in the output (repeatable, added to
    /// `[anonymizer] forbidden_tokens`). Without any, the privacy scan is skipped.
    #[arg(long = "forbid", value_name = "TOKEN")]
    pub forbid: Vec<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    #[arg(long, value_enum, default_value = "compact")]
    pub log_format: LogFormat,
}

#[cfg(feature = "cli")]
impl AnonymizeCli {
    /// Adds `--forbid` values to the configured forbidden tokens.
    pub fn apply_overrides(&self, config: &mut FleetConfig) {
        let tokens = &mut config.anonymizer.forbidden_tokens;
        for token in &self.forbid {
            if !tokens.iter().any(|t| t.eq_ignore_ascii_case(token)) {
                tokens.push(token.clone());
            }
        }
    }
}

#[cfg(feature = "cli")]
impl Validate for AnonymizeCli {
    fn validate(&self) -> Result<()> {
        validate_path("input", &self.input)?;
        validate_csv_extension("input", &self.input)?;
        if let Some(output) = &self.output {
            validate_path("output", output)?;
            validate_csv_extension("output", output)?;
        }
        if let Some(config) = &self.config {
            validate_path("config", config)?;
        }
        Ok(())
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "fleet-analyze")]
#[command(about = "Report revenue, inequality and trip statistics over anonymized exports")]
pub struct AnalyzeCli {
    /// Anonymized payments CSV
    #[arg(long)]
    pub payments: String,

    /// Anonymized trips CSV
    #[arg(long)]
    pub trips: String,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,

    #[arg(long, value_enum, default_value = "text")]
    pub format: ReportFormat,

    /// Optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    #[arg(long, value_enum, default_value = "compact")]
    pub log_format: LogFormat,
}

#[cfg(feature = "cli")]
impl Validate for AnalyzeCli {
    fn validate(&self) -> Result<()> {
        validate_path("payments", &self.payments)?;
        validate_csv_extension("payments", &self.payments)?;
        validate_path("trips", &self.trips)?;
        validate_csv_extension("trips", &self.trips)?;
        if let Some(output) = &self.output {
            validate_path("output", output)?;
        }
        if let Some(config) = &self.config {
            validate_path("config", config)?;
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_anonymize_args() {
        let cli = AnonymizeCli::parse_from([
            "fleet-anonymize",
            "--kind",
            "payments",
            "--input",
            "raw/payorder.csv",
        ]);
        assert_eq!(cli.kind, TableKind::Payments);
        assert!(cli.output.is_none());
        assert_eq!(cli.log_format, LogFormat::Compact);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_forbid_adds_to_configured_tokens() {
        let cli = AnonymizeCli::parse_from([
            "fleet-anonymize",
            "--kind",
            "payments",
            "--input",
            "raw/payorder.csv",
            "--forbid",
            "Chennai",
            "--forbid",
            "Madras",
        ]);
        let mut config = FleetConfig::default();
        config.anonymizer.forbidden_tokens = vec!["chennai".to_string()];

        cli.apply_overrides(&mut config);

        assert_eq!(config.anonymizer.forbidden_tokens, vec!["chennai", "Madras"]);
    }

    #[test]
    fn test_anonymize_rejects_non_csv_input() {
        let cli = AnonymizeCli::parse_from([
            "fleet-anonymize",
            "--kind",
            "trips",
            "--input",
            "raw/trips.xlsx",
        ]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_parse_analyze_args() {
        let cli = AnalyzeCli::parse_from([
            "fleet-analyze",
            "--payments",
            "p.csv",
            "--trips",
            "t.csv",
            "--format",
            "json",
        ]);
        assert_eq!(cli.format, ReportFormat::Json);
        assert!(cli.validate().is_ok());
    }
}
