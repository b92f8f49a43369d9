//! Command-line interface definitions.
//!
//! Uses `clap` derive macros for declarative argument parsing. Flags
//! override values from the settings file.

use crate::config::{InspectConfig, Settings};
use crate::error::InspectResult;
use crate::inspect::{self, InspectSummary, Outcome, ParseErrorMode};
use crate::output;
use clap::Parser;
use std::io;
use std::path::PathBuf;

/// nmap-inspect - summarize Nmap XML scans per host.
///
/// Reads every `*.xml` file from the scans directory, merges what each scan
/// saw about the same host, guesses a device type, and prints one report
/// per active host. CSV, JSON and per-host text exports are optional.
#[derive(Parser, Debug)]
#[command(name = "nmap-inspect")]
#[command(author = "HueCodes <huecodes@proton.me>")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Inspect Nmap XML and summarize hosts (OS, services, device guess)",
    long_about = None
)]
pub struct Cli {
    /// Export the report as CSV
    #[arg(long)]
    pub csv: bool,

    /// Create one text report file per host
    #[arg(long)]
    pub per_host: bool,

    /// Export the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Directory containing Nmap XML (-oX) files
    #[arg(long, value_name = "DIR")]
    pub scans_dir: Option<PathBuf>,

    /// CSV output path
    #[arg(long, value_name = "PATH")]
    pub csv_path: Option<PathBuf>,

    /// JSON output path
    #[arg(long, value_name = "PATH")]
    pub json_path: Option<PathBuf>,

    /// Directory for per-host report files
    #[arg(long, value_name = "DIR")]
    pub reports_dir: Option<PathBuf>,

    /// What to do when a scan file cannot be parsed
    #[arg(long, value_enum, value_name = "MODE")]
    pub on_parse_error: Option<ParseErrorMode>,

    /// Path to a JSON settings file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Default log filter for the chosen verbosity.
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Load settings and apply command-line overrides.
    pub fn resolve_config(&self) -> InspectResult<InspectConfig> {
        let settings = match &self.config {
            Some(path) => Settings::load_from(path)?,
            None => Settings::load()?,
        };

        let mut config = InspectConfig::from_settings(settings);
        if let Some(dir) = &self.scans_dir {
            config.scans_dir = dir.clone();
        }
        if let Some(path) = &self.csv_path {
            config.csv_path = path.clone();
        }
        if let Some(path) = &self.json_path {
            config.json_path = path.clone();
        }
        if let Some(dir) = &self.reports_dir {
            config.reports_dir = dir.clone();
        }
        if let Some(mode) = self.on_parse_error {
            config.on_parse_error = mode;
        }
        config.export_csv = self.csv;
        config.export_json = self.json;
        config.export_per_host = self.per_host;
        config.quiet = self.quiet;
        config.show_progress = self.verbose > 0 && console::Term::stderr().is_term();

        Ok(config)
    }

    /// Execute the run against stdout.
    pub fn execute(&self) -> InspectResult<InspectSummary> {
        let config = self.resolve_config()?;
        let stdout = io::stdout();
        let mut out = stdout.lock();
        let summary = inspect::run(&config, &mut out)?;

        if !self.quiet && summary.outcome == Outcome::Reported && summary.documents_skipped > 0 {
            output::print_warning(&format!(
                "{} scan file(s) could not be parsed and were skipped",
                summary.documents_skipped
            ));
        }

        Ok(summary)
    }
}
