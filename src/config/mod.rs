//! Configuration management for nmap-inspect.
//!
//! [`Settings`] are the persisted defaults; [`InspectConfig`] is the
//! resolved configuration handed to the orchestrator.

mod settings;

pub use settings::{
    default_settings_file, Settings, DEFAULT_CSV_PATH, DEFAULT_JSON_PATH, DEFAULT_REPORTS_DIR,
    DEFAULT_SCANS_DIR,
};

use crate::inspect::ParseErrorMode;
use std::path::PathBuf;

/// Everything one inspection run needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectConfig {
    pub scans_dir: PathBuf,
    pub csv_path: PathBuf,
    pub json_path: PathBuf,
    pub reports_dir: PathBuf,
    /// Write the CSV export.
    pub export_csv: bool,
    /// Write the JSON export.
    pub export_json: bool,
    /// Write one text report per host.
    pub export_per_host: bool,
    pub on_parse_error: ParseErrorMode,
    /// Show a progress bar while reading documents.
    pub show_progress: bool,
    /// Print only the host report, without export status lines.
    pub quiet: bool,
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self::from_settings(Settings::default())
    }
}

impl InspectConfig {
    /// Start from persisted settings with every export disabled.
    pub fn from_settings(settings: Settings) -> Self {
        Self {
            scans_dir: settings.scans_dir,
            csv_path: settings.csv_path,
            json_path: settings.json_path,
            reports_dir: settings.reports_dir,
            export_csv: false,
            export_json: false,
            export_per_host: false,
            on_parse_error: settings.on_parse_error,
            show_progress: false,
            quiet: false,
        }
    }

    /// Read scan documents from `dir`.
    pub fn with_scans_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scans_dir = dir.into();
        self
    }

    /// Enable the CSV export, written to `path`.
    pub fn with_csv(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_csv = true;
        self.csv_path = path.into();
        self
    }

    /// Enable the JSON export, written to `path`.
    pub fn with_json(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_json = true;
        self.json_path = path.into();
        self
    }

    /// Enable per-host report files under `dir`.
    pub fn with_per_host(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_per_host = true;
        self.reports_dir = dir.into();
        self
    }

    pub fn with_parse_error_mode(mut self, mode: ParseErrorMode) -> Self {
        self.on_parse_error = mode;
        self
    }

    /// Suppress status lines around the report.
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_settings() {
        let config = InspectConfig::default();
        assert_eq!(config.scans_dir, PathBuf::from(DEFAULT_SCANS_DIR));
        assert_eq!(config.csv_path, PathBuf::from(DEFAULT_CSV_PATH));
        assert_eq!(config.json_path, PathBuf::from(DEFAULT_JSON_PATH));
        assert_eq!(config.reports_dir, PathBuf::from(DEFAULT_REPORTS_DIR));
        assert!(!config.export_csv && !config.export_json && !config.export_per_host);
    }

    #[test]
    fn test_builders_enable_exports() {
        let config = InspectConfig::default()
            .with_csv("out.csv")
            .with_per_host("hosts");
        assert!(config.export_csv);
        assert!(config.export_per_host);
        assert!(!config.export_json);
        assert_eq!(config.reports_dir, PathBuf::from("hosts"));
    }
}
