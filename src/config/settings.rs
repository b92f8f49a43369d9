//! Persistent settings.
//!
//! Settings are read from a JSON file: an explicit `--config` path, or
//! `settings.json` in the XDG config directory when it exists.

use crate::error::{ConfigError, ConfigResult};
use crate::inspect::ParseErrorMode;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default input directory.
pub const DEFAULT_SCANS_DIR: &str = "scans";
/// Default CSV export path.
pub const DEFAULT_CSV_PATH: &str = "nmap_inspect_report.csv";
/// Default JSON export path.
pub const DEFAULT_JSON_PATH: &str = "nmap_inspect_report.json";
/// Default per-host report directory.
pub const DEFAULT_REPORTS_DIR: &str = "reports";

/// Location of the default settings file (~/.config/nmap-inspect/settings.json).
///
/// Returns `None` when no home directory can be determined.
pub fn default_settings_file() -> Option<PathBuf> {
    ProjectDirs::from("com", "nmap-inspect", "nmap-inspect")
        .map(|project| project.config_dir().join("settings.json"))
}

/// User-adjustable defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the Nmap XML files.
    pub scans_dir: PathBuf,
    /// Destination of the CSV export.
    pub csv_path: PathBuf,
    /// Destination of the JSON export.
    pub json_path: PathBuf,
    /// Directory for per-host report files.
    pub reports_dir: PathBuf,
    /// What to do when a scan document cannot be parsed.
    pub on_parse_error: ParseErrorMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scans_dir: PathBuf::from(DEFAULT_SCANS_DIR),
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            json_path: PathBuf::from(DEFAULT_JSON_PATH),
            reports_dir: PathBuf::from(DEFAULT_REPORTS_DIR),
            on_parse_error: ParseErrorMode::Abort,
        }
    }
}

impl Settings {
    /// Load settings from the default location, falling back to defaults
    /// when the file does not exist.
    pub fn load() -> ConfigResult<Self> {
        match default_settings_file() {
            Some(file) if file.exists() => Self::load_from(&file),
            _ => Ok(Self::default()),
        }
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.scans_dir, PathBuf::from("scans"));
        assert_eq!(settings.csv_path, PathBuf::from("nmap_inspect_report.csv"));
        assert_eq!(settings.reports_dir, PathBuf::from("reports"));
        assert_eq!(settings.on_parse_error, ParseErrorMode::Abort);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("settings.json");
        let content = r#"{ "scans_dir": "/data/nmap", "on_parse_error": "skip" }"#;
        fs::write(&file, content).unwrap();

        let settings = Settings::load_from(&file).unwrap();
        assert_eq!(settings.scans_dir, PathBuf::from("/data/nmap"));
        assert_eq!(settings.on_parse_error, ParseErrorMode::Skip);
        assert_eq!(settings.reports_dir, PathBuf::from("reports"));
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("settings.json");
        fs::write(&file, "scans_dir = 'x'").unwrap();

        assert!(matches!(
            Settings::load_from(&file),
            Err(ConfigError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Settings::load_from(&dir.path().join("nope.json")),
            Err(ConfigError::ReadFailed { .. })
        ));
    }
}
