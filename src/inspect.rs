//! Inspection run orchestration.
//!
//! Drives extraction, merging, filtering and reporting for one scans
//! directory. Report text goes to a caller-supplied writer so the whole run
//! can be exercised without touching stdout.

use crate::config::InspectConfig;
use crate::error::{InspectError, InspectResult, ParseError, ParseResult, ReportError};
use crate::extract::extract_file;
use crate::merge::{filter_active, HostCollection};
use crate::output;
use crate::types::HostRecord;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What to do when a scan document fails to parse.
pub trait ParseFailurePolicy {
    /// Return `Ok(())` to skip the document and continue, or an error to
    /// abort the run.
    fn on_failure(&self, error: ParseError) -> ParseResult<()>;
}

/// Abort the whole run on the first malformed document.
#[derive(Debug, Default, Clone, Copy)]
pub struct Abort;

impl ParseFailurePolicy for Abort {
    fn on_failure(&self, error: ParseError) -> ParseResult<()> {
        Err(error)
    }
}

/// Log the failure and carry on with the remaining documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct SkipAndWarn;

impl ParseFailurePolicy for SkipAndWarn {
    fn on_failure(&self, error: ParseError) -> ParseResult<()> {
        warn!(file = %error.path().display(), %error, "skipping unreadable scan document");
        Ok(())
    }
}

/// Selectable parse failure policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ParseErrorMode {
    /// Stop at the first malformed document
    #[default]
    Abort,
    /// Skip malformed documents with a warning
    Skip,
}

impl ParseErrorMode {
    pub fn policy(self) -> Box<dyn ParseFailurePolicy> {
        match self {
            Self::Abort => Box::new(Abort),
            Self::Skip => Box::new(SkipAndWarn),
        }
    }
}

impl fmt::Display for ParseErrorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => write!(f, "abort"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The scans directory does not exist.
    MissingScansDir,
    /// Documents were read but no host had ports or OS guesses.
    NoActiveHosts,
    /// Host reports were produced.
    Reported,
}

/// Result of a run, for callers that need more than the printed report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectSummary {
    pub outcome: Outcome,
    pub documents_read: usize,
    pub documents_skipped: usize,
    pub hosts_seen: usize,
    pub active_hosts: usize,
    pub files_written: Vec<PathBuf>,
}

impl InspectSummary {
    fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            documents_read: 0,
            documents_skipped: 0,
            hosts_seen: 0,
            active_hosts: 0,
            files_written: Vec::new(),
        }
    }
}

/// Hosts merged from a set of documents, with bookkeeping.
#[derive(Debug, Default)]
pub struct Gathered {
    pub hosts: HostCollection,
    pub documents_read: usize,
    pub documents_skipped: usize,
}

/// List `*.xml` files directly inside `dir`, sorted by file name.
///
/// Hidden files (names starting with `.`) are not scan documents.
pub fn list_documents(dir: &Path) -> InspectResult<Vec<PathBuf>> {
    let list_err = |source: std::io::Error| InspectError::ListDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut documents = Vec::new();
    for entry in fs::read_dir(dir).map_err(list_err)? {
        let path = entry.map_err(list_err)?.path();
        let hidden = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with('.'));
        if !hidden && path.is_file() && path.extension().is_some_and(|ext| ext == "xml") {
            documents.push(path);
        }
    }
    documents.sort();
    Ok(documents)
}

/// Extract and merge every document, in order.
pub fn gather_hosts(
    documents: &[PathBuf],
    policy: &dyn ParseFailurePolicy,
    progress: Option<&ProgressBar>,
) -> ParseResult<Gathered> {
    let mut gathered = Gathered::default();

    for path in documents {
        if let Some(pb) = progress {
            pb.set_message(path.display().to_string());
        }

        match extract_file(path) {
            Ok(records) => {
                debug!(file = %path.display(), hosts = records.len(), "parsed scan document");
                gathered.hosts.merge_document(records);
                gathered.documents_read += 1;
            }
            Err(err) => {
                policy.on_failure(err)?;
                gathered.documents_skipped += 1;
            }
        }

        if let Some(pb) = progress {
            pb.inc(1);
        }
    }

    Ok(gathered)
}

/// Run a full inspection, writing the report to `out`.
pub fn run<W: Write>(config: &InspectConfig, out: &mut W) -> InspectResult<InspectSummary> {
    if !config.scans_dir.is_dir() {
        writeln!(
            out,
            "The directory {} does not exist. Put your nmap -oX files in it.",
            config.scans_dir.display()
        )
        .map_err(ReportError::from)?;
        return Ok(InspectSummary::new(Outcome::MissingScansDir));
    }

    let documents = list_documents(&config.scans_dir)?;
    info!(
        dir = %config.scans_dir.display(),
        documents = documents.len(),
        "reading scan documents"
    );

    let progress = config.show_progress.then(|| new_progress_bar(documents.len()));
    let policy = config.on_parse_error.policy();
    let gathered = gather_hosts(&documents, policy.as_ref(), progress.as_ref())?;
    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }

    let active = filter_active(&gathered.hosts);
    let mut summary = InspectSummary {
        outcome: Outcome::Reported,
        documents_read: gathered.documents_read,
        documents_skipped: gathered.documents_skipped,
        hosts_seen: gathered.hosts.len(),
        active_hosts: active.len(),
        files_written: Vec::new(),
    };

    if active.is_empty() {
        writeln!(
            out,
            "No active hosts found in {}",
            config.scans_dir.display()
        )
        .map_err(ReportError::from)?;
        summary.outcome = Outcome::NoActiveHosts;
        return Ok(summary);
    }

    output::write_report(out, &active).map_err(ReportError::from)?;

    let mut status = |line: String| -> InspectResult<()> {
        if !config.quiet {
            writeln!(out, "{}", line).map_err(ReportError::from)?;
        }
        Ok(())
    };

    if config.export_per_host {
        status(format!(
            "Writing per-host files into '{}/' ...",
            config.reports_dir.display()
        ))?;
        for path in export_per_host(&active, &config.reports_dir)? {
            status(format!("[file] {}", path.display()))?;
            summary.files_written.push(path);
        }
    }

    if config.export_csv {
        export_to_file(&config.csv_path, |w| output::write_csv(w, &active))?;
        status(format!("CSV exported: {}", config.csv_path.display()))?;
        summary.files_written.push(config.csv_path.clone());
    }

    if config.export_json {
        export_to_file(&config.json_path, |w| output::write_json(w, &active))?;
        status(format!("JSON exported: {}", config.json_path.display()))?;
        summary.files_written.push(config.json_path.clone());
    }

    Ok(summary)
}

fn new_progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb
}

/// Keep alphanumerics, `.`, `_` and `-`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect()
}

/// File name for a host's report, e.g. `001_10.0.0.5_web1.txt`.
pub fn host_report_name(index: usize, host: &HostRecord) -> String {
    sanitize_filename(&format!(
        "{:03}_{}_{}.txt",
        index,
        host.address,
        host.display_hostname()
    ))
}

/// Write one text report per host into `dir`, creating it if needed.
pub fn export_per_host(hosts: &HostCollection, dir: &Path) -> InspectResult<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|e| ReportError::WriteFailed {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut written = Vec::with_capacity(hosts.len());
    for (idx, host) in hosts.iter().enumerate() {
        let index = idx + 1;
        let path = dir.join(host_report_name(index, host));
        fs::write(&path, output::render_host_file(index, host)).map_err(|e| {
            ReportError::WriteFailed {
                path: path.clone(),
                reason: e.to_string(),
            }
        })?;
        info!(file = %path.display(), "wrote host report");
        written.push(path);
    }
    Ok(written)
}

fn export_to_file<F>(path: &Path, write: F) -> InspectResult<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), ReportError>,
{
    let file = File::create(path).map_err(|e| ReportError::WriteFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let mut writer = BufWriter::new(file);
    write(&mut writer)?;
    writer.flush().map_err(ReportError::from)?;
    info!(file = %path.display(), "wrote export");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("001_10.0.0.5_web1.txt"), "001_10.0.0.5_web1.txt");
        assert_eq!(
            sanitize_filename("002_10.0.0.6_my host/../x:y.txt"),
            "002_10.0.0.6_myhost..xy.txt"
        );
    }

    #[test]
    fn test_host_report_name_without_hostname() {
        let host = HostRecord::new(Ipv4Addr::new(192, 168, 0, 1));
        assert_eq!(host_report_name(7, &host), "007_192.168.0.1_-.txt");
    }

    #[test]
    fn test_abort_policy_propagates() {
        let err = ParseError::Empty {
            path: PathBuf::from("a.xml"),
        };
        assert!(Abort.on_failure(err).is_err());
    }

    #[test]
    fn test_skip_policy_continues() {
        let err = ParseError::Empty {
            path: PathBuf::from("a.xml"),
        };
        assert!(SkipAndWarn.on_failure(err).is_ok());
    }

    #[test]
    fn test_mode_selects_policy() {
        let err = || ParseError::Empty {
            path: PathBuf::from("a.xml"),
        };
        assert!(ParseErrorMode::Abort.policy().on_failure(err()).is_err());
        assert!(ParseErrorMode::Skip.policy().on_failure(err()).is_ok());
        assert_eq!(ParseErrorMode::default(), ParseErrorMode::Abort);
    }

    #[test]
    fn test_list_documents_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.xml", "a.xml", "notes.txt", "c.XML.bak", ".hidden.xml"] {
            fs::write(dir.path().join(name), "<nmaprun/>").unwrap();
        }
        fs::create_dir(dir.path().join("nested.xml")).unwrap();

        let docs = list_documents(dir.path()).unwrap();
        let names: Vec<_> = docs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.xml", "b.xml"]);
    }
}
