//! # nmap-inspect - Nmap XML host summaries
//!
//! nmap-inspect reads a directory of Nmap XML (`nmap -oX`) results, merges
//! what every scan saw about the same host, guesses what kind of device each
//! host is, and reports the result as text, CSV or JSON.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use nmap_inspect::extract::extract_file;
//! use nmap_inspect::merge::{filter_active, HostCollection};
//! use nmap_inspect::classify::classify;
//! use std::path::Path;
//!
//! let a = extract_file(Path::new("scans/a.xml"))?;
//! let b = extract_file(Path::new("scans/b.xml"))?;
//! let hosts = filter_active(&HostCollection::from_documents([a, b]));
//!
//! for host in &hosts {
//!     println!("{} -> {}", host.address, classify(host));
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Port, host and OS guess records
//! - [`extract`] - Nmap XML parsing
//! - [`merge`] - Cross-document host merging and activity filtering
//! - [`classify`] - Ordered device-type rules
//! - [`output`] - Text report, CSV and JSON exports
//! - [`inspect`] - Run orchestration and parse failure policies
//! - [`config`] - Settings and run configuration
//! - [`cli`] - Command-line interface
//! - [`error`] - Error types

pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod inspect;
pub mod merge;
pub mod output;
pub mod types;

// Re-export commonly used types
pub use classify::{classify, DeviceCategory};
pub use config::InspectConfig;
pub use error::{InspectError, ParseError};
pub use inspect::{run, InspectSummary, Outcome, ParseErrorMode};
pub use merge::{filter_active, HostCollection};
pub use types::{HostRecord, OsGuess, Port, PortRecord};
