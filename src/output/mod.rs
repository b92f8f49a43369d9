//! Output formatting module.
//!
//! Provides the plain text host report and the CSV and JSON exports.

mod csv_format;
mod json_format;
mod plain;

pub use csv_format::{generate_csv, write_csv};
pub use json_format::{write_json, JsonHost};
pub use plain::{
    frequent_services, host_banner, print_error, print_warning, render_host, render_host_file,
    write_report, TOP_SERVICES,
};

use crate::classify::classify;
use crate::types::HostRecord;
use serde::Serialize;

/// One row of the tabular export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub ip: String,
    pub hostname: String,
    /// OS guess names joined by `;`.
    pub os_detected: String,
    pub num_ports: usize,
    /// Sorted unique service names joined by `;`.
    pub top_services: String,
    pub device_guess: String,
    /// `port/protocol:service` entries joined by `;`.
    pub ports_list: String,
}

impl ExportRow {
    pub const HEADER: [&'static str; 7] = [
        "ip",
        "hostname",
        "os_detected",
        "num_ports",
        "top_services",
        "device_guess",
        "ports_list",
    ];

    pub fn from_host(host: &HostRecord) -> Self {
        Self {
            ip: host.address.to_string(),
            hostname: host.hostname.clone().unwrap_or_default(),
            os_detected: host
                .os_guesses
                .iter()
                .map(|o| o.name.as_str())
                .collect::<Vec<_>>()
                .join(";"),
            num_ports: host.ports.len(),
            top_services: host.unique_services().join(";"),
            device_guess: classify(host).label().to_string(),
            ports_list: host
                .ports
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(";"),
        }
    }
}
