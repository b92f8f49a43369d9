//! JSON output formatting.

use crate::classify::{classify, DeviceCategory};
use crate::error::ReportResult;
use crate::merge::HostCollection;
use crate::types::{HostRecord, OsGuess, PortRecord};
use serde::Serialize;
use std::io::Write;
use std::net::Ipv4Addr;

/// One host in the JSON export.
#[derive(Debug, Serialize)]
pub struct JsonHost<'a> {
    pub ip: Ipv4Addr,
    pub hostname: Option<&'a str>,
    pub os: &'a [OsGuess],
    pub ports: &'a [PortRecord],
    pub device: DeviceCategory,
    pub device_guess: &'static str,
}

impl<'a> JsonHost<'a> {
    pub fn from_host(host: &'a HostRecord) -> Self {
        let device = classify(host);
        Self {
            ip: host.address,
            hostname: host.hostname.as_deref(),
            os: &host.os_guesses,
            ports: &host.ports,
            device,
            device_guess: device.label(),
        }
    }
}

/// Write all hosts as a pretty-printed JSON array.
pub fn write_json<W: Write>(mut writer: W, hosts: &HostCollection) -> ReportResult<()> {
    let rows: Vec<JsonHost<'_>> = hosts.iter().map(JsonHost::from_host).collect();
    serde_json::to_writer_pretty(&mut writer, &rows)?;
    writeln!(writer)?;
    Ok(())
}
