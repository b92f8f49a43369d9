//! CSV output formatting.

use super::ExportRow;
use crate::error::ReportResult;
use crate::merge::HostCollection;
use std::io;

/// Write one row per host, with a header row, in numeric address order.
pub fn write_csv<W: io::Write>(writer: W, hosts: &HostCollection) -> ReportResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    for host in hosts {
        wtr.serialize(ExportRow::from_host(host))?;
    }

    // serialize() only emits the header alongside the first row.
    if hosts.is_empty() {
        wtr.write_record(ExportRow::HEADER)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Render the CSV export to a string.
pub fn generate_csv(hosts: &HostCollection) -> ReportResult<String> {
    let mut buf = Vec::new();
    write_csv(&mut buf, hosts)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
