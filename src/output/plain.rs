//! Plain text output formatting.
//!
//! Produces the per-host text block shared by the terminal report and the
//! per-host report files, plus the styled status helpers.

use crate::classify::classify;
use crate::merge::HostCollection;
use crate::types::HostRecord;
use console::style;
use std::io::{self, Write};

/// Maximum number of entries on the frequent-services line.
pub const TOP_SERVICES: usize = 5;

/// Render one host as text, without a trailing newline.
pub fn render_host(host: &HostRecord) -> String {
    let mut lines = Vec::new();

    lines.push(format!(
        "IP: {}    Hostname: {}",
        host.address,
        host.display_hostname()
    ));

    if host.os_guesses.is_empty() {
        lines.push("Detected OS: -".to_string());
    } else {
        let guesses: Vec<String> = host.os_guesses.iter().map(|o| o.to_string()).collect();
        lines.push(format!("Detected OS: {}", guesses.join(" ; ")));
    }

    if host.ports.is_empty() {
        lines.push("Open ports: none".to_string());
    } else {
        lines.push(format!("Open ports ({}):", host.ports.len()));
        for port in &host.ports {
            let service = if port.service.is_empty() {
                "-"
            } else {
                port.service.as_str()
            };
            let product = port.product_line();
            let product = if product.is_empty() { "-" } else { product.as_str() };
            lines.push(format!(
                "  - {}/{}: {}  | {}",
                port.port, port.protocol, service, product
            ));
        }
    }

    let top = frequent_services(host, TOP_SERVICES);
    if !top.is_empty() {
        let entries: Vec<String> = top
            .iter()
            .map(|(service, count)| format!("{}({})", service, count))
            .collect();
        lines.push(format!("Frequent services: {}", entries.join(", ")));
    }

    lines.push(format!("Device type guess: {}", classify(host)));

    lines.join("\n")
}

/// Most common non-empty service names, most frequent first.
///
/// Ties keep the order in which the services were first encountered.
pub fn frequent_services(host: &HostRecord, limit: usize) -> Vec<(&str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for service in host.service_names() {
        match counts.iter_mut().find(|(name, _)| *name == service) {
            Some((_, count)) => *count += 1,
            None => counts.push((service, 1)),
        }
    }
    // Stable sort keeps first-seen order among equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(limit);
    counts
}

/// Banner line opening a host's terminal report.
pub fn host_banner(index: usize, host: &HostRecord) -> String {
    format!("=== Host #{} — {} ===", index, host.address)
}

/// Write the numbered, bordered report for every host.
pub fn write_report<W: Write>(out: &mut W, hosts: &HostCollection) -> io::Result<()> {
    writeln!(
        out,
        "{} active hosts found. Per-device details:",
        style(hosts.len()).green().bold()
    )?;
    writeln!(out)?;

    for (idx, host) in hosts.iter().enumerate() {
        let banner = host_banner(idx + 1, host);
        let rule_len = banner.chars().count().max(40);

        writeln!(out, "{}", style(&banner).cyan().bold())?;
        writeln!(out, "{}", render_host(host))?;
        writeln!(out, "{}", style("=".repeat(rule_len)).cyan())?;
        writeln!(out)?;
    }

    Ok(())
}

/// Contents of a per-host report file.
pub fn render_host_file(index: usize, host: &HostRecord) -> String {
    format!("--- Host report #{} ---\n{}\n", index, render_host(host))
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}
