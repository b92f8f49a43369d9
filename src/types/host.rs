//! Per-host records assembled from scan documents.

use super::port::PortRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// An operating-system identification with optional confidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsGuess {
    pub name: String,
    /// Confidence percentage (0-100) when the scanner reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<u8>,
}

impl OsGuess {
    pub fn new(name: impl Into<String>, accuracy: Option<u8>) -> Self {
        Self {
            name: name.into(),
            accuracy,
        }
    }

    /// Parse a declared accuracy attribute.
    ///
    /// Only plain ASCII digit strings within 0-100 are accepted.
    pub fn parse_accuracy(raw: &str) -> Option<u8> {
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        raw.parse::<u8>().ok().filter(|v| *v <= 100)
    }
}

impl fmt::Display for OsGuess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.accuracy {
            Some(acc) => write!(f, "{} (accuracy={}%)", self.name, acc),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Everything known about one IPv4 host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    pub address: Ipv4Addr,
    pub hostname: Option<String>,
    /// Open ports; sorted by port number once merged.
    pub ports: Vec<PortRecord>,
    /// OS guesses in first-seen order.
    pub os_guesses: Vec<OsGuess>,
}

impl HostRecord {
    /// Create an empty record for an address.
    pub fn new(address: Ipv4Addr) -> Self {
        Self {
            address,
            hostname: None,
            ports: Vec::new(),
            os_guesses: Vec::new(),
        }
    }

    /// Set the hostname.
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Add a port.
    pub fn with_port(mut self, port: PortRecord) -> Self {
        self.ports.push(port);
        self
    }

    /// Add an OS guess.
    pub fn with_os(mut self, guess: OsGuess) -> Self {
        self.os_guesses.push(guess);
        self
    }

    /// Whether the host has anything worth reporting.
    pub fn is_active(&self) -> bool {
        !self.ports.is_empty() || !self.os_guesses.is_empty()
    }

    /// Hostname, or `-` when unknown.
    pub fn display_hostname(&self) -> &str {
        self.hostname.as_deref().unwrap_or("-")
    }

    /// Lowercase, space-joined OS guess names.
    pub fn os_text(&self) -> String {
        self.os_guesses
            .iter()
            .map(|o| o.name.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Non-empty service names in port order, duplicates kept.
    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.ports
            .iter()
            .map(|p| p.service.as_str())
            .filter(|s| !s.is_empty())
    }

    /// Sorted, deduplicated non-empty service names.
    pub fn unique_services(&self) -> Vec<&str> {
        let mut services: Vec<&str> = self.service_names().collect();
        services.sort_unstable();
        services.dedup();
        services
    }

    /// Restore the display order invariant.
    pub(crate) fn sort_ports(&mut self) {
        self.ports.sort_by_key(|p| p.port);
    }
}
