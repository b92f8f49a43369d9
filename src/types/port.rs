//! Port types with validation.
//!
//! The `Port` newtype ensures values are always valid port numbers (1-65535).
//! `PortRecord` is one open port as reported by a scan document.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A validated network port number (1-65535).
///
/// Using a newtype prevents accidental misuse of raw u16 values
/// and ensures port numbers are always valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Port(u16);

impl Port {
    /// Minimum valid port number.
    pub const MIN: u16 = 1;
    /// Maximum valid port number.
    pub const MAX: u16 = 65535;

    /// Create a new Port from a u16, returning None if invalid.
    #[inline]
    pub const fn new(port: u16) -> Option<Self> {
        if port >= Self::MIN {
            Some(Self(port))
        } else {
            None
        }
    }

    /// Get the raw port number.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for Port {
    type Error = PortError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(PortError::OutOfRange(value))
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

impl FromStr for Port {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: u16 = s
            .trim()
            .parse()
            .map_err(|_| PortError::InvalidFormat(s.to_string()))?;
        Self::try_from(raw)
    }
}

/// Error type for port parsing and validation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PortError {
    #[error("port {0} is out of valid range (1-65535)")]
    OutOfRange(u16),
    #[error("invalid port number: {0}")]
    InvalidFormat(String),
}

/// An open port observed on a host.
///
/// Two records describe the same port when their `(port, protocol)` keys
/// match; the remaining fields are metadata from whichever sighting came
/// first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRecord {
    pub port: Port,
    pub protocol: String,
    /// Lowercased service name, empty when the scan did not identify one.
    pub service: String,
    pub product: String,
    pub version: String,
}

impl PortRecord {
    /// Create a record with no service metadata.
    pub fn new(port: Port, protocol: impl Into<String>) -> Self {
        Self {
            port,
            protocol: protocol.into(),
            service: String::new(),
            product: String::new(),
            version: String::new(),
        }
    }

    /// Set the service name, normalized to lowercase.
    pub fn with_service(mut self, service: &str) -> Self {
        self.service = service.to_lowercase();
        self
    }

    /// Set product and version strings.
    pub fn with_product(mut self, product: impl Into<String>, version: impl Into<String>) -> Self {
        self.product = product.into();
        self.version = version.into();
        self
    }

    /// Identity key used for deduplication.
    pub fn key(&self) -> (Port, &str) {
        (self.port, self.protocol.as_str())
    }

    /// `"product version"`, trimmed; empty when neither is known.
    pub fn product_line(&self) -> String {
        format!("{} {}", self.product, self.version).trim().to_string()
    }
}

impl fmt::Display for PortRecord {
    /// Compact `port/protocol:service` form used in exports.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.port, self.protocol, self.service)
    }
}
