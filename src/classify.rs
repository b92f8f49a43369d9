//! Heuristic device-type classification.
//!
//! A host is matched against an ordered rule table; the first rule whose
//! predicate holds decides the category. This is a best-effort guess from
//! open ports and OS names, with no confidence attached.

use crate::types::HostRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Ports that indicate a web interface.
pub const WEB_PORTS: [u16; 5] = [80, 443, 8080, 8000, 8443];

/// Coarse device category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceCategory {
    /// Switch, router or other managed network gear.
    NetworkEquipment,
    /// Windows workstation or server.
    WindowsHost,
    /// Database or application server.
    DatabaseServer,
    /// Server exposing SSH alongside web services.
    SshWebServer,
    /// Few ports, at least one web port.
    SimpleWebDevice,
    /// Server with many open ports.
    ManyPortsServer,
    /// No open ports detected.
    NoOpenPorts,
    /// Nothing matched.
    Unknown,
}

impl DeviceCategory {
    /// Every category, in rule priority order.
    pub const ALL: [DeviceCategory; 8] = [
        Self::NetworkEquipment,
        Self::WindowsHost,
        Self::DatabaseServer,
        Self::SshWebServer,
        Self::SimpleWebDevice,
        Self::ManyPortsServer,
        Self::NoOpenPorts,
        Self::Unknown,
    ];

    /// Human-readable label used in reports and exports.
    pub const fn label(self) -> &'static str {
        match self {
            Self::NetworkEquipment => "Network equipment (switch/router)",
            Self::WindowsHost => "Windows host (PC/server)",
            Self::DatabaseServer => "Database / application server",
            Self::SshWebServer => "Server (SSH + web services)",
            Self::SimpleWebDevice => "Simple web device (possible IoT)",
            Self::ManyPortsServer => "Server (many open ports)",
            Self::NoOpenPorts => "Host (no open ports detected)",
            Self::Unknown => "Unknown / possible user workstation",
        }
    }
}

impl fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Facts about a host that the rules look at.
#[derive(Debug, Clone)]
pub struct HostFeatures {
    /// Distinct open port numbers, any protocol.
    pub ports: BTreeSet<u16>,
    /// Distinct non-empty service names.
    pub services: BTreeSet<String>,
    /// Lowercase, space-joined OS guess names.
    pub os_text: String,
}

impl HostFeatures {
    pub fn from_host(host: &HostRecord) -> Self {
        Self {
            ports: host.ports.iter().map(|p| p.port.as_u16()).collect(),
            services: host.service_names().map(str::to_string).collect(),
            os_text: host.os_text(),
        }
    }

    fn has_any_port(&self, ports: &[u16]) -> bool {
        ports.iter().any(|p| self.ports.contains(p))
    }

    fn os_mentions(&self, needles: &[&str]) -> bool {
        needles.iter().any(|n| self.os_text.contains(n))
    }

    fn has_web_port(&self) -> bool {
        self.has_any_port(&WEB_PORTS)
    }
}

/// One entry in the rule table.
pub struct Rule {
    pub name: &'static str,
    pub matches: fn(&HostFeatures) -> bool,
    pub category: DeviceCategory,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("category", &self.category)
            .finish()
    }
}

/// Classification rules, highest priority first.
pub static RULES: [Rule; 8] = [
    Rule {
        name: "network-equipment",
        matches: |h: &HostFeatures| {
            h.ports.contains(&161)
                || h.services.contains("snmp")
                || h.os_mentions(&["cisco", "router"])
        },
        category: DeviceCategory::NetworkEquipment,
    },
    Rule {
        name: "windows",
        matches: |h: &HostFeatures| {
            h.has_any_port(&[445, 139, 3389]) || h.os_mentions(&["microsoft", "windows"])
        },
        category: DeviceCategory::WindowsHost,
    },
    Rule {
        name: "database",
        matches: |h: &HostFeatures| h.has_any_port(&[3306, 5432, 1433]),
        category: DeviceCategory::DatabaseServer,
    },
    Rule {
        name: "ssh-web",
        matches: |h: &HostFeatures| h.ports.contains(&22) && h.has_web_port(),
        category: DeviceCategory::SshWebServer,
    },
    Rule {
        name: "simple-web",
        matches: |h: &HostFeatures| h.has_web_port() && h.ports.len() <= 3,
        category: DeviceCategory::SimpleWebDevice,
    },
    Rule {
        name: "many-ports",
        matches: |h: &HostFeatures| h.ports.len() >= 10,
        category: DeviceCategory::ManyPortsServer,
    },
    Rule {
        name: "no-ports",
        matches: |h: &HostFeatures| h.ports.is_empty(),
        category: DeviceCategory::NoOpenPorts,
    },
    Rule {
        name: "fallback",
        matches: |_: &HostFeatures| true,
        category: DeviceCategory::Unknown,
    },
];

/// Classify a host. Always returns a category.
pub fn classify(host: &HostRecord) -> DeviceCategory {
    classify_features(&HostFeatures::from_host(host))
}

/// Classify pre-computed host features.
pub fn classify_features(features: &HostFeatures) -> DeviceCategory {
    RULES
        .iter()
        .find(|rule| (rule.matches)(features))
        .map_or(DeviceCategory::Unknown, |rule| rule.category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OsGuess, Port, PortRecord};
    use std::net::Ipv4Addr;

    fn host(ports: &[(u16, &str, &str)]) -> HostRecord {
        ports.iter().fold(
            HostRecord::new(Ipv4Addr::new(192, 168, 1, 1)),
            |h, (n, proto, svc)| {
                h.with_port(PortRecord::new(Port::new(*n).unwrap(), *proto).with_service(svc))
            },
        )
    }

    fn tcp(ports: &[u16]) -> HostRecord {
        let specs: Vec<(u16, &str, &str)> = ports.iter().map(|p| (*p, "tcp", "")).collect();
        host(&specs)
    }

    fn rule(name: &str) -> &'static Rule {
        RULES.iter().find(|r| r.name == name).unwrap()
    }

    fn features(host: &HostRecord) -> HostFeatures {
        HostFeatures::from_host(host)
    }

    #[test]
    fn test_rule_table_covers_every_category_once() {
        let categories: Vec<DeviceCategory> = RULES.iter().map(|r| r.category).collect();
        assert_eq!(categories, DeviceCategory::ALL.to_vec());
    }

    #[test]
    fn test_network_equipment_rule() {
        let r = rule("network-equipment");
        assert!((r.matches)(&features(&tcp(&[161]))));
        assert!((r.matches)(&features(&host(&[(1161, "udp", "snmp")]))));
        let cisco = tcp(&[23]).with_os(OsGuess::new("Cisco IOS 12.X", Some(95)));
        assert!((r.matches)(&features(&cisco)));
        let router_os = OsGuess::new("Broadband Router", None);
        let router = HostRecord::new(Ipv4Addr::LOCALHOST).with_os(router_os);
        assert!((r.matches)(&features(&router)));
        assert!(!(r.matches)(&features(&tcp(&[22, 80]))));
    }

    #[test]
    fn test_windows_rule() {
        let r = rule("windows");
        for port in [445, 139, 3389] {
            assert!((r.matches)(&features(&tcp(&[port]))));
        }
        let win_os = OsGuess::new("Microsoft Windows 10", None);
        let win = HostRecord::new(Ipv4Addr::LOCALHOST).with_os(win_os);
        assert!((r.matches)(&features(&win)));
        assert!(!(r.matches)(&features(&tcp(&[135]))));
    }

    #[test]
    fn test_database_rule() {
        let r = rule("database");
        for port in [3306, 5432, 1433] {
            assert!((r.matches)(&features(&tcp(&[port]))));
        }
        assert!(!(r.matches)(&features(&tcp(&[6379]))));
    }

    #[test]
    fn test_ssh_web_rule() {
        let r = rule("ssh-web");
        assert!((r.matches)(&features(&tcp(&[22, 8443]))));
        assert!(!(r.matches)(&features(&tcp(&[22]))));
        assert!(!(r.matches)(&features(&tcp(&[80, 443]))));
    }

    #[test]
    fn test_simple_web_rule() {
        let r = rule("simple-web");
        assert!((r.matches)(&features(&tcp(&[80]))));
        assert!((r.matches)(&features(&tcp(&[80, 443, 1900]))));
        assert!(!(r.matches)(&features(&tcp(&[80, 443, 1900, 5000]))));
        assert!(!(r.matches)(&features(&tcp(&[1900]))));
    }

    #[test]
    fn test_port_counts_are_distinct_numbers() {
        let f = features(&host(&[
            (80, "tcp", "http"),
            (80, "udp", ""),
            (53, "udp", "domain"),
        ]));
        assert_eq!(f.ports.len(), 2);
    }

    #[test]
    fn test_classification_priority() {
        // SNMP beats Windows ports.
        assert_eq!(
            classify(&host(&[(161, "udp", "snmp"), (445, "tcp", "microsoft-ds")])),
            DeviceCategory::NetworkEquipment
        );
        // Windows beats databases.
        assert_eq!(classify(&tcp(&[1433, 3389])), DeviceCategory::WindowsHost);
        // Databases beat SSH + web.
        assert_eq!(classify(&tcp(&[22, 80, 5432])), DeviceCategory::DatabaseServer);
        // SSH + web beats simple web.
        assert_eq!(classify(&tcp(&[22, 80])), DeviceCategory::SshWebServer);
        assert_eq!(classify(&tcp(&[80, 1900])), DeviceCategory::SimpleWebDevice);
    }

    #[test]
    fn test_snmp_wins_regardless_of_other_ports() {
        let ports = [22, 80, 443, 445, 3306, 3389, 8080];
        let mut specs: Vec<(u16, &str, &str)> = ports.iter().map(|p| (*p, "tcp", "")).collect();
        specs.push((161, "udp", "snmp"));
        assert_eq!(classify(&host(&specs)), DeviceCategory::NetworkEquipment);
    }

    #[test]
    fn test_port_count_rules() {
        let many: Vec<u16> = (1000..1010).collect();
        assert_eq!(classify(&tcp(&many)), DeviceCategory::ManyPortsServer);

        let nine: Vec<u16> = (1000..1009).collect();
        assert_eq!(classify(&tcp(&nine)), DeviceCategory::Unknown);

        let linux = OsGuess::new("Linux 5.x", None);
        let os_only = HostRecord::new(Ipv4Addr::LOCALHOST).with_os(linux);
        assert_eq!(classify(&os_only), DeviceCategory::NoOpenPorts);
    }

    #[test]
    fn test_lone_snmp_port_differs_only_by_that_port() {
        let base = tcp(&[5000]);
        assert_eq!(classify(&base), DeviceCategory::Unknown);
        let with_snmp = base.with_port(PortRecord::new(Port::new(161).unwrap(), "udp"));
        assert_eq!(classify(&with_snmp), DeviceCategory::NetworkEquipment);
    }

    #[test]
    fn test_labels_are_distinct() {
        let labels: BTreeSet<&str> = DeviceCategory::ALL.iter().map(|c| c.label()).collect();
        assert_eq!(labels.len(), 8);
    }
}
