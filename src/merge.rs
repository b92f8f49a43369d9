//! Cross-document host merging.
//!
//! Merging is a reduction with the empty collection as identity: a new
//! sighting only ever adds ports, OS guesses, or a missing hostname to an
//! existing record. Earlier values are never overwritten, so merging the
//! same document twice changes nothing.

use crate::types::{HostRecord, Port};
use std::collections::btree_map::{self, BTreeMap};
use std::collections::HashSet;
use std::net::Ipv4Addr;

impl HostRecord {
    /// Fold another sighting of the same host into this record.
    ///
    /// Ports are keyed by `(port, protocol)`, OS guesses by name; the first
    /// sighting of a key wins. The hostname is filled in only when absent.
    pub fn merge(&mut self, other: HostRecord) {
        debug_assert_eq!(self.address, other.address);

        let mut seen_ports: HashSet<(Port, String)> = self
            .ports
            .iter()
            .map(|p| (p.port, p.protocol.clone()))
            .collect();
        for port in other.ports {
            let (number, protocol) = port.key();
            if seen_ports.insert((number, protocol.to_string())) {
                self.ports.push(port);
            }
        }

        let mut seen_os: HashSet<String> =
            self.os_guesses.iter().map(|o| o.name.clone()).collect();
        for guess in other.os_guesses {
            if seen_os.insert(guess.name.clone()) {
                self.os_guesses.push(guess);
            }
        }

        if self.hostname.is_none() {
            self.hostname = other.hostname;
        }

        self.sort_ports();
    }
}

/// All hosts seen so far, keyed and ordered by numeric IPv4 address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostCollection {
    hosts: BTreeMap<Ipv4Addr, HostRecord>,
}

impl HostCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, merging it into any existing record for the address.
    pub fn merge_record(&mut self, record: HostRecord) {
        match self.hosts.entry(record.address) {
            btree_map::Entry::Vacant(slot) => {
                // Folding into an empty record also drops repeated keys
                // within a single sighting.
                let mut fresh = HostRecord::new(record.address);
                fresh.merge(record);
                slot.insert(fresh);
            }
            btree_map::Entry::Occupied(mut slot) => slot.get_mut().merge(record),
        }
    }

    /// Merge every record of one document, in document order.
    pub fn merge_document(&mut self, records: impl IntoIterator<Item = HostRecord>) {
        for record in records {
            self.merge_record(record);
        }
    }

    /// Merge another collection into this one.
    pub fn merge_collection(&mut self, other: HostCollection) {
        self.merge_document(other.hosts.into_values());
    }

    /// Build a collection from documents given in discovery order.
    pub fn from_documents<I, D>(documents: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: IntoIterator<Item = HostRecord>,
    {
        let mut collection = Self::new();
        for document in documents {
            collection.merge_document(document);
        }
        collection
    }

    /// Look up a host.
    pub fn get(&self, address: &Ipv4Addr) -> Option<&HostRecord> {
        self.hosts.get(address)
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Hosts in ascending numeric IPv4 order.
    pub fn iter(&self) -> impl Iterator<Item = &HostRecord> {
        self.hosts.values()
    }
}

impl FromIterator<HostRecord> for HostCollection {
    fn from_iter<T: IntoIterator<Item = HostRecord>>(iter: T) -> Self {
        let mut collection = Self::new();
        collection.merge_document(iter);
        collection
    }
}

impl<'a> IntoIterator for &'a HostCollection {
    type Item = &'a HostRecord;
    type IntoIter = btree_map::Values<'a, Ipv4Addr, HostRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.hosts.values()
    }
}

/// Hosts with at least one open port or OS guess.
///
/// Returns a new collection; the input is left untouched.
pub fn filter_active(hosts: &HostCollection) -> HostCollection {
    HostCollection {
        hosts: hosts
            .hosts
            .iter()
            .filter(|(_, record)| record.is_active())
            .map(|(addr, record)| (*addr, record.clone()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OsGuess, PortRecord};

    fn ip(last: u8) -> Ipv4Addr {
        Ipv4Addr::new(10, 0, 0, last)
    }

    fn port(n: u16, proto: &str, service: &str) -> PortRecord {
        PortRecord::new(Port::new(n).unwrap(), proto).with_service(service)
    }

    fn doc_a() -> Vec<HostRecord> {
        vec![HostRecord::new(ip(5)).with_port(port(22, "tcp", "ssh"))]
    }

    fn doc_b() -> Vec<HostRecord> {
        vec![
            HostRecord::new(ip(5))
                .with_hostname("web1")
                .with_port(port(80, "tcp", "http"))
                .with_os(OsGuess::new("Linux 5.x", Some(92))),
            HostRecord::new(ip(7)),
        ]
    }

    #[test]
    fn test_two_document_scenario() {
        let hosts = HostCollection::from_documents([doc_a(), doc_b()]);
        let host = hosts.get(&ip(5)).unwrap();

        assert_eq!(
            host.ports,
            vec![port(22, "tcp", "ssh"), port(80, "tcp", "http")]
        );
        assert_eq!(host.hostname.as_deref(), Some("web1"));
        assert_eq!(host.os_guesses, vec![OsGuess::new("Linux 5.x", Some(92))]);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let once = HostCollection::from_documents([doc_b()]);
        let twice = HostCollection::from_documents([doc_b(), doc_b()]);
        assert_eq!(once, twice);

        let mut again = once.clone();
        again.merge_collection(once.clone());
        assert_eq!(again, once);
    }

    #[test]
    fn test_empty_collection_is_identity() {
        let hosts = HostCollection::from_documents([doc_a(), doc_b()]);
        let mut merged = HostCollection::new();
        merged.merge_collection(hosts.clone());
        assert_eq!(merged, hosts);
    }

    #[test]
    fn test_first_sighting_wins_for_duplicate_keys() {
        let first = HostRecord::new(ip(1))
            .with_port(port(80, "tcp", "http").with_product("nginx", "1.0"))
            .with_os(OsGuess::new("Linux", Some(90)));
        let second = HostRecord::new(ip(1))
            .with_port(port(80, "tcp", "http-alt").with_product("apache", "2.4"))
            .with_port(port(80, "udp", ""))
            .with_os(OsGuess::new("Linux", Some(50)));

        let hosts = HostCollection::from_documents([vec![first], vec![second]]);
        let host = hosts.get(&ip(1)).unwrap();

        assert_eq!(host.ports.len(), 2);
        assert_eq!(host.ports[0].service, "http");
        assert_eq!(host.ports[0].product, "nginx");
        assert_eq!(host.ports[1].protocol, "udp");
        assert_eq!(host.os_guesses, vec![OsGuess::new("Linux", Some(90))]);
    }

    #[test]
    fn test_repeated_keys_within_one_sighting_collapse() {
        let sighting = HostRecord::new(ip(1))
            .with_port(port(22, "tcp", "ssh").with_product("OpenSSH", "9.6"))
            .with_port(port(22, "tcp", "ssh").with_product("Dropbear", ""))
            .with_os(OsGuess::new("Linux", Some(90)))
            .with_os(OsGuess::new("Linux", Some(40)));
        let again = HostRecord::new(ip(1)).with_port(port(22, "tcp", "ssh-alt"));

        let hosts = HostCollection::from_documents([vec![sighting, again]]);
        let host = hosts.get(&ip(1)).unwrap();

        assert_eq!(hosts.len(), 1);
        assert_eq!(host.ports.len(), 1);
        assert_eq!(host.ports[0].service, "ssh");
        assert_eq!(host.ports[0].product, "OpenSSH");
        assert_eq!(host.os_guesses, vec![OsGuess::new("Linux", Some(90))]);
    }

    #[test]
    fn test_hostname_is_monotonic() {
        let mut record = HostRecord::new(ip(1)).with_hostname("alpha");
        record.merge(HostRecord::new(ip(1)));
        assert_eq!(record.hostname.as_deref(), Some("alpha"));
        record.merge(HostRecord::new(ip(1)).with_hostname("beta"));
        assert_eq!(record.hostname.as_deref(), Some("alpha"));
    }

    #[test]
    fn test_ports_sorted_without_duplicates() {
        let docs = [
            vec![HostRecord::new(ip(1))
                .with_port(port(443, "tcp", "https"))
                .with_port(port(22, "tcp", "ssh"))],
            vec![HostRecord::new(ip(1))
                .with_port(port(8080, "tcp", "http-proxy"))
                .with_port(port(22, "tcp", "ssh"))
                .with_port(port(53, "udp", "domain"))],
        ];
        let hosts = HostCollection::from_documents(docs);
        let host = hosts.get(&ip(1)).unwrap();

        let numbers: Vec<u16> = host.ports.iter().map(|p| p.port.as_u16()).collect();
        assert_eq!(numbers, vec![22, 53, 443, 8080]);
    }

    #[test]
    fn test_os_guesses_keep_arrival_order() {
        let docs = [
            vec![HostRecord::new(ip(1)).with_os(OsGuess::new("B", None))],
            vec![HostRecord::new(ip(1))
                .with_os(OsGuess::new("A", None))
                .with_os(OsGuess::new("B", Some(10)))
                .with_os(OsGuess::new("C", None))],
        ];
        let hosts = HostCollection::from_documents(docs);
        let names: Vec<&str> = hosts
            .get(&ip(1))
            .unwrap()
            .os_guesses
            .iter()
            .map(|o| o.name.as_str())
            .collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_iteration_is_numeric() {
        let hosts: HostCollection = [ip(10), ip(2), Ipv4Addr::new(9, 255, 255, 255)]
            .into_iter()
            .map(HostRecord::new)
            .collect();
        let order: Vec<String> = hosts.iter().map(|h| h.address.to_string()).collect();
        assert_eq!(order, vec!["9.255.255.255", "10.0.0.2", "10.0.0.10"]);
    }

    #[test]
    fn test_filter_active_is_pure() {
        let hosts = HostCollection::from_documents([doc_a(), doc_b()]);
        let before = hosts.clone();
        let active = filter_active(&hosts);

        assert_eq!(hosts, before);
        assert_eq!(hosts.len(), 2);
        assert_eq!(active.len(), 1);
        assert!(active.get(&ip(5)).is_some());
        assert!(active.get(&ip(7)).is_none());
    }

    #[test]
    fn test_filter_keeps_os_only_hosts() {
        let hosts: HostCollection = [
            HostRecord::new(ip(1)).with_os(OsGuess::new("Linux", None)),
            HostRecord::new(ip(2)).with_port(port(22, "tcp", "ssh")),
            HostRecord::new(ip(3)),
        ]
        .into_iter()
        .collect();
        let active = filter_active(&hosts);
        let kept: Vec<Ipv4Addr> = active.iter().map(|h| h.address).collect();
        assert_eq!(kept, vec![ip(1), ip(2)]);
    }
}
