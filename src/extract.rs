//! Nmap XML record extraction.
//!
//! Streams an `nmap -oX` document with `quick-xml` and yields one
//! [`HostRecord`] per `<host>` element that carries an IPv4 address.
//! Only elements at their expected nesting are considered:
//!
//! ```text
//! <nmaprun>
//!   <host>
//!     <address addrtype="ipv4" addr="..."/>
//!     <hostnames><hostname name="..."/></hostnames>
//!     <ports><port protocol="tcp" portid="22">
//!       <state state="open"/><service name="ssh" product="..." version="..."/>
//!     </port></ports>
//!     <os><osmatch name="..." accuracy="..."/></os>
//!   </host>
//! </nmaprun>
//! ```

use crate::error::{ParseError, ParseResult};
use crate::types::{HostRecord, OsGuess, Port, PortRecord};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read and extract hosts from one scan document on disk.
pub fn extract_file(path: &Path) -> ParseResult<Vec<HostRecord>> {
    let content = fs::read_to_string(path).map_err(|source| ParseError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    extract_str(&content, path)
}

/// Extract hosts from document text. `origin` is only used for error reporting.
///
/// Hosts are returned in document order. Hosts without a usable IPv4
/// address are skipped; structural problems in the XML are errors.
pub fn extract_str(xml: &str, origin: &Path) -> ParseResult<Vec<HostRecord>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut walker = DocumentWalker::new(origin);

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                return Err(malformed(
                    origin,
                    format!("{} (at byte {})", e, reader.error_position()),
                ))
            }
        };

        match event {
            Event::Start(ref e) => {
                let tag = walker.open(e)?;
                walker.stack.push(tag);
            }
            Event::Empty(ref e) => {
                let tag = walker.open(e)?;
                walker.close(&tag)?;
            }
            Event::End(_) => {
                let tag = walker
                    .stack
                    .pop()
                    .ok_or_else(|| malformed(origin, "unexpected closing tag"))?;
                walker.close(&tag)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    walker.finish()
}

fn malformed(origin: &Path, reason: impl Display) -> ParseError {
    ParseError::Xml {
        path: origin.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Tracks element nesting while the document streams past.
struct DocumentWalker {
    origin: PathBuf,
    /// Names of currently open elements, root first.
    stack: Vec<String>,
    saw_root: bool,
    host: Option<HostBuilder>,
    hosts: Vec<HostRecord>,
}

impl DocumentWalker {
    fn new(origin: &Path) -> Self {
        Self {
            origin: origin.to_path_buf(),
            stack: Vec::new(),
            saw_root: false,
            host: None,
            hosts: Vec::new(),
        }
    }

    /// Handle an opening (or self-closing) tag. `self.stack` holds its parents.
    fn open(&mut self, e: &BytesStart) -> ParseResult<String> {
        let tag = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
        let attrs = parse_attrs(e, &self.origin)?;

        match self.stack.len() {
            0 => {
                self.saw_root = true;
                return Ok(tag);
            }
            1 if tag == "host" => {
                self.host = Some(HostBuilder::default());
                return Ok(tag);
            }
            _ => {}
        }

        let Some(host) = self.host.as_mut() else {
            return Ok(tag);
        };
        let within: Vec<&str> = self.stack.iter().skip(2).map(String::as_str).collect();

        match (within.as_slice(), tag.as_str()) {
            ([], "address") => {
                if attrs.get("addrtype").map(String::as_str) == Some("ipv4") && !host.saw_ipv4 {
                    host.saw_ipv4 = true;
                    let addr = attrs.get("addr").map(String::as_str).unwrap_or_default();
                    host.address = addr.parse().ok();
                    if host.address.is_none() {
                        debug!(addr, file = %self.origin.display(), "unparseable IPv4 address");
                    }
                }
            }
            (["hostnames"], "hostname") => {
                if !host.saw_hostname {
                    host.saw_hostname = true;
                    host.hostname = attrs.get("name").filter(|n| !n.is_empty()).cloned();
                }
            }
            (["ports"], "port") => {
                host.port = Some(PortBuilder {
                    portid: attrs.get("portid").cloned(),
                    protocol: attrs.get("protocol").cloned().unwrap_or_default(),
                    ..PortBuilder::default()
                });
            }
            (["ports", "port"], "state") => {
                if let Some(port) = host.port.as_mut() {
                    if port.state.is_none() {
                        port.state = Some(attrs.get("state").cloned().unwrap_or_default());
                    }
                }
            }
            (["ports", "port"], "service") => {
                if let Some(port) = host.port.as_mut() {
                    if port.service.is_none() {
                        port.service = Some(attrs);
                    }
                }
            }
            (["os"], "osmatch") => {
                if let Some(name) = attrs.get("name").filter(|n| !n.is_empty()) {
                    let accuracy = attrs
                        .get("accuracy")
                        .and_then(|a| OsGuess::parse_accuracy(a));
                    host.os_guesses.push(OsGuess::new(name.clone(), accuracy));
                }
            }
            _ => {}
        }

        Ok(tag)
    }

    /// Handle the end of an element. `self.stack` holds its parents.
    fn close(&mut self, tag: &str) -> ParseResult<()> {
        if self.stack.len() == 1 && tag == "host" {
            if let Some(record) = self.host.take().and_then(HostBuilder::finish) {
                debug!(
                    address = %record.address,
                    ports = record.ports.len(),
                    os = record.os_guesses.len(),
                    "extracted host"
                );
                self.hosts.push(record);
            }
            return Ok(());
        }

        let in_ports = self.stack.len() == 3 && self.stack[2] == "ports";
        if let Some(host) = self.host.as_mut() {
            if in_ports && tag == "port" {
                if let Some(port) = host.port.take() {
                    if let Some(record) = port.finish(&self.origin)? {
                        host.ports.push(record);
                    }
                }
            }
        }

        Ok(())
    }

    fn finish(self) -> ParseResult<Vec<HostRecord>> {
        if !self.saw_root {
            return Err(ParseError::Empty { path: self.origin });
        }
        if let Some(open) = self.stack.last() {
            let reason = format!("unclosed element <{}>", open);
            return Err(malformed(&self.origin, reason));
        }
        Ok(self.hosts)
    }
}

#[derive(Default)]
struct HostBuilder {
    address: Option<Ipv4Addr>,
    saw_ipv4: bool,
    hostname: Option<String>,
    saw_hostname: bool,
    port: Option<PortBuilder>,
    ports: Vec<PortRecord>,
    os_guesses: Vec<OsGuess>,
}

impl HostBuilder {
    fn finish(self) -> Option<HostRecord> {
        let Some(address) = self.address else {
            debug!("skipping host without IPv4 address");
            return None;
        };

        let mut record = HostRecord::new(address);
        record.hostname = self.hostname;
        record.ports = self.ports;
        record.os_guesses = self.os_guesses;
        record.sort_ports();
        Some(record)
    }
}

#[derive(Default)]
struct PortBuilder {
    portid: Option<String>,
    protocol: String,
    state: Option<String>,
    service: Option<HashMap<String, String>>,
}

impl PortBuilder {
    /// Closed and filtered ports yield `None`; the port id is only
    /// validated for open ports.
    fn finish(self, origin: &Path) -> ParseResult<Option<PortRecord>> {
        if self.state.as_deref() != Some("open") {
            return Ok(None);
        }

        let raw = self.portid.unwrap_or_default();
        let port: Port = raw.parse().map_err(|_| ParseError::InvalidPort {
            path: origin.to_path_buf(),
            value: raw.clone(),
        })?;

        let mut record = PortRecord::new(port, self.protocol);
        if let Some(service) = self.service {
            let field = |key: &str| service.get(key).cloned().unwrap_or_default();
            record = record
                .with_service(&field("name"))
                .with_product(field("product"), field("version"));
        }
        Ok(Some(record))
    }
}

fn parse_attrs(e: &BytesStart, origin: &Path) -> ParseResult<HashMap<String, String>> {
    let mut attrs = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| malformed(origin, err))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| malformed(origin, err))?
            .into_owned();
        attrs.insert(key, value);
    }
    Ok(attrs)
}
