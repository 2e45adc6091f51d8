//! Connection probe backed by the Linux `/proc/net/tcp` tables.

use super::{ConnectionProbe, Transport};
use std::{
    io,
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
    path::PathBuf,
};

/// `st` column value of an established connection.
pub const TCP_ESTABLISHED: u8 = 0x01;

/// Scans `tcp` / `tcp6` under a procfs `net` directory.
#[derive(Debug, Clone)]
pub struct ProcNetProbe {
    root: PathBuf,
}

impl Default for ProcNetProbe {
    fn default() -> Self {
        Self::with_root("/proc/net")
    }
}

impl ProcNetProbe {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Finds the kernel's state byte for the given connection, if listed.
    pub fn state_of(&self, local: SocketAddr, remote: SocketAddr) -> io::Result<Option<u8>> {
        let table = match local {
            SocketAddr::V4(_) => "tcp",
            SocketAddr::V6(_) => "tcp6",
        };
        let contents = fs_err::read_to_string(self.root.join(table))?;
        Ok(contents
            .lines()
            .skip(1)
            .filter_map(parse_entry)
            .find(|entry| same_endpoint(entry.local, local) && same_endpoint(entry.remote, remote))
            .map(|entry| entry.state))
    }
}

impl ConnectionProbe for ProcNetProbe {
    /// A connection missing from the table is not established.
    fn is_established<T: Transport + ?Sized>(&self, transport: &T) -> io::Result<bool> {
        let (local, remote) = transport.endpoints()?;
        Ok(self.state_of(local, remote)? == Some(TCP_ESTABLISHED))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct Entry {
    local: SocketAddr,
    remote: SocketAddr,
    state: u8,
}

// IPv6 flow info and scope are not listed in the table
fn same_endpoint(a: SocketAddr, b: SocketAddr) -> bool {
    a.ip() == b.ip() && a.port() == b.port()
}

fn parse_entry(line: &str) -> Option<Entry> {
    let mut fields = line.split_whitespace();
    let _slot = fields.next()?;
    let local = parse_endpoint(fields.next()?)?;
    let remote = parse_endpoint(fields.next()?)?;
    let state = u8::from_str_radix(fields.next()?, 16).ok()?;
    Some(Entry {
        local,
        remote,
        state,
    })
}

/// Parses `ADDR:PORT`, where the address is printed as native-endian 32-bit
/// words in hex and the port as plain hex.
fn parse_endpoint(field: &str) -> Option<SocketAddr> {
    let (address, port) = field.split_once(':')?;
    let port = u16::from_str_radix(port, 16).ok()?;
    let ip = match address.len() {
        8 => IpAddr::V4(Ipv4Addr::from(parse_word(address)?)),
        32 => {
            let mut octets = [0u8; 16];
            for (chunk, word) in octets.chunks_exact_mut(4).zip(0..) {
                let start = word * 8;
                chunk.copy_from_slice(&parse_word(address.get(start..start + 8)?)?);
            }
            IpAddr::V6(Ipv6Addr::from(octets))
        }
        _ => return None,
    };
    Some(SocketAddr::new(ip, port))
}

fn parse_word(hex: &str) -> Option<[u8; 4]> {
    u32::from_str_radix(hex, 16).ok().map(u32::to_ne_bytes)
}
