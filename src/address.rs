//! Classification of IPv4 addresses in reserved ranges.

use std::net::{IpAddr, Ipv4Addr};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("only IPv4 addresses can be classified (got {0})")]
pub struct UnsupportedAddress(pub IpAddr);

/// `(network, prefix length)` of every reserved range.
const RESERVED: &[([u8; 4], u32)] = &[
    // private networks
    ([10, 0, 0, 0], 8),
    ([100, 64, 0, 0], 10),
    ([172, 16, 0, 0], 12),
    ([192, 168, 0, 0], 16),
    ([192, 0, 0, 0], 24),
    ([198, 18, 0, 0], 15),
    // loopback
    ([127, 0, 0, 0], 8),
    // documentation
    ([192, 0, 2, 0], 24),
    ([198, 51, 100, 0], 24),
    ([203, 0, 113, 0], 24),
    // link-local
    ([169, 254, 0, 0], 16),
];

/// Returns whether `ip` lies in a private, loopback, documentation or
/// link-local range.
pub fn is_reserved(ip: Ipv4Addr) -> bool {
    let ip = u32::from(ip);
    RESERVED.iter().any(|&(network, prefix)| {
        let mask = u32::MAX << (32 - prefix);
        ip & mask == u32::from_be_bytes(network)
    })
}

pub fn is_reserved_ip(ip: IpAddr) -> Result<bool, UnsupportedAddress> {
    match ip {
        IpAddr::V4(ip) => Ok(is_reserved(ip)),
        IpAddr::V6(_) => Err(UnsupportedAddress(ip)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reserved(s: &str) -> bool {
        is_reserved(s.parse().unwrap())
    }

    #[test]
    fn reserved_ranges() {
        for ip in [
            "10.1.2.3",
            "100.64.0.1",
            "100.127.255.255",
            "172.16.0.1",
            "172.31.255.255",
            "192.168.1.1",
            "192.0.0.8",
            "198.18.0.1",
            "198.19.255.255",
            "127.0.0.1",
            "192.0.2.55",
            "198.51.100.7",
            "203.0.113.9",
            "169.254.10.10",
        ] {
            assert!(reserved(ip), "{ip}");
        }
    }

    #[test]
    fn public_addresses() {
        for ip in [
            "8.8.8.8",
            "100.128.0.1",
            "172.32.0.1",
            "192.169.0.1",
            "192.0.1.1",
            "198.20.0.1",
            "198.51.101.1",
            "203.0.114.1",
            "1.1.1.1",
        ] {
            assert!(!reserved(ip), "{ip}");
        }
    }

    #[test]
    fn ipv6_is_unsupported() {
        let ip: IpAddr = "::1".parse().unwrap();
        assert_eq!(is_reserved_ip(ip), Err(UnsupportedAddress(ip)));
        assert_eq!(is_reserved_ip("10.0.0.1".parse().unwrap()), Ok(true));
    }
}
