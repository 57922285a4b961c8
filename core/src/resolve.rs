//! Host name to IPv4 literal resolution.
//!
//! # Design
//! Resolution is a capability behind the `Resolve` trait so callers (and
//! tests) can substitute their own lookup. It runs once when a request is
//! built; the stored address is reused on every send, so DNS changes after
//! construction are not observed.

use std::net::{Ipv4Addr, SocketAddr, ToSocketAddrs};

use crate::error::{HttpError, Result};

/// Maps a host string to the IPv4 address used for connecting.
pub trait Resolve: Send + Sync {
    fn resolve(&self, host: &str) -> Result<Ipv4Addr>;
}

/// Resolver backed by the operating system's name service.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl Resolve for SystemResolver {
    fn resolve(&self, host: &str) -> Result<Ipv4Addr> {
        if let Some(addr) = parse_ipv4_literal(host) {
            return Ok(addr);
        }

        let addrs = (host, 0)
            .to_socket_addrs()
            .map_err(|e| HttpError::Resolution(format!("{host}: {e}")))?;
        let found = addrs
            .filter_map(|addr| match addr {
                SocketAddr::V4(v4) => Some(*v4.ip()),
                SocketAddr::V6(_) => None,
            })
            .next();

        match found {
            Some(addr) => {
                tracing::debug!(host, %addr, "resolved host");
                Ok(addr)
            }
            None => Err(HttpError::Resolution(format!("{host}: no IPv4 address"))),
        }
    }
}

/// True if `ip` is a dotted-decimal IPv4 literal.
pub fn is_ip_address(ip: &str) -> bool {
    parse_ipv4_literal(ip).is_some()
}

/// Parse four dot-separated, non-empty, all-digit segments that each fit in
/// a byte. Leading zeros are accepted (`010.0.0.1`), unlike `Ipv4Addr`'s
/// `FromStr`.
pub fn parse_ipv4_literal(ip: &str) -> Option<Ipv4Addr> {
    let mut octets = [0u8; 4];
    let mut segments = ip.split('.');
    for octet in octets.iter_mut() {
        let segment = segments.next()?;
        if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *octet = segment.parse().ok()?;
    }
    if segments.next().is_some() {
        return None;
    }
    Some(Ipv4Addr::from(octets))
}
