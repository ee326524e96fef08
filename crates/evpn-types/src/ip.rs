//! IPv4 address type with hex field encoding.

use crate::{decode_hex, encode_hex, ParseError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// An IPv4 address as carried in EVPN advertisements and ARP fields.
///
/// The unspecified address `0.0.0.0` doubles as the "no next-hop" and
/// "host address unknown" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ipv4Address(Ipv4Addr);

impl Ipv4Address {
    pub const UNSPECIFIED: Self = Ipv4Address(Ipv4Addr::UNSPECIFIED);

    pub const fn new(a: u8, b: u8, c: u8, d: u8) -> Self {
        Ipv4Address(Ipv4Addr::new(a, b, c, d))
    }

    pub const fn octets(&self) -> [u8; 4] {
        self.0.octets()
    }

    /// Returns true for `0.0.0.0`.
    pub fn is_unspecified(&self) -> bool {
        self.0.is_unspecified()
    }

    /// Renders the address as 8 lowercase hex digits in network byte order.
    pub fn to_hex_field(&self) -> String {
        encode_hex(&self.octets())
    }

    /// Parses the 8-digit form produced by [`Ipv4Address::to_hex_field`].
    pub fn from_hex_field(s: &str) -> Result<Self, ParseError> {
        decode_hex::<4>(s).map(|o| Ipv4Address::new(o[0], o[1], o[2], o[3]))
    }
}

impl Default for Ipv4Address {
    fn default() -> Self {
        Self::UNSPECIFIED
    }
}

impl fmt::Display for Ipv4Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Ipv4Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<Ipv4Addr>()
            .map(Ipv4Address)
            .map_err(|_| ParseError::InvalidIpAddress(s.to_string()))
    }
}

impl TryFrom<String> for Ipv4Address {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Ipv4Address> for String {
    fn from(addr: Ipv4Address) -> String {
        addr.to_string()
    }
}

impl From<Ipv4Addr> for Ipv4Address {
    fn from(addr: Ipv4Addr) -> Self {
        Ipv4Address(addr)
    }
}

impl From<Ipv4Address> for Ipv4Addr {
    fn from(addr: Ipv4Address) -> Self {
        addr.0
    }
}
