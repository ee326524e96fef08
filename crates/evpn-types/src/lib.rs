//! Address and label types for EVPN-driven overlay flow programming.
//!
//! This crate provides type-safe representations of the primitives carried
//! by an EVPN MAC/IP advertisement and consumed by OpenFlow match fields:
//!
//! - [`MacAddress`]: 48-bit Ethernet MAC addresses
//! - [`Ipv4Address`]: IPv4 endpoint and next-hop addresses
//! - [`Vni`]: 24-bit virtual network identifiers
//! - [`VlanId`]: IEEE 802.1Q VLAN identifiers used as a VNI surrogate
//!
//! MAC and IPv4 addresses also convert to and from the fixed-width
//! hexadecimal form used by `load:0x...` OpenFlow actions.

mod ip;
mod mac;
mod vlan;
mod vni;

pub use ip::Ipv4Address;
pub use mac::MacAddress;
pub use vlan::VlanId;
pub use vni::Vni;

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("invalid IPv4 address format: {0}")]
    InvalidIpAddress(String),

    #[error("invalid VNI: {0} (must be 1-16777215)")]
    InvalidVni(u32),

    #[error("advertisement carries no VNI label")]
    MissingVni,

    #[error("invalid VLAN ID: {0} (must be 1-4094)")]
    InvalidVlanId(u32),

    #[error("invalid hex field '{value}': expected {width} hex digits")]
    InvalidHexField { value: String, width: usize },
}

/// Decodes exactly `N` bytes from a fixed-width hex string.
///
/// An optional `0x` prefix is accepted so values can be read back from
/// rendered `load:` actions.
pub(crate) fn decode_hex<const N: usize>(s: &str) -> Result<[u8; N], ParseError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    let invalid = || ParseError::InvalidHexField {
        value: s.to_string(),
        width: N * 2,
    };

    if digits.len() != N * 2 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let mut bytes = [0u8; N];
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
    }
    Ok(bytes)
}

pub(crate) fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
