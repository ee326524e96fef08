//! Endpoint locality classification

use std::fmt;

use evpn_types::Ipv4Address;

use crate::types::HostIdentity;

/// Where an advertised endpoint lives relative to this host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locality {
    /// The next-hop is this host
    SelfOriginated,
    /// The next-hop is `0.0.0.0`; ownership is ambiguous and treated as local
    Unknown,
    /// The endpoint sits behind another fabric node
    Remote,
}

impl Locality {
    /// True when flows toward the fabric (ARP responder, remote port) apply.
    pub fn is_remote(&self) -> bool {
        matches!(self, Locality::Remote)
    }

    /// True when the local-port flow applies.
    pub fn is_local(&self) -> bool {
        !self.is_remote()
    }
}

impl fmt::Display for Locality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Locality::SelfOriginated => "self",
            Locality::Unknown => "unknown",
            Locality::Remote => "remote",
        };
        f.write_str(s)
    }
}

/// Classifies an advertisement's next-hop against the host address.
pub fn classify(nexthop: Ipv4Address, host: HostIdentity) -> Locality {
    if nexthop == host.address() {
        Locality::SelfOriginated
    } else if nexthop.is_unspecified() {
        Locality::Unknown
    } else {
        Locality::Remote
    }
}
