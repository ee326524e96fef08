//! Advertisement, inventory and switch port types

use std::collections::HashMap;
use std::fmt;

use evpn_types::{Ipv4Address, MacAddress, ParseError, Vni};
use serde::{Deserialize, Serialize};

/// Default OVS bridge the overlay flows are installed on
pub const DEFAULT_BRIDGE: &str = "docker0-ovs";

/// Default fabric-facing interface used for host address discovery
pub const DEFAULT_FABRIC_INTERFACE: &str = "eth1";

/// EVPN MAC/IP advertisement as delivered by the routing layer.
///
/// Fields are kept in their received form and parsed on access, so a
/// malformed field only fails the rule kinds that actually need it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advertisement {
    /// Endpoint MAC address
    pub mac: String,
    /// Endpoint IPv4 address
    pub ip: String,
    /// Route labels; the first one is the VNI
    #[serde(default)]
    pub vni: Vec<u32>,
    /// Fabric node currently hosting the endpoint
    pub nexthop: String,
}

impl Advertisement {
    pub fn new(
        mac: impl Into<String>,
        ip: impl Into<String>,
        vni: Vec<u32>,
        nexthop: impl Into<String>,
    ) -> Self {
        Self {
            mac: mac.into(),
            ip: ip.into(),
            vni,
            nexthop: nexthop.into(),
        }
    }

    pub fn mac(&self) -> Result<MacAddress, ParseError> {
        self.mac.parse()
    }

    pub fn ip(&self) -> Result<Ipv4Address, ParseError> {
        self.ip.parse()
    }

    pub fn vni(&self) -> Result<Vni, ParseError> {
        Vni::from_labels(&self.vni)
    }

    pub fn nexthop(&self) -> Result<Ipv4Address, ParseError> {
        self.nexthop.parse()
    }
}

impl fmt::Display for Advertisement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} vni {:?} via {}",
            self.mac, self.ip, self.vni, self.nexthop
        )
    }
}

/// Fabric-facing IPv4 address of this host.
///
/// Resolved once per synthesis pass. [`HostIdentity::UNRESOLVED`] stands in
/// when discovery fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HostIdentity(Ipv4Address);

impl HostIdentity {
    pub const UNRESOLVED: HostIdentity = HostIdentity(Ipv4Address::UNSPECIFIED);

    pub const fn new(address: Ipv4Address) -> Self {
        Self(address)
    }

    pub const fn address(&self) -> Ipv4Address {
        self.0
    }

    pub fn is_resolved(&self) -> bool {
        !self.0.is_unspecified()
    }
}

impl fmt::Display for HostIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Container endpoint attached to the local bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalEndpointInfo {
    pub ip: Ipv4Address,
    pub mac: MacAddress,
    pub network_id: String,
    pub port_name: String,
}

/// Overlay network known to the container runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub vni: u32,
}

/// Point-in-time view of the container inventory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    #[serde(default)]
    pub endpoints: Vec<LocalEndpointInfo>,
    /// Network ID to network mapping
    #[serde(default)]
    pub networks: HashMap<String, NetworkInfo>,
}

impl InventorySnapshot {
    /// Endpoints whose IP, MAC and network VNI all equal the given values.
    ///
    /// Endpoints on a network missing from `networks` never match.
    pub fn matching_endpoints(
        &self,
        mac: MacAddress,
        ip: Ipv4Address,
        vni: Vni,
    ) -> Vec<&LocalEndpointInfo> {
        self.endpoints
            .iter()
            .filter(|ep| ep.ip == ip && ep.mac == mac)
            .filter(|ep| {
                self.networks
                    .get(&ep.network_id)
                    .is_some_and(|net| net.vni == vni.as_u32())
            })
            .collect()
    }
}

/// OpenFlow port number on the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortNo(u32);

impl PortNo {
    /// OFPP_LOCAL, the bridge's internal port
    pub const LOCAL: PortNo = PortNo(0xfffe);

    pub const fn new(port: u32) -> Self {
        Self(port)
    }

    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for PortNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == PortNo::LOCAL {
            write!(f, "LOCAL")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
