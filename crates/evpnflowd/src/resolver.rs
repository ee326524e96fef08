//! Port resolution for local and remote endpoints

use evpn_types::{Ipv4Address, MacAddress, Vni};
use flowmgr_common::{FlowError, FlowResult};
use tracing::debug;

use crate::switch::SwitchChannel;
use crate::types::{InventorySnapshot, PortNo};

/// What a port is looked up by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortCriterion<'a> {
    /// Tunnel port reaching a fabric next-hop
    NextHop(Ipv4Address),
    /// Named local port
    Name(&'a str),
}

/// Maps endpoints to bridge ports. Single attempt, no retry.
pub struct PortResolver<'a> {
    switch: &'a dyn SwitchChannel,
}

impl<'a> PortResolver<'a> {
    pub fn new(switch: &'a dyn SwitchChannel) -> Self {
        Self { switch }
    }

    pub async fn resolve(&self, criterion: PortCriterion<'_>) -> FlowResult<PortNo> {
        let port = match criterion {
            PortCriterion::NextHop(address) => self.switch.find_port_by_address(address).await?,
            PortCriterion::Name(name) => self.switch.find_port_by_name(name).await?,
        };
        debug!(?criterion, port = %port, "Resolved port");
        Ok(port)
    }

    /// Port of the tunnel toward `nexthop`.
    pub async fn resolve_remote(&self, nexthop: Ipv4Address) -> FlowResult<PortNo> {
        self.resolve(PortCriterion::NextHop(nexthop)).await
    }

    /// Port of the local container owning (`mac`, `ip`) on network `vni`.
    ///
    /// Exactly one inventory endpoint must match all three values.
    pub async fn resolve_local(
        &self,
        inventory: &InventorySnapshot,
        mac: MacAddress,
        ip: Ipv4Address,
        vni: Vni,
    ) -> FlowResult<PortNo> {
        let matches = inventory.matching_endpoints(mac, ip, vni);
        let endpoint = match matches.as_slice() {
            [endpoint] => *endpoint,
            [] => {
                return Err(FlowError::EndpointNotFound {
                    mac: mac.to_string(),
                    ip: ip.to_string(),
                    vni: vni.as_u32(),
                })
            }
            _ => {
                return Err(FlowError::AmbiguousEndpoint {
                    mac: mac.to_string(),
                    ip: ip.to_string(),
                    vni: vni.as_u32(),
                    count: matches.len(),
                })
            }
        };

        self.resolve(PortCriterion::Name(&endpoint.port_name)).await
    }
}
