//! EVPN flow manager - turns advertisements into bridge flows

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use evpn_types::{Ipv4Address, MacAddress, ParseError};
use flowmgr_common::{FlowError, FlowResult};
use tracing::{debug, info, warn};

use crate::flow::{self, FlowRule, RuleKind};
use crate::host::HostDiscovery;
use crate::installer::FlowInstaller;
use crate::inventory::Inventory;
use crate::locality::{classify, Locality};
use crate::resolver::PortResolver;
use crate::switch::SwitchChannel;
use crate::types::{Advertisement, HostIdentity};

/// Result of one rule kind for one advertisement
#[derive(Debug)]
pub enum RuleOutcome {
    Installed(FlowRule),
    NotApplicable,
    Failed(FlowError),
}

impl RuleOutcome {
    pub fn is_installed(&self) -> bool {
        matches!(self, RuleOutcome::Installed(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RuleOutcome::Failed(_))
    }

    pub fn rule(&self) -> Option<&FlowRule> {
        match self {
            RuleOutcome::Installed(rule) => Some(rule),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&FlowError> {
        match self {
            RuleOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FlowResult<FlowRule>> for RuleOutcome {
    fn from(result: FlowResult<FlowRule>) -> Self {
        match result {
            Ok(rule) => RuleOutcome::Installed(rule),
            Err(e) => RuleOutcome::Failed(e),
        }
    }
}

/// Outcome of a synthesis pass over one advertisement
#[derive(Debug)]
pub struct SynthesisReport {
    pub host: HostIdentity,
    /// `None` when the next-hop could not be parsed
    pub locality: Option<Locality>,
    pub arp_responder: RuleOutcome,
    pub remote_port: RuleOutcome,
    pub local_port: RuleOutcome,
}

impl SynthesisReport {
    pub fn outcome(&self, kind: RuleKind) -> &RuleOutcome {
        match kind {
            RuleKind::ArpResponder => &self.arp_responder,
            RuleKind::RemotePortSelection => &self.remote_port,
            RuleKind::LocalPortSelection => &self.local_port,
        }
    }

    pub fn installed(&self) -> impl Iterator<Item = &FlowRule> {
        RuleKind::ALL
            .into_iter()
            .filter_map(move |kind| self.outcome(kind).rule())
    }

    pub fn failures(&self) -> impl Iterator<Item = (RuleKind, &FlowError)> {
        RuleKind::ALL
            .into_iter()
            .filter_map(move |kind| self.outcome(kind).error().map(|e| (kind, e)))
    }
}

/// Default number of endpoints remembered for move detection
pub const DEFAULT_ENDPOINT_CAPACITY: usize = 4096;

/// Last next-hop per endpoint, bounded to `capacity` entries.
///
/// When full, the endpoint seen first is forgotten first.
#[derive(Debug)]
struct EndpointTracker {
    capacity: usize,
    nexthops: HashMap<(MacAddress, Ipv4Address), Ipv4Address>,
    order: VecDeque<(MacAddress, Ipv4Address)>,
}

impl EndpointTracker {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            nexthops: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Records `nexthop` and returns the previous one, if remembered.
    fn record(
        &mut self,
        key: (MacAddress, Ipv4Address),
        nexthop: Ipv4Address,
    ) -> Option<Ipv4Address> {
        if self.capacity == 0 {
            return None;
        }
        if let Some(previous) = self.nexthops.insert(key, nexthop) {
            return Some(previous);
        }

        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.nexthops.remove(&oldest);
            }
        }
        None
    }

    fn get(&self, key: &(MacAddress, Ipv4Address)) -> Option<Ipv4Address> {
        self.nexthops.get(key).copied()
    }

    fn len(&self) -> usize {
        self.nexthops.len()
    }
}

/// EVPN Flow Manager
///
/// Runs the ARP responder, remote port and local port steps for every
/// advertisement. Steps are independent: a failure in one never stops the
/// others, and nothing is retried.
pub struct EvpnFlowMgr {
    switch: Arc<dyn SwitchChannel>,
    inventory: Arc<dyn Inventory>,
    host: Arc<dyn HostDiscovery>,
    installer: FlowInstaller,

    /// Last next-hop seen per endpoint, for move detection only
    endpoints: EndpointTracker,
}

impl EvpnFlowMgr {
    pub fn new(
        switch: Arc<dyn SwitchChannel>,
        inventory: Arc<dyn Inventory>,
        host: Arc<dyn HostDiscovery>,
    ) -> Self {
        info!("EvpnFlowMgr initialized");

        Self {
            installer: FlowInstaller::new(switch.clone()),
            switch,
            inventory,
            host,
            endpoints: EndpointTracker::new(DEFAULT_ENDPOINT_CAPACITY),
        }
    }

    /// Bound on endpoints remembered for move detection. `0` disables it.
    pub fn with_endpoint_capacity(mut self, capacity: usize) -> Self {
        self.endpoints = EndpointTracker::new(capacity);
        self
    }

    /// Handle one advertisement from the routing layer.
    ///
    /// The host identity is rediscovered for every advertisement.
    pub async fn handle_advertisement(&mut self, adv: &Advertisement) -> SynthesisReport {
        let host = self.host.discover().await;
        if !host.is_resolved() {
            warn!(
                advertisement = %adv,
                "Host address unresolved, only 0.0.0.0 next-hops are treated as local"
            );
        }
        self.track_endpoint(adv);

        let report = self.synthesize(adv, host).await;
        for (kind, e) in report.failures() {
            warn!(kind = %kind, advertisement = %adv, error = %e, "Flow not installed");
        }
        report
    }

    /// Synthesis pass for `adv` as seen from `host`.
    pub async fn synthesize(&self, adv: &Advertisement, host: HostIdentity) -> SynthesisReport {
        let locality = adv.nexthop().map(|nexthop| classify(nexthop, host));
        debug!(advertisement = %adv, host = %host, locality = ?locality, "Synthesizing flows");

        let arp_responder = self.add_arp_responder_flow(adv, &locality).await;
        let remote_port = self.add_remote_port_selection_flow(adv, &locality).await;
        let local_port = self.add_local_port_selection_flow(adv, &locality).await;

        SynthesisReport {
            host,
            locality: locality.ok(),
            arp_responder,
            remote_port,
            local_port,
        }
    }

    async fn add_arp_responder_flow(
        &self,
        adv: &Advertisement,
        locality: &Result<Locality, ParseError>,
    ) -> RuleOutcome {
        if !applies(RuleKind::ArpResponder, locality) {
            return RuleOutcome::NotApplicable;
        }
        self.try_arp_responder_flow(adv, locality).await.into()
    }

    async fn try_arp_responder_flow(
        &self,
        adv: &Advertisement,
        locality: &Result<Locality, ParseError>,
    ) -> FlowResult<FlowRule> {
        let locality = locality.clone()?;
        let mac = adv.mac()?;
        let ip = adv.ip()?;
        info!(ip = %ip, nexthop = %adv.nexthop, locality = %locality, "Adding ARP responder flow");

        let rule = flow::arp_responder(mac, ip);
        self.installer.install(&rule).await?;
        Ok(rule)
    }

    async fn add_remote_port_selection_flow(
        &self,
        adv: &Advertisement,
        locality: &Result<Locality, ParseError>,
    ) -> RuleOutcome {
        if !applies(RuleKind::RemotePortSelection, locality) {
            return RuleOutcome::NotApplicable;
        }
        self.try_remote_port_selection_flow(adv, locality).await.into()
    }

    async fn try_remote_port_selection_flow(
        &self,
        adv: &Advertisement,
        locality: &Result<Locality, ParseError>,
    ) -> FlowResult<FlowRule> {
        locality.clone()?;
        let nexthop = adv.nexthop()?;
        let mac = adv.mac()?;
        let vni = adv.vni()?;
        let vlan = vni.to_vlan()?;
        info!(mac = %mac, vni = %vni, nexthop = %nexthop, "Adding remote port selection flow");

        let port = PortResolver::new(self.switch.as_ref())
            .resolve_remote(nexthop)
            .await?;
        let rule = flow::remote_port_selection(mac, vlan, port);
        self.installer.install(&rule).await?;
        Ok(rule)
    }

    async fn add_local_port_selection_flow(
        &self,
        adv: &Advertisement,
        locality: &Result<Locality, ParseError>,
    ) -> RuleOutcome {
        if !applies(RuleKind::LocalPortSelection, locality) {
            return RuleOutcome::NotApplicable;
        }
        self.try_local_port_selection_flow(adv, locality).await.into()
    }

    async fn try_local_port_selection_flow(
        &self,
        adv: &Advertisement,
        locality: &Result<Locality, ParseError>,
    ) -> FlowResult<FlowRule> {
        locality.clone()?;
        let mac = adv.mac()?;
        let ip = adv.ip()?;
        let vni = adv.vni()?;
        let vlan = vni.to_vlan()?;
        info!(mac = %mac, ip = %ip, vni = %vni, "Adding local port selection flow");

        let inventory = self.inventory.snapshot().await?;
        let port = PortResolver::new(self.switch.as_ref())
            .resolve_local(&inventory, mac, ip, vni)
            .await?;
        let rule = flow::local_port_selection(mac, vlan, port);
        self.installer.install(&rule).await?;
        Ok(rule)
    }

    /// Record the endpoint's next-hop and log when it moves.
    ///
    /// Flows installed for the previous location are left in place.
    fn track_endpoint(&mut self, adv: &Advertisement) {
        let (Ok(mac), Ok(ip), Ok(nexthop)) = (adv.mac(), adv.ip(), adv.nexthop()) else {
            return;
        };

        if let Some(previous) = self.endpoints.record((mac, ip), nexthop) {
            if previous != nexthop {
                info!(mac = %mac, ip = %ip, from = %previous, to = %nexthop, "Endpoint moved");
            }
        }
    }

    /// Last next-hop seen for an endpoint
    pub fn last_nexthop(&self, mac: MacAddress, ip: Ipv4Address) -> Option<Ipv4Address> {
        self.endpoints.get(&(mac, ip))
    }

    /// Number of endpoints currently remembered
    pub fn tracked_endpoints(&self) -> usize {
        self.endpoints.len()
    }
}

/// A rule step runs when its kind applies to the locality, or when the
/// locality is unknown because the next-hop is malformed, so that the parse
/// failure is reported for that step.
fn applies(kind: RuleKind, locality: &Result<Locality, ParseError>) -> bool {
    match locality {
        Ok(locality) => kind.applies_to(*locality),
        Err(_) => true,
    }
}
