//! Declarative OpenFlow rules and their synthesis from advertisements.
//!
//! A [`FlowRule`] renders to the `ovs-ofctl add-flow` flow syntax through its
//! `Display` impl. The synthesizers are pure: identical inputs always yield
//! an identical rule, so reinstalling a rule is harmless.

use std::fmt;

use evpn_types::{Ipv4Address, MacAddress, VlanId};

use crate::locality::Locality;
use crate::types::PortNo;

/// Ethertype of ARP frames
pub const ETH_TYPE_ARP: u16 = 0x0806;

/// ARP opcode for a reply
pub const ARP_OP_REPLY: u8 = 2;

/// Priority of ARP responder flows; must beat the forwarding flows
pub const ARP_RESPONDER_PRIORITY: u16 = 100;

/// Priority of remote and local port selection flows
pub const PORT_SELECTION_PRIORITY: u16 = 50;

/// The three kinds of flow synthesized per advertisement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    ArpResponder,
    RemotePortSelection,
    LocalPortSelection,
}

impl RuleKind {
    /// Evaluation order for one advertisement
    pub const ALL: [RuleKind; 3] = [
        RuleKind::ArpResponder,
        RuleKind::RemotePortSelection,
        RuleKind::LocalPortSelection,
    ];

    pub fn priority(&self) -> u16 {
        match self {
            RuleKind::ArpResponder => ARP_RESPONDER_PRIORITY,
            RuleKind::RemotePortSelection | RuleKind::LocalPortSelection => {
                PORT_SELECTION_PRIORITY
            }
        }
    }

    /// Whether this kind of rule is installed for an endpoint with `locality`.
    pub fn applies_to(&self, locality: Locality) -> bool {
        match self {
            RuleKind::ArpResponder | RuleKind::RemotePortSelection => locality.is_remote(),
            RuleKind::LocalPortSelection => locality.is_local(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::ArpResponder => "arp-responder",
            RuleKind::RemotePortSelection => "remote-port-selection",
            RuleKind::LocalPortSelection => "local-port-selection",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nicira extended match fields addressed by `move` and `load`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NxmField {
    EthSrc,
    EthDst,
    ArpOp,
    ArpSha,
    ArpTha,
    ArpSpa,
    ArpTpa,
}

impl NxmField {
    pub fn as_str(&self) -> &'static str {
        match self {
            NxmField::EthSrc => "NXM_OF_ETH_SRC",
            NxmField::EthDst => "NXM_OF_ETH_DST",
            NxmField::ArpOp => "NXM_OF_ARP_OP",
            NxmField::ArpSha => "NXM_NX_ARP_SHA",
            NxmField::ArpTha => "NXM_NX_ARP_THA",
            NxmField::ArpSpa => "NXM_OF_ARP_SPA",
            NxmField::ArpTpa => "NXM_OF_ARP_TPA",
        }
    }
}

impl fmt::Display for NxmField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[]", self.as_str())
    }
}

/// Equality constraint on a packet field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchField {
    EthType(u16),
    /// IPv4 destination, or ARP target protocol address for ARP frames
    NwDst(Ipv4Address),
    DlDst(MacAddress),
    DlVlan(VlanId),
}

impl fmt::Display for MatchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchField::EthType(t) => write!(f, "dl_type=0x{:04x}", t),
            MatchField::NwDst(ip) => write!(f, "nw_dst={}", ip),
            MatchField::DlDst(mac) => write!(f, "dl_dst={}", mac),
            MatchField::DlVlan(vlan) => write!(f, "dl_vlan={}", vlan),
        }
    }
}

/// Output target of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutPort {
    /// Back out of the port the packet arrived on
    InPort,
    Port(PortNo),
}

impl fmt::Display for OutPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutPort::InPort => f.write_str("in_port"),
            OutPort::Port(port) => write!(f, "{}", port),
        }
    }
}

/// Switch action, applied in list order
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    Move { src: NxmField, dst: NxmField },
    /// Load a hex value (digits only, no `0x`) into a field
    Load { value: String, dst: NxmField },
    ModDlSrc(MacAddress),
    ModVlanVid(VlanId),
    StripVlan,
    Output(OutPort),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Move { src, dst } => write!(f, "move:{}->{}", src, dst),
            Action::Load { value, dst } => write!(f, "load:0x{}->{}", value, dst),
            Action::ModDlSrc(mac) => write!(f, "mod_dl_src:{}", mac),
            Action::ModVlanVid(vlan) => write!(f, "mod_vlan_vid:{}", vlan),
            Action::StripVlan => f.write_str("strip_vlan"),
            Action::Output(port) => write!(f, "output:{}", port),
        }
    }
}

/// A prioritized match/action pair for the bridge's flow table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlowRule {
    pub kind: RuleKind,
    pub priority: u16,
    pub matches: Vec<MatchField>,
    pub actions: Vec<Action>,
}

impl FlowRule {
    /// The `priority=...,<match>` part that identifies the rule in the table
    pub fn match_spec(&self) -> String {
        let mut spec = format!("priority={}", self.priority);
        for m in &self.matches {
            spec.push(',');
            spec.push_str(&m.to_string());
        }
        spec
    }
}

impl fmt::Display for FlowRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let actions: Vec<String> = self.actions.iter().map(|a| a.to_string()).collect();
        write!(f, "{},actions={}", self.match_spec(), actions.join(","))
    }
}

/// Answers ARP requests for a remote endpoint on the local bridge.
///
/// The request is turned around in place: Ethernet and ARP sender fields
/// move to the target side, the advertised MAC/IP become the sender, and
/// the frame leaves through the port it came in on.
pub fn arp_responder(mac: MacAddress, ip: Ipv4Address) -> FlowRule {
    FlowRule {
        kind: RuleKind::ArpResponder,
        priority: ARP_RESPONDER_PRIORITY,
        matches: vec![MatchField::EthType(ETH_TYPE_ARP), MatchField::NwDst(ip)],
        actions: vec![
            Action::Move {
                src: NxmField::EthSrc,
                dst: NxmField::EthDst,
            },
            Action::ModDlSrc(mac),
            Action::Load {
                value: format!("{:x}", ARP_OP_REPLY),
                dst: NxmField::ArpOp,
            },
            Action::Move {
                src: NxmField::ArpSha,
                dst: NxmField::ArpTha,
            },
            Action::Move {
                src: NxmField::ArpSpa,
                dst: NxmField::ArpTpa,
            },
            Action::Load {
                value: mac.to_hex_field(),
                dst: NxmField::ArpSha,
            },
            Action::Load {
                value: ip.to_hex_field(),
                dst: NxmField::ArpSpa,
            },
            Action::Output(OutPort::InPort),
        ],
    }
}

/// Tags traffic for a remote endpoint and sends it to the tunnel port.
pub fn remote_port_selection(mac: MacAddress, vlan: VlanId, port: PortNo) -> FlowRule {
    FlowRule {
        kind: RuleKind::RemotePortSelection,
        priority: PORT_SELECTION_PRIORITY,
        matches: vec![MatchField::DlDst(mac)],
        actions: vec![
            Action::ModVlanVid(vlan),
            Action::Output(OutPort::Port(port)),
        ],
    }
}

/// Untags fabric traffic for a local endpoint and delivers it to its port.
pub fn local_port_selection(mac: MacAddress, vlan: VlanId, port: PortNo) -> FlowRule {
    FlowRule {
        kind: RuleKind::LocalPortSelection,
        priority: PORT_SELECTION_PRIORITY,
        matches: vec![MatchField::DlDst(mac), MatchField::DlVlan(vlan)],
        actions: vec![Action::StripVlan, Action::Output(OutPort::Port(port))],
    }
}
