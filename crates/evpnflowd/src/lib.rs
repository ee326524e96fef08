//! EVPN Flow Daemon - EVPN MAC/IP routes to Open vSwitch overlay flows
//!
//! evpnflowd programs the container overlay bridge from EVPN reachability:
//! - Locality classification of each advertised endpoint
//! - ARP responder flows for remote endpoints
//! - Remote port selection toward the tunnel reaching the next-hop
//! - Local port selection to the owning container's port

pub mod commands;
pub mod config;
pub mod feed;
pub mod flow;
pub mod flow_mgr;
pub mod host;
pub mod installer;
pub mod inventory;
pub mod locality;
pub mod port_table;
pub mod resolver;
pub mod switch;
pub mod types;

#[cfg(test)]
mod mock;

pub use config::EvpnFlowConfig;
pub use flow::{FlowRule, RuleKind};
pub use flow_mgr::{EvpnFlowMgr, RuleOutcome, SynthesisReport};
pub use locality::{classify, Locality};
pub use switch::{OvsOfctl, SwitchChannel};
pub use types::{Advertisement, HostIdentity, InventorySnapshot, LocalEndpointInfo, NetworkInfo, PortNo};
