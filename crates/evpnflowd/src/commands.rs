//! Shell command builders for switch and host queries

use flowmgr_common::shell;

use crate::flow::FlowRule;

/// Build the port dump command for a bridge
pub fn build_show_ports_cmd(ofctl: &str, bridge: &str) -> String {
    format!("{} show {}", ofctl, shell::shellquote(bridge))
}

/// Build the flow install command
///
/// `add-flow` replaces the actions of an existing flow with the same match
/// and priority, so reissuing it for the same endpoint is safe.
pub fn build_add_flow_cmd(ofctl: &str, bridge: &str, rule: &FlowRule) -> String {
    format!(
        "{} add-flow {} {}",
        ofctl,
        shell::shellquote(bridge),
        shell::shellquote(&rule.to_string())
    )
}

/// Build the IPv4 address query for an interface
pub fn build_show_ipv4_addr_cmd(interface: &str) -> String {
    format!(
        "{} -4 -o addr show dev {}",
        shell::IP_CMD,
        shell::shellquote(interface)
    )
}
