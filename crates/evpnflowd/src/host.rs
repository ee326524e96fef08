//! Host identity discovery
//!
//! The host's fabric-facing address is looked up from a configured
//! interface. Discovery never fails: an address that cannot be determined
//! becomes [`HostIdentity::UNRESOLVED`].

use std::time::Duration;

use async_trait::async_trait;
use evpn_types::Ipv4Address;
use flowmgr_common::shell;
use tracing::{debug, warn};

use crate::commands::build_show_ipv4_addr_cmd;
use crate::types::HostIdentity;

#[async_trait]
pub trait HostDiscovery: Send + Sync {
    async fn discover(&self) -> HostIdentity;
}

/// Reads the first IPv4 address of an interface with `ip -4 -o addr show`
#[derive(Debug, Clone)]
pub struct InterfaceDiscovery {
    interface: String,
    timeout: Duration,
}

impl InterfaceDiscovery {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            timeout: shell::DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl HostDiscovery for InterfaceDiscovery {
    async fn discover(&self) -> HostIdentity {
        let cmd = build_show_ipv4_addr_cmd(&self.interface);
        let output = match shell::exec_or_throw(&cmd, self.timeout).await {
            Ok(output) => output,
            Err(e) => {
                warn!(interface = %self.interface, error = %e, "Cannot query host address");
                return HostIdentity::UNRESOLVED;
            }
        };

        match parse_ipv4_addr_output(&output) {
            Some(address) => {
                debug!(interface = %self.interface, address = %address, "Discovered host address");
                HostIdentity::new(address)
            }
            None => {
                warn!(interface = %self.interface, "No IPv4 address on interface");
                HostIdentity::UNRESOLVED
            }
        }
    }
}

/// Fixed host address from configuration
#[derive(Debug, Clone, Copy)]
pub struct StaticHost(pub HostIdentity);

#[async_trait]
impl HostDiscovery for StaticHost {
    async fn discover(&self) -> HostIdentity {
        self.0
    }
}

/// Extracts the first address from `ip -4 -o addr show` output, e.g.
/// `3: eth1    inet 10.1.1.2/24 brd 10.1.1.255 scope global eth1`.
pub fn parse_ipv4_addr_output(output: &str) -> Option<Ipv4Address> {
    output.lines().find_map(|line| {
        let mut words = line.split_whitespace();
        words.find(|w| *w == "inet")?;
        let cidr = words.next()?;
        cidr.split('/').next()?.parse().ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_ip_output() {
        let out = "3: eth1    inet 10.1.1.2/24 brd 10.1.1.255 scope global eth1\\       valid_lft forever preferred_lft forever";
        assert_eq!(
            parse_ipv4_addr_output(out),
            Some(Ipv4Address::new(10, 1, 1, 2))
        );
    }

    #[test]
    fn test_parse_ip_output_first_address_wins() {
        let out = "3: eth1    inet 10.1.1.2/24 scope global eth1\n\
                   3: eth1    inet 10.9.9.9/32 scope global secondary eth1";
        assert_eq!(
            parse_ipv4_addr_output(out),
            Some(Ipv4Address::new(10, 1, 1, 2))
        );
    }

    #[test]
    fn test_parse_ip_output_empty() {
        assert_eq!(parse_ipv4_addr_output(""), None);
        assert_eq!(parse_ipv4_addr_output("3: eth1    inet6 fe80::1/64 scope link"), None);
    }

    #[tokio::test]
    async fn test_static_host() {
        let host = StaticHost(HostIdentity::new(Ipv4Address::new(10, 1, 1, 2)));
        assert_eq!(host.discover().await.address(), Ipv4Address::new(10, 1, 1, 2));
    }

    #[tokio::test]
    async fn test_missing_interface_is_unresolved() {
        let discovery = InterfaceDiscovery::new("no-such-if0");
        assert_eq!(discovery.discover().await, HostIdentity::UNRESOLVED);
    }
}
