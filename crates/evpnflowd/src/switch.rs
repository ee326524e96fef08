//! Switch-control channel
//!
//! Port topology and the flow table are owned by the switch. Every lookup
//! queries the switch afresh; nothing is cached here.

use std::time::Duration;

use async_trait::async_trait;
use evpn_types::Ipv4Address;
use flowmgr_common::{shell, FlowError, FlowResult};
use tracing::info;

use crate::commands::{build_add_flow_cmd, build_show_ports_cmd};
use crate::flow::FlowRule;
use crate::port_table::PortTable;
use crate::types::PortNo;

/// Capability interface to the local virtual switch
#[async_trait]
pub trait SwitchChannel: Send + Sync {
    /// Port through which `address` is currently reachable.
    async fn find_port_by_address(&self, address: Ipv4Address) -> FlowResult<PortNo>;

    /// Numeric index of the named port.
    async fn find_port_by_name(&self, name: &str) -> FlowResult<PortNo>;

    /// Installs (or replaces) a rule in the flow table.
    async fn install_rule(&self, rule: &FlowRule) -> FlowResult<()>;
}

/// [`SwitchChannel`] backed by the `ovs-ofctl` command line tool
#[derive(Debug, Clone)]
pub struct OvsOfctl {
    ofctl: String,
    bridge: String,
    timeout: Duration,
    dry_run: bool,
}

impl OvsOfctl {
    pub fn new(bridge: impl Into<String>) -> Self {
        Self {
            ofctl: shell::OVS_OFCTL_CMD.to_string(),
            bridge: bridge.into(),
            timeout: shell::DEFAULT_COMMAND_TIMEOUT,
            dry_run: false,
        }
    }

    pub fn with_ofctl_path(mut self, path: impl Into<String>) -> Self {
        self.ofctl = path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Log `add-flow` commands instead of running them. Port queries still run.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    async fn port_table(&self) -> FlowResult<PortTable> {
        let cmd = build_show_ports_cmd(&self.ofctl, &self.bridge);
        let output = shell::exec_or_throw(&cmd, self.timeout).await?;
        Ok(PortTable::parse(&output))
    }
}

#[async_trait]
impl SwitchChannel for OvsOfctl {
    async fn find_port_by_address(&self, address: Ipv4Address) -> FlowResult<PortNo> {
        self.port_table()
            .await?
            .find_by_address(address)
            .ok_or_else(|| FlowError::port_not_found(format!("address {}", address)))
    }

    async fn find_port_by_name(&self, name: &str) -> FlowResult<PortNo> {
        self.port_table()
            .await?
            .find_by_name(name)
            .ok_or_else(|| FlowError::port_not_found(format!("name {}", name)))
    }

    async fn install_rule(&self, rule: &FlowRule) -> FlowResult<()> {
        let cmd = build_add_flow_cmd(&self.ofctl, &self.bridge, rule);
        if self.dry_run {
            info!(command = %cmd, "Dry run, not installing flow");
            return Ok(());
        }
        shell::exec_or_throw(&cmd, self.timeout).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::arp_responder;

    /// Stand-in for ovs-ofctl, run through sh so it needs no exec bit.
    fn fake_ofctl(dir: &tempfile::TempDir, script: &str) -> String {
        let path = dir.path().join("ovs-ofctl");
        std::fs::write(&path, format!("{}\n", script)).unwrap();
        format!("/bin/sh {}", path.display())
    }

    const SHOW: &str = r#"echo 'OFPT_FEATURES_REPLY (xid=0x2): dpid:0000be3a48a29f4c'
echo ' 1(vxlan-10.1.1.1): addr:9e:6d:02:5c:4e:11'
echo ' 5(veth5a): addr:02:42:ac:11:00:02'"#;

    #[tokio::test]
    async fn test_find_port_by_address() {
        let dir = tempfile::tempdir().unwrap();
        let switch = OvsOfctl::new("docker0-ovs").with_ofctl_path(fake_ofctl(&dir, SHOW));

        let port = switch
            .find_port_by_address(Ipv4Address::new(10, 1, 1, 1))
            .await
            .unwrap();
        assert_eq!(port, PortNo::new(1));

        let missing = switch
            .find_port_by_address(Ipv4Address::new(10, 9, 9, 9))
            .await;
        assert!(matches!(missing, Err(FlowError::PortNotFound { .. })));
    }

    #[tokio::test]
    async fn test_find_port_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let switch = OvsOfctl::new("docker0-ovs").with_ofctl_path(fake_ofctl(&dir, SHOW));

        assert_eq!(
            switch.find_port_by_name("veth5a").await.unwrap(),
            PortNo::new(5)
        );
        assert!(switch.find_port_by_name("veth9").await.is_err());
    }

    #[tokio::test]
    async fn test_install_rule_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let ofctl = fake_ofctl(&dir, "echo 'not a bridge' >&2; exit 1");
        let switch = OvsOfctl::new("docker0-ovs").with_ofctl_path(ofctl);

        let rule = arp_responder("aa:bb:cc:dd:ee:ff".parse().unwrap(), Ipv4Address::new(10, 0, 0, 5));
        match switch.install_rule(&rule).await {
            Err(FlowError::ShellCommandFailed { exit_code, output, .. }) => {
                assert_eq!(exit_code, 1);
                assert_eq!(output, "not a bridge");
            }
            other => panic!("Expected ShellCommandFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_install_rule_passes_flow_argument() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls");
        let ofctl = fake_ofctl(&dir, &format!("echo \"$@\" > {}", log.display()));
        let switch = OvsOfctl::new("docker0-ovs").with_ofctl_path(ofctl);

        let rule = arp_responder("aa:bb:cc:dd:ee:ff".parse().unwrap(), Ipv4Address::new(10, 0, 0, 5));
        switch.install_rule(&rule).await.unwrap();

        let recorded = std::fs::read_to_string(&log).unwrap();
        assert_eq!(recorded.trim(), format!("add-flow docker0-ovs {}", rule));
    }

    #[tokio::test]
    async fn test_dry_run_does_not_execute() {
        let switch = OvsOfctl::new("docker0-ovs")
            .with_ofctl_path("/nonexistent/ovs-ofctl")
            .with_dry_run(true);
        let rule = arp_responder("aa:bb:cc:dd:ee:ff".parse().unwrap(), Ipv4Address::new(10, 0, 0, 5));
        assert!(switch.install_rule(&rule).await.is_ok());
    }

    #[tokio::test]
    async fn test_query_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let switch = OvsOfctl::new("docker0-ovs")
            .with_ofctl_path(fake_ofctl(&dir, "sleep 5"))
            .with_timeout(Duration::from_millis(50));

        let result = switch.find_port_by_name("veth5a").await;
        assert!(matches!(result, Err(FlowError::Timeout { .. })));
    }
}
