//! In-memory switch used by unit tests

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use evpn_types::Ipv4Address;
use flowmgr_common::{FlowError, FlowResult};

use crate::flow::{FlowRule, RuleKind};
use crate::switch::SwitchChannel;
use crate::types::PortNo;

#[derive(Default)]
pub struct MockSwitch {
    by_address: HashMap<Ipv4Address, PortNo>,
    by_name: HashMap<String, PortNo>,
    rejected: HashSet<RuleKind>,
    installed: Mutex<Vec<FlowRule>>,
    queries: Mutex<Vec<String>>,
}

impl MockSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tunnel(mut self, nexthop: Ipv4Address, port: u32) -> Self {
        self.by_address.insert(nexthop, PortNo::new(port));
        self
    }

    pub fn with_port(mut self, name: &str, port: u32) -> Self {
        self.by_name.insert(name.to_string(), PortNo::new(port));
        self
    }

    /// Make `install_rule` fail for rules of `kind`.
    pub fn rejecting(mut self, kind: RuleKind) -> Self {
        self.rejected.insert(kind);
        self
    }

    pub fn installed(&self) -> Vec<FlowRule> {
        self.installed.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SwitchChannel for MockSwitch {
    async fn find_port_by_address(&self, address: Ipv4Address) -> FlowResult<PortNo> {
        self.queries.lock().unwrap().push(format!("address {}", address));
        self.by_address
            .get(&address)
            .copied()
            .ok_or_else(|| FlowError::port_not_found(format!("address {}", address)))
    }

    async fn find_port_by_name(&self, name: &str) -> FlowResult<PortNo> {
        self.queries.lock().unwrap().push(format!("name {}", name));
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| FlowError::port_not_found(format!("name {}", name)))
    }

    async fn install_rule(&self, rule: &FlowRule) -> FlowResult<()> {
        if self.rejected.contains(&rule.kind) {
            return Err(FlowError::ShellCommandFailed {
                command: format!("add-flow {}", rule),
                exit_code: 1,
                output: "rejected".to_string(),
            });
        }
        self.installed.lock().unwrap().push(rule.clone());
        Ok(())
    }
}
