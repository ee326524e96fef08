//! Flow installation

use std::sync::Arc;

use flowmgr_common::FlowResult;
use tracing::{info, warn};

use crate::flow::FlowRule;
use crate::switch::SwitchChannel;

/// Submits rules to the switch. Failures are logged and returned, never retried.
#[derive(Clone)]
pub struct FlowInstaller {
    switch: Arc<dyn SwitchChannel>,
}

impl FlowInstaller {
    pub fn new(switch: Arc<dyn SwitchChannel>) -> Self {
        Self { switch }
    }

    pub async fn install(&self, rule: &FlowRule) -> FlowResult<()> {
        match self.switch.install_rule(rule).await {
            Ok(()) => {
                info!(kind = %rule.kind, flow = %rule, "Installed flow");
                Ok(())
            }
            Err(e) => {
                warn!(kind = %rule.kind, flow = %rule, error = %e, "Failed to install flow");
                Err(e)
            }
        }
    }
}
