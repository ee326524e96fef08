//! Configuration file support for evpnflowd
//!
//! Loads and validates configuration from TOML files.
//! Default location: /etc/evpnflowd/evpnflowd.toml

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use evpn_types::Ipv4Address;
use flowmgr_common::{shell, FlowError, FlowResult};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::flow_mgr::DEFAULT_ENDPOINT_CAPACITY;
use crate::types::{HostIdentity, DEFAULT_BRIDGE, DEFAULT_FABRIC_INTERFACE};

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/evpnflowd/evpnflowd.toml";

/// Switch access configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchConfig {
    /// OVS bridge carrying the overlay
    #[serde(default = "default_bridge")]
    pub bridge: String,

    /// Path to ovs-ofctl
    #[serde(default = "default_ofctl_path")]
    pub ofctl_path: String,

    /// Upper bound for each switch or host command, in milliseconds
    #[serde(default = "default_command_timeout")]
    pub command_timeout_ms: u64,
}

/// Host identity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Interface whose IPv4 address identifies this host on the fabric
    #[serde(default = "default_fabric_interface")]
    pub fabric_interface: String,

    /// Fixed host address; skips interface discovery when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_address: Option<String>,
}

/// Container inventory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// JSON inventory snapshot written by the container runtime integration
    #[serde(default = "default_inventory_path")]
    pub path: PathBuf,
}

/// Endpoint move tracking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    /// Endpoints remembered for move logging; 0 disables tracking
    #[serde(default = "default_endpoint_capacity")]
    pub capacity: usize,
}

/// Complete evpnflowd configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvpnFlowConfig {
    #[serde(default)]
    pub switch: SwitchConfig,

    #[serde(default)]
    pub host: HostConfig,

    #[serde(default)]
    pub inventory: InventoryConfig,

    #[serde(default)]
    pub endpoints: EndpointsConfig,
}

fn default_bridge() -> String {
    DEFAULT_BRIDGE.to_string()
}

fn default_ofctl_path() -> String {
    shell::OVS_OFCTL_CMD.to_string()
}

fn default_command_timeout() -> u64 {
    shell::DEFAULT_COMMAND_TIMEOUT.as_millis() as u64
}

fn default_fabric_interface() -> String {
    DEFAULT_FABRIC_INTERFACE.to_string()
}

fn default_inventory_path() -> PathBuf {
    PathBuf::from("/var/run/evpnflowd/inventory.json")
}

fn default_endpoint_capacity() -> usize {
    DEFAULT_ENDPOINT_CAPACITY
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            bridge: default_bridge(),
            ofctl_path: default_ofctl_path(),
            command_timeout_ms: default_command_timeout(),
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            fabric_interface: default_fabric_interface(),
            static_address: None,
        }
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            path: default_inventory_path(),
        }
    }
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            capacity: default_endpoint_capacity(),
        }
    }
}

impl EvpnFlowConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> FlowResult<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                FlowError::invalid_config(
                    path.display().to_string(),
                    format!("failed to parse config file: {}", e),
                )
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(FlowError::invalid_config(
                path.display().to_string(),
                e.to_string(),
            )),
        }
    }

    /// Get command timeout as Duration
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.switch.command_timeout_ms)
    }

    /// Host identity pinned by configuration, if any
    pub fn static_host(&self) -> FlowResult<Option<HostIdentity>> {
        self.host
            .static_address
            .as_deref()
            .map(|s| {
                s.parse::<Ipv4Address>()
                    .map(HostIdentity::new)
                    .map_err(|e| FlowError::invalid_config("host.static_address", e.to_string()))
            })
            .transpose()
    }

    /// Validate configuration
    pub fn validate(&self) -> FlowResult<()> {
        if self.switch.bridge.is_empty() {
            return Err(FlowError::invalid_config("switch.bridge", "must not be empty"));
        }

        if self.switch.command_timeout_ms == 0 {
            return Err(FlowError::invalid_config(
                "switch.command_timeout_ms",
                "must be > 0",
            ));
        }

        if self.host.static_address.is_none() && self.host.fabric_interface.is_empty() {
            return Err(FlowError::invalid_config(
                "host.fabric_interface",
                "required when host.static_address is not set",
            ));
        }

        self.static_host()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = EvpnFlowConfig::default();
        assert_eq!(config.switch.bridge, "docker0-ovs");
        assert_eq!(config.switch.ofctl_path, "/usr/bin/ovs-ofctl");
        assert_eq!(config.host.fabric_interface, "eth1");
        assert_eq!(config.command_timeout(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
[switch]
bridge = "br-fabric"
command_timeout_ms = 1500

[host]
static_address = "10.1.1.2"
"#;
        let config: EvpnFlowConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.switch.bridge, "br-fabric");
        assert_eq!(config.command_timeout(), Duration::from_millis(1500));
        // Unspecified values should use defaults
        assert_eq!(config.switch.ofctl_path, "/usr/bin/ovs-ofctl");
        assert_eq!(config.host.fabric_interface, "eth1");
        assert_eq!(
            config.static_host().unwrap(),
            Some(HostIdentity::new(Ipv4Address::new(10, 1, 1, 2)))
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = EvpnFlowConfig::default();
        config.switch.command_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = EvpnFlowConfig::default();
        config.switch.bridge.clear();
        assert!(config.validate().is_err());

        let mut config = EvpnFlowConfig::default();
        config.host.static_address = Some("10.1.1".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_static_address_replaces_interface() {
        let mut config = EvpnFlowConfig::default();
        config.host.fabric_interface.clear();
        assert!(config.validate().is_err());

        config.host.static_address = Some("10.1.1.2".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evpnflowd.toml");
        fs::write(&path, "[inventory]\npath = \"/tmp/inv.json\"\n").unwrap();

        let config = EvpnFlowConfig::load_or_default(&path).unwrap();
        assert_eq!(config.inventory.path, PathBuf::from("/tmp/inv.json"));
        assert_eq!(config.endpoints.capacity, DEFAULT_ENDPOINT_CAPACITY);
    }

    #[test]
    fn test_endpoint_capacity() {
        let config: EvpnFlowConfig = toml::from_str("[endpoints]\ncapacity = 128\n").unwrap();
        assert_eq!(config.endpoints.capacity, 128);
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evpnflowd.toml");
        fs::write(&path, "[switch\nbridge = ").unwrap();

        assert!(matches!(
            EvpnFlowConfig::load_or_default(&path),
            Err(FlowError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_load_nonexistent_file_defaults() {
        let config = EvpnFlowConfig::load_or_default("/nonexistent/path.toml").unwrap();
        assert_eq!(config.switch.bridge, "docker0-ovs");
    }

    #[test]
    fn test_toml_round_trip_keeps_defaults() {
        let config = EvpnFlowConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("docker0-ovs"));
        assert!(!toml_str.contains("static_address"));
    }
}
