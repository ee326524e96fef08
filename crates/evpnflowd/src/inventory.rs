//! Container inventory access
//!
//! The inventory is owned by the container runtime integration; this crate
//! only reads it. A fresh snapshot is taken for every local port lookup.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use flowmgr_common::{FlowError, FlowResult};

use crate::types::InventorySnapshot;

/// Read-only view of local containers and their networks
#[async_trait]
pub trait Inventory: Send + Sync {
    async fn snapshot(&self) -> FlowResult<InventorySnapshot>;
}

/// Inventory published as a JSON file:
///
/// ```json
/// {
///   "endpoints": [
///     {"ip": "10.0.0.5", "mac": "aa:bb:cc:dd:ee:ff",
///      "network_id": "3f2a", "port_name": "veth5a"}
///   ],
///   "networks": {"3f2a": {"vni": 42}}
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileInventory {
    path: PathBuf,
}

impl FileInventory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Inventory for FileInventory {
    async fn snapshot(&self) -> FlowResult<InventorySnapshot> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            FlowError::inventory(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            FlowError::inventory(format!("cannot parse {}: {}", self.path.display(), e))
        })
    }
}

#[async_trait]
impl Inventory for InventorySnapshot {
    async fn snapshot(&self) -> FlowResult<InventorySnapshot> {
        Ok(self.clone())
    }
}
