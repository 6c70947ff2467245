//! Device records and per-pod allocation data
//!
//! `Device` is what discovery reports for a schedulable unit. `ContainerDevice`
//! and the `PodDevices` aliases describe what the allocation pipeline handed to
//! a pod, and carry the usage figures the quota ledger accounts for.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Health value reported for devices that are fit for scheduling
pub const HEALTHY: &str = "Healthy";

/// A single schedulable device or device partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Identifier, unique within its resource grouping
    pub id: String,

    /// Optional partition identifier (e.g. "0:1" for a MIG slice)
    pub index: Option<String>,

    /// Health as reported by discovery
    pub health: String,

    /// Device node paths exposed to containers
    #[serde(default)]
    pub paths: Vec<String>,

    /// Total device memory in MiB, if known
    pub total_memory: Option<u64>,

    /// Vendor-specific fields, passed through untouched
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

impl Device {
    /// Create a healthy device with no partition index
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            index: None,
            health: HEALTHY.to_string(),
            paths: Vec::new(),
            total_memory: None,
            annotations: BTreeMap::new(),
        }
    }

    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    pub fn with_health(mut self, health: impl Into<String>) -> Self {
        self.health = health.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.paths.push(path.into());
        self
    }

    pub fn with_total_memory(mut self, mib: u64) -> Self {
        self.total_memory = Some(mib);
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Whether discovery reported this device as healthy
    pub fn is_healthy(&self) -> bool {
        self.health == HEALTHY
    }

    /// The partition index if set, otherwise the device id
    pub fn index_or_id(&self) -> &str {
        self.index.as_deref().unwrap_or(&self.id)
    }
}

/// One device slice allocated to a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerDevice {
    /// Position of the device on its node
    pub idx: i32,

    /// Device UUID
    pub uuid: String,

    /// Vendor device type (e.g. "NVIDIA")
    pub device_type: String,

    /// Memory granted to the container, in MiB
    pub used_mem: i32,

    /// Compute share granted to the container, in percent of the device
    pub used_cores: i32,
}

impl ContainerDevice {
    pub fn new(
        uuid: impl Into<String>,
        device_type: impl Into<String>,
        used_mem: i32,
        used_cores: i32,
    ) -> Self {
        Self {
            idx: 0,
            uuid: uuid.into(),
            device_type: device_type.into(),
            used_mem,
            used_cores,
        }
    }

    pub fn with_idx(mut self, idx: i32) -> Self {
        self.idx = idx;
        self
    }
}

/// Ordered devices of a single container
pub type ContainerDevices = Vec<ContainerDevice>;

/// Devices of one resource, indexed by container position
pub type PodSingleDevice = Vec<ContainerDevices>;

/// Devices allocated to a pod, keyed by resource / device type name
pub type PodDevices = HashMap<String, PodSingleDevice>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_builder() {
        let device = Device::new("GPU-0")
            .with_index("0:1")
            .with_path("/dev/nvidia0")
            .with_total_memory(16384)
            .with_annotation("model", "A100");

        assert_eq!(device.id, "GPU-0");
        assert_eq!(device.index.as_deref(), Some("0:1"));
        assert_eq!(device.paths, vec!["/dev/nvidia0".to_string()]);
        assert_eq!(device.total_memory, Some(16384));
        assert_eq!(device.annotations.get("model").map(String::as_str), Some("A100"));
        assert!(device.is_healthy());
    }

    #[test]
    fn test_index_or_id() {
        assert_eq!(Device::new("GPU-0").index_or_id(), "GPU-0");
        assert_eq!(Device::new("GPU-0").with_index("3").index_or_id(), "3");
    }

    #[test]
    fn test_unhealthy_device() {
        let device = Device::new("GPU-1").with_health("Unhealthy");
        assert!(!device.is_healthy());
    }

    #[test]
    fn test_device_deserializes_with_defaults() {
        let json = r#"{"id":"GPU-2","index":null,"health":"Healthy","total_memory":null}"#;
        let device: Device = serde_json::from_str(json).unwrap();
        assert_eq!(device, Device::new("GPU-2"));
    }
}
