//! Builders for the allocation and quota objects the ledger consumes

use vshare_core::config::{
    DEFAULT_CORES_DIMENSION, DEFAULT_MEMORY_DIMENSION, DEFAULT_QUOTA_KEY_PREFIX,
    DEFAULT_VENDOR_MARKER,
};
use vshare_core::{ContainerDevice, ContainerDevices, PodDevices, Quantity, ResourceQuota};

/// A vendor device slice with the given memory (MiB) and core share
pub fn container_device(uuid: &str, used_mem: i32, used_cores: i32) -> ContainerDevice {
    ContainerDevice::new(uuid, DEFAULT_VENDOR_MARKER, used_mem, used_cores)
}

/// Pod devices for a single device type, one entry per container
pub fn pod_devices(device_type: &str, containers: Vec<ContainerDevices>) -> PodDevices {
    let mut pod_devices = PodDevices::new();
    pod_devices.insert(device_type.to_string(), containers);
    pod_devices
}

/// Vendor pod devices from `(used_mem, used_cores)` pairs per container
pub fn vendor_pod_devices(containers: &[&[(i32, i32)]]) -> PodDevices {
    let containers: Vec<ContainerDevices> = containers
        .iter()
        .enumerate()
        .map(|(ctr, devices)| {
            devices
                .iter()
                .enumerate()
                .map(|(i, (mem, cores))| {
                    container_device(&format!("GPU-{}-{}", ctr, i), *mem, *cores).with_idx(i as i32)
                })
                .collect()
        })
        .collect();
    pod_devices(DEFAULT_VENDOR_MARKER, containers)
}

/// Full quota key for a dimension, e.g. "requests.nvidia.com/gpumem"
pub fn quota_key(dimension: &str) -> String {
    format!("{}{}", DEFAULT_QUOTA_KEY_PREFIX, dimension)
}

/// Quota object limiting both accelerator dimensions of a namespace
pub fn resource_quota(namespace: &str, memory: i64, cores: i64) -> ResourceQuota {
    ResourceQuota::new("gpu-quota", namespace)
        .with_hard(quota_key(DEFAULT_MEMORY_DIMENSION), Quantity::from(memory))
        .with_hard(quota_key(DEFAULT_CORES_DIMENSION), Quantity::from(cores))
}
