//! Resource name to device collection mapping

use crate::Devices;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use vshare_core::{Device, ResourceName};

/// Devices grouped by the logical resource they satisfy.
///
/// The map does no locking of its own; callers that share it across threads
/// serialize access themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceMap(HashMap<ResourceName, Devices>);

impl DeviceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert `device` under `resource`, creating the resource entry if needed.
    ///
    /// A device with the same id is replaced as a whole.
    pub fn insert(&mut self, resource: impl Into<ResourceName>, device: Device) {
        let resource = resource.into();
        debug!("Registering device {} under {}", device.id, resource);
        self.0.entry(resource).or_default().insert(device);
    }

    pub fn get(&self, resource: &ResourceName) -> Option<&Devices> {
        self.0.get(resource)
    }

    /// Look up a single device of a resource
    pub fn device(&self, resource: &ResourceName, id: &str) -> Option<&Device> {
        self.0.get(resource).and_then(|devices| devices.get_by_id(id))
    }

    /// Sorted resource names
    pub fn resource_names(&self) -> Vec<ResourceName> {
        let mut names: Vec<ResourceName> = self.0.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResourceName, &Devices)> {
        self.0.iter()
    }

    /// Number of resources
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(ResourceName, Devices)> for DeviceMap {
    fn from_iter<I: IntoIterator<Item = (ResourceName, Devices)>>(iter: I) -> Self {
        DeviceMap(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vshare_dev::{generate_test_data, setup_test_logging};

    fn device_map(entries: Vec<(&str, Vec<&Device>)>) -> DeviceMap {
        entries
            .into_iter()
            .map(|(resource, devices)| {
                (
                    ResourceName::from(resource),
                    devices.into_iter().cloned().collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_device_map_insert() {
        let device0 = Device::new("0");
        let device0_with_index = Device::new("0").with_index("index");
        let device1 = Device::new("1");

        struct TestCase<'a> {
            description: &'a str,
            device_map: DeviceMap,
            key: &'a str,
            value: &'a Device,
            expected: DeviceMap,
        }

        let test_cases = vec![
            TestCase {
                description: "insert into empty map",
                device_map: DeviceMap::new(),
                key: "resource",
                value: &device0,
                expected: device_map(vec![("resource", vec![&device0])]),
            },
            TestCase {
                description: "add to existing resource",
                device_map: device_map(vec![("resource", vec![&device0])]),
                key: "resource",
                value: &device1,
                expected: device_map(vec![("resource", vec![&device0, &device1])]),
            },
            TestCase {
                description: "add new resource",
                device_map: device_map(vec![("resource", vec![&device0])]),
                key: "resource1",
                value: &device0,
                expected: device_map(vec![
                    ("resource", vec![&device0]),
                    ("resource1", vec![&device0]),
                ]),
            },
            TestCase {
                description: "overwrite existing device",
                device_map: device_map(vec![("resource", vec![&device0])]),
                key: "resource",
                value: &device0_with_index,
                expected: device_map(vec![("resource", vec![&device0_with_index])]),
            },
        ];

        for mut tc in test_cases {
            tc.device_map.insert(tc.key, tc.value.clone());
            assert_eq!(tc.device_map, tc.expected, "{}", tc.description);
        }
    }

    #[test]
    fn test_lookups() {
        let mut map = DeviceMap::new();
        map.insert("nvidia.com/gpu", Device::new("GPU-0"));
        map.insert("nvidia.com/gpu", Device::new("GPU-1"));
        map.insert("nvidia.com/mig-1g.5gb", Device::new("MIG-0").with_index("0:0"));

        let gpu = ResourceName::new("nvidia.com/gpu");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&gpu).map(Devices::len), Some(2));
        assert!(map.device(&gpu, "GPU-1").is_some());
        assert!(map.device(&gpu, "MIG-0").is_none());
        assert!(map.get(&ResourceName::new("missing")).is_none());
        assert_eq!(
            map.resource_names(),
            vec![
                ResourceName::new("nvidia.com/gpu"),
                ResourceName::new("nvidia.com/mig-1g.5gb")
            ]
        );
    }

    #[test]
    fn test_overwrite_replaces_all_fields() {
        let mut map = DeviceMap::new();
        map.insert(
            "nvidia.com/gpu",
            Device::new("GPU-0").with_annotation("driver", "535").with_total_memory(16384),
        );
        map.insert("nvidia.com/gpu", Device::new("GPU-0").with_health("Unhealthy"));

        let device = map.device(&ResourceName::new("nvidia.com/gpu"), "GPU-0").unwrap();
        assert!(!device.is_healthy());
        assert!(device.annotations.is_empty());
        assert_eq!(device.total_memory, None);
    }

    #[test]
    fn test_bulk_registration() {
        setup_test_logging();
        let mut generator = generate_test_data();
        let mut map = DeviceMap::new();

        let devices: Vec<Device> = (0..32).map(|_| generator.random_device()).collect();
        for device in &devices {
            map.insert("nvidia.com/gpu", device.clone());
        }
        // re-registration after a metadata refresh keeps membership stable
        for device in &devices {
            map.insert("nvidia.com/gpu", device.clone().with_annotation("refreshed", "true"));
        }

        let registered = map.get(&ResourceName::new("nvidia.com/gpu")).unwrap();
        assert_eq!(registered.len(), devices.len());
        assert!(registered.iter().all(|d| d.annotations.contains_key("refreshed")));
    }

    #[test]
    fn test_serializes_as_nested_maps() {
        let mut map = DeviceMap::new();
        map.insert("nvidia.com/gpu", Device::new("GPU-0"));

        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["nvidia.com/gpu"]["GPU-0"]["id"], "GPU-0");
    }
}
