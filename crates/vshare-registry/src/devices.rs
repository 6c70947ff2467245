//! Device collections for a single logical resource

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use vshare_core::Device;

/// Devices of one resource, keyed by device id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Devices(HashMap<String, Device>);

impl Devices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a device, replacing any record with the same id
    pub fn insert(&mut self, device: Device) -> Option<Device> {
        self.0.insert(device.id.clone(), device)
    }

    /// Check whether every listed id is present
    pub fn contains<S: AsRef<str>>(&self, ids: &[S]) -> bool {
        ids.iter().all(|id| self.0.contains_key(id.as_ref()))
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Device> {
        self.0.get(id)
    }

    /// Find a device by partition index; devices without an index match on id
    pub fn get_by_index(&self, index: &str) -> Option<&Device> {
        self.0.values().find(|device| device.index_or_id() == index)
    }

    /// Devices whose ids are listed; unknown ids are ignored
    pub fn subset<S: AsRef<str>>(&self, ids: &[S]) -> Devices {
        let subset = ids
            .iter()
            .filter_map(|id| self.0.get(id.as_ref()))
            .map(|device| (device.id.clone(), device.clone()))
            .collect();
        Devices(subset)
    }

    /// Devices in `self` that are not in `other`
    pub fn difference(&self, other: &Devices) -> Devices {
        let difference = self
            .0
            .iter()
            .filter(|(id, _)| !other.0.contains_key(id.as_str()))
            .map(|(id, device)| (id.clone(), device.clone()))
            .collect();
        Devices(difference)
    }

    /// Sorted device ids
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.0.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Sorted partition indices (device id for devices without one)
    pub fn indices(&self) -> Vec<String> {
        let mut indices: Vec<String> = self
            .0
            .values()
            .map(|device| device.index_or_id().to_string())
            .collect();
        indices.sort();
        indices
    }

    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.0.values()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Device> for Devices {
    fn from_iter<I: IntoIterator<Item = Device>>(iter: I) -> Self {
        let mut devices = Devices::new();
        for device in iter {
            devices.insert(device);
        }
        devices
    }
}
