//! # vshare-registry
//!
//! Inventory of schedulable accelerator devices, grouped by the logical resource
//! they satisfy.
//!
//! Device discovery populates a [`DeviceMap`] through [`DeviceMap::insert`]; the
//! allocation pipeline reads it to pick candidate devices.
//!
//! ## Example
//!
//! ```rust
//! use vshare_core::{Device, ResourceName};
//! use vshare_registry::DeviceMap;
//!
//! let mut map = DeviceMap::new();
//! map.insert("nvidia.com/gpu", Device::new("GPU-0"));
//! map.insert("nvidia.com/gpu", Device::new("GPU-1").with_index("1"));
//!
//! let gpus = map.get(&ResourceName::new("nvidia.com/gpu")).unwrap();
//! assert_eq!(gpus.ids(), vec!["GPU-0", "GPU-1"]);
//! ```

pub mod device_map;
pub mod devices;

pub use device_map::DeviceMap;
pub use devices::Devices;
