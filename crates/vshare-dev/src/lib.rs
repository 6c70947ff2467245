//! # vshare-dev
//!
//! Development and testing utilities for vshare.
//!
//! This crate provides:
//! - Test logging setup
//! - Fixture builders for pod allocations and quota objects
//! - Random test data generation

pub mod fixtures;
pub mod utils;

pub use fixtures::{container_device, pod_devices, quota_key, resource_quota, vendor_pod_devices};
pub use utils::{generate_test_data, setup_test_logging, TestDataGenerator};
