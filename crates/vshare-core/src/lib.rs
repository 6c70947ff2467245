//! # vshare-core
//!
//! Core types and utilities shared by the vshare device registry and quota ledger.
//!
//! This crate provides:
//!
//! - Device records and per-pod allocation data (`Device`, `ContainerDevice`, `PodDevices`)
//! - Observed quota objects and orchestrator quantities (`ResourceQuota`, `Quantity`)
//! - Ledger configuration loading
//! - Error handling types and utilities

pub mod config;
pub mod device;
pub mod error;
pub mod quantity;
pub mod quota;
pub mod types;

// Re-export commonly used types at the crate root
pub use config::LedgerConfig;
pub use device::{ContainerDevice, ContainerDevices, Device, PodDevices, PodSingleDevice};
pub use error::{Error, ErrorContext, Result};
pub use quantity::Quantity;
pub use quota::ResourceQuota;
pub use types::{PodRef, ResourceName};
