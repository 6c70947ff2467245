//! # vshare-quota
//!
//! Per-namespace accelerator quota ledger.
//!
//! This crate provides:
//! - Admission checks against namespace memory and core limits
//! - Usage bookkeeping as pods are allocated and released
//! - Limit synchronization from observed quota objects
//! - Ledger snapshots and statistics for diagnostics
//!
//! ## Example
//!
//! ```rust
//! use vshare_core::{ContainerDevice, PodDevices, PodRef, ResourceQuota};
//! use vshare_quota::QuotaManager;
//!
//! let ledger = QuotaManager::new();
//! ledger.add_quota(
//!     &ResourceQuota::new("gpu-quota", "team-a")
//!         .with_hard("requests.nvidia.com/gpumem", "8Gi"),
//! );
//!
//! let mut devices = PodDevices::new();
//! devices.insert(
//!     "NVIDIA".to_string(),
//!     vec![vec![ContainerDevice::new("GPU-0", "NVIDIA", 4096, 50)]],
//! );
//!
//! if ledger.fit_quota("team-a", 4096, 50) {
//!     ledger.add_usage(&PodRef::new("team-a", "trainer-0"), &devices);
//! }
//! ```

use thiserror::Error;

pub mod manager;
pub mod quota;

// Re-export commonly used types
pub use manager::{LedgerSnapshot, LedgerStats, LedgerStatsSnapshot, QuotaManager};
pub use quota::{DeviceQuota, Quota, Usage};

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, QuotaError>;

/// Errors that can occur during ledger operations
#[derive(Error, Debug)]
pub enum QuotaError {
    #[error("No quota ledger for namespace {0}")]
    NamespaceNotFound(String),

    #[error("No {dimension} quota recorded for namespace {namespace}")]
    DimensionNotFound { namespace: String, dimension: String },

    #[error("Invalid ledger configuration: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl QuotaError {
    /// Whether the error reports ledger state that was never recorded
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            QuotaError::NamespaceNotFound(_) | QuotaError::DimensionNotFound { .. }
        )
    }
}
