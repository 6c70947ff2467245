//! Namespace quota ledger
//!
//! The ledger is a sharded concurrent map from namespace to [`DeviceQuota`]. Every
//! operation holds the guard of the namespace entry it touches for its whole
//! duration: admission checks take a shared guard, usage and limit updates take an
//! exclusive one. A check never observes a half-applied update and concurrent
//! usage updates on one namespace never lose an increment. `fit_quota` followed by
//! `add_usage` is still two separate steps; the ledger is advisory.

use crate::quota::{DeviceQuota, Quota, Usage};
use crate::{QuotaError, Result};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use vshare_core::{LedgerConfig, PodDevices, PodRef, ResourceQuota};

/// Quota ledger shared by the quota watcher and the allocation pipeline
#[derive(Debug, Clone)]
pub struct QuotaManager {
    /// Quotas indexed by namespace
    quotas: Arc<DashMap<String, DeviceQuota>>,

    /// Configuration
    config: Arc<LedgerConfig>,

    /// Statistics
    stats: Arc<LedgerStats>,
}

/// Ledger statistics
#[derive(Debug, Default)]
pub struct LedgerStats {
    pub admitted: AtomicU64,
    pub rejected: AtomicU64,
    pub usage_added: AtomicU64,
    pub usage_removed: AtomicU64,
    pub limits_set: AtomicU64,
    pub limits_reset: AtomicU64,
}

/// Point-in-time copy of [`LedgerStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LedgerStatsSnapshot {
    pub admitted: u64,
    pub rejected: u64,
    pub usage_added: u64,
    pub usage_removed: u64,
    pub limits_set: u64,
    pub limits_reset: u64,
}

/// Snapshot of every namespace's quotas
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LedgerSnapshot {
    pub namespaces: BTreeMap<String, DeviceQuota>,
}

impl LedgerSnapshot {
    /// Render the snapshot as JSON for diagnostics
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl QuotaManager {
    /// Create a ledger with the default configuration
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    /// Create a ledger with configuration
    pub fn with_config(config: LedgerConfig) -> Self {
        Self {
            quotas: Arc::new(DashMap::new()),
            config: Arc::new(config),
            stats: Arc::new(LedgerStats::default()),
        }
    }

    /// Create a ledger after validating the configuration
    pub fn try_with_config(config: LedgerConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|err| QuotaError::Configuration(err.to_string()))?;
        Ok(Self::with_config(config))
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Check whether a namespace may take `mem_request` and `cores_request` more.
    ///
    /// Namespaces without a ledger entry are always admitted, as are dimensions
    /// without a configured limit.
    pub fn fit_quota(&self, namespace: &str, mem_request: i64, cores_request: i64) -> bool {
        let Some(dq) = self.quotas.get(namespace) else {
            self.stats.admitted.fetch_add(1, Ordering::Relaxed);
            return true;
        };

        let checks = [
            (self.config.memory_dimension.as_str(), mem_request),
            (self.config.cores_dimension.as_str(), cores_request),
        ];
        for (dimension, request) in checks {
            let Some(quota) = dq.get(dimension) else {
                continue;
            };
            debug!(
                namespace,
                dimension,
                limit = quota.limit,
                used = quota.used,
                request,
                "Judging quota"
            );
            if !quota.fits(request) {
                info!(
                    namespace,
                    dimension,
                    limit = quota.limit,
                    used = quota.used,
                    request,
                    "Quota not fitted"
                );
                self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                return false;
            }
        }

        self.stats.admitted.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Sum the vendor device usage of a pod across all containers
    pub fn count_usage(&self, pod_devices: &PodDevices) -> Usage {
        let mut usage = Usage::default();
        for (device_type, containers) in pod_devices {
            if !self.config.is_vendor_device(device_type) {
                continue;
            }
            for device in containers.iter().flatten() {
                usage.memory = usage.memory.saturating_add(i64::from(device.used_mem));
                usage.cores = usage.cores.saturating_add(i64::from(device.used_cores));
                usage.devices += 1;
            }
        }
        usage
    }

    /// Record the usage of a newly allocated pod.
    ///
    /// Creates the namespace and dimension entries on first use. Pods without
    /// vendor devices leave the ledger untouched.
    pub fn add_usage(&self, pod: &PodRef, pod_devices: &PodDevices) -> Usage {
        let usage = self.count_usage(pod_devices);
        if usage.is_empty() {
            debug!("Pod {} holds no {} devices", pod, self.config.vendor_marker);
            return usage;
        }

        let mut dq = self.quotas.entry(pod.namespace.clone()).or_default();
        for (dimension, delta) in self.usage_deltas(&usage) {
            let quota = dq.entry(dimension);
            quota.used = quota.used.saturating_add(delta);
        }
        debug!(namespace = %pod.namespace, quotas = ?*dq, "Ledger after adding usage of {}", pod);
        drop(dq);

        self.stats.usage_added.fetch_add(1, Ordering::Relaxed);
        usage
    }

    /// Release the usage of a deleted or deallocated pod.
    ///
    /// Never creates entries: a namespace or dimension that was never recorded is
    /// reported as an error and the ledger is left unchanged.
    pub fn rm_usage(&self, pod: &PodRef, pod_devices: &PodDevices) -> Result<Usage> {
        let usage = self.count_usage(pod_devices);
        if usage.is_empty() {
            return Ok(usage);
        }

        let mut dq = self
            .quotas
            .get_mut(&pod.namespace)
            .ok_or_else(|| QuotaError::NamespaceNotFound(pod.namespace.clone()))?;

        let deltas = self.usage_deltas(&usage);
        let missing = deltas.iter().find(|(dimension, _)| !dq.contains(dimension));
        if let Some((dimension, _)) = missing {
            return Err(QuotaError::DimensionNotFound {
                namespace: pod.namespace.clone(),
                dimension: dimension.to_string(),
            });
        }

        for (dimension, delta) in deltas {
            let Some(quota) = dq.get_mut(dimension) else {
                continue;
            };
            let mut used = quota.used.saturating_sub(delta);
            if used < 0 {
                if self.config.clamp_used_at_zero {
                    warn!(
                        namespace = %pod.namespace,
                        dimension,
                        used,
                        "Usage dropped below zero, clamping"
                    );
                    used = 0;
                } else {
                    warn!(
                        namespace = %pod.namespace,
                        dimension,
                        used,
                        "Usage dropped below zero"
                    );
                }
            }
            quota.used = used;
        }
        debug!(namespace = %pod.namespace, quotas = ?*dq, "Ledger after removing usage of {}", pod);
        drop(dq);

        self.stats.usage_removed.fetch_add(1, Ordering::Relaxed);
        Ok(usage)
    }

    /// Apply the hard limits of an observed quota object.
    ///
    /// Returns the number of dimensions whose limit was set. Entries that are not
    /// integers, lack the key prefix or name an untracked dimension are skipped.
    pub fn add_quota(&self, quota: &ResourceQuota) -> usize {
        let limits = self.tracked_limits(quota);
        if limits.is_empty() {
            return 0;
        }

        let mut dq = self.quotas.entry(quota.namespace.clone()).or_default();
        for (dimension, limit) in &limits {
            dq.entry(dimension).limit = *limit;
            info!(namespace = %quota.namespace, dimension = %dimension, limit, "Quota set");
        }
        debug!(namespace = %quota.namespace, quotas = ?*dq, "Ledger after setting quota");
        drop(dq);

        self.stats
            .limits_set
            .fetch_add(limits.len() as u64, Ordering::Relaxed);
        limits.len()
    }

    /// Lift the limits named by a deleted quota object.
    ///
    /// Each recognized dimension goes back to unbounded; usage is kept. Returns the
    /// number of dimensions reset. Dimensions the namespace never tracked are
    /// skipped; a namespace the ledger has never seen is an error.
    pub fn del_quota(&self, quota: &ResourceQuota) -> Result<usize> {
        let limits = self.tracked_limits(quota);
        if limits.is_empty() {
            return Ok(0);
        }

        let mut dq = self
            .quotas
            .get_mut(&quota.namespace)
            .ok_or_else(|| QuotaError::NamespaceNotFound(quota.namespace.clone()))?;

        let mut reset = 0;
        for (dimension, _) in &limits {
            match dq.get_mut(dimension) {
                Some(entry) => {
                    entry.limit = Quota::UNBOUNDED;
                    reset += 1;
                    info!(namespace = %quota.namespace, dimension = %dimension, "Quota removed");
                }
                None => {
                    debug!(
                        namespace = %quota.namespace,
                        dimension = %dimension,
                        "No quota to remove"
                    );
                }
            }
        }
        debug!(namespace = %quota.namespace, quotas = ?*dq, "Ledger after removing quota");
        drop(dq);

        self.stats
            .limits_reset
            .fetch_add(reset as u64, Ordering::Relaxed);
        Ok(reset)
    }

    /// Copy of a namespace's quotas
    pub fn namespace_quota(&self, namespace: &str) -> Option<DeviceQuota> {
        self.quotas.get(namespace).map(|entry| entry.clone())
    }

    /// Copy of one dimension's quota
    pub fn quota(&self, namespace: &str, dimension: &str) -> Option<Quota> {
        self.quotas
            .get(namespace)
            .and_then(|entry| entry.get(dimension).copied())
    }

    /// Sorted namespaces with a ledger entry
    pub fn namespaces(&self) -> Vec<String> {
        let mut namespaces: Vec<String> =
            self.quotas.iter().map(|entry| entry.key().clone()).collect();
        namespaces.sort();
        namespaces
    }

    pub fn namespace_count(&self) -> usize {
        self.quotas.len()
    }

    /// Create a snapshot of the whole ledger
    pub fn snapshot(&self) -> LedgerSnapshot {
        let namespaces = self
            .quotas
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        LedgerSnapshot { namespaces }
    }

    /// Get ledger statistics
    pub fn stats(&self) -> LedgerStatsSnapshot {
        LedgerStatsSnapshot {
            admitted: self.stats.admitted.load(Ordering::Relaxed),
            rejected: self.stats.rejected.load(Ordering::Relaxed),
            usage_added: self.stats.usage_added.load(Ordering::Relaxed),
            usage_removed: self.stats.usage_removed.load(Ordering::Relaxed),
            limits_set: self.stats.limits_set.load(Ordering::Relaxed),
            limits_reset: self.stats.limits_reset.load(Ordering::Relaxed),
        }
    }

    fn usage_deltas(&self, usage: &Usage) -> [(&str, i64); 2] {
        [
            (self.config.memory_dimension.as_str(), usage.memory),
            (self.config.cores_dimension.as_str(), usage.cores),
        ]
    }

    /// Integer limits of tracked dimensions, keyed by dimension name
    fn tracked_limits(&self, quota: &ResourceQuota) -> Vec<(String, i64)> {
        let mut limits = Vec::new();
        for (key, value) in &quota.hard {
            let limit = match value.to_i64() {
                Ok(limit) => limit,
                Err(err) => {
                    debug!(
                        namespace = %quota.namespace,
                        key = %key,
                        category = err.category(),
                        error = %err,
                        "Skipping quota entry"
                    );
                    continue;
                }
            };
            let Some(dimension) = self.config.dimension_from_key(key) else {
                debug!(
                    namespace = %quota.namespace,
                    key = %key,
                    "Skipping quota key without prefix"
                );
                continue;
            };
            if !self.config.is_tracked_dimension(dimension) {
                continue;
            }
            limits.push((dimension.to_string(), limit));
        }
        limits
    }
}

impl Default for QuotaManager {
    fn default() -> Self {
        Self::new()
    }
}
