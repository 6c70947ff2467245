//! Per-dimension quota counters

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Usage and limit of one resource dimension in one namespace.
///
/// A `limit` of [`Quota::UNBOUNDED`] (zero) means no limit is configured, not that
/// nothing may be allocated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quota {
    /// Cumulative consumption in the dimension's unit
    pub used: i64,

    /// Configured hard limit, or `UNBOUNDED`
    pub limit: i64,
}

impl Quota {
    /// Limit value meaning "no limit configured"
    pub const UNBOUNDED: i64 = 0;

    pub fn new(used: i64, limit: i64) -> Self {
        Self { used, limit }
    }

    /// Whether a limit is configured
    pub fn is_bounded(&self) -> bool {
        self.limit != Self::UNBOUNDED
    }

    /// Whether `request` more units stay within the limit
    pub fn fits(&self, request: i64) -> bool {
        !self.is_bounded() || self.used.saturating_add(request) <= self.limit
    }

    /// Units left before the limit, `None` when unbounded
    pub fn remaining(&self) -> Option<i64> {
        self.is_bounded()
            .then(|| self.limit.saturating_sub(self.used))
    }
}

/// Quotas of one namespace, keyed by dimension name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceQuota(BTreeMap<String, Quota>);

impl DeviceQuota {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, dimension: &str) -> Option<&Quota> {
        self.0.get(dimension)
    }

    pub fn get_mut(&mut self, dimension: &str) -> Option<&mut Quota> {
        self.0.get_mut(dimension)
    }

    /// The dimension's quota, created as `{used: 0, limit: 0}` if absent
    pub fn entry(&mut self, dimension: &str) -> &mut Quota {
        self.0.entry(dimension.to_string()).or_default()
    }

    pub fn contains(&self, dimension: &str) -> bool {
        self.0.contains_key(dimension)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Quota)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Aggregate vendor device usage of one pod
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Memory across all counted devices
    pub memory: i64,

    /// Cores across all counted devices
    pub cores: i64,

    /// Number of counted device slices
    pub devices: usize,
}

impl Usage {
    /// True when the pod holds no counted devices
    pub fn is_empty(&self) -> bool {
        self.devices == 0
    }
}
