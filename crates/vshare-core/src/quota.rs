//! Observed namespace quota objects

use crate::Quantity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A namespace-scoped set of hard limits as delivered by the quota watcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceQuota {
    /// Name of the quota object
    pub name: String,

    /// Namespace the limits apply to
    pub namespace: String,

    /// Hard limits keyed by prefixed dimension (e.g. "requests.nvidia.com/gpumem")
    #[serde(default)]
    pub hard: BTreeMap<String, Quantity>,
}

impl ResourceQuota {
    /// Create an empty quota object
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            hard: BTreeMap::new(),
        }
    }

    /// Add a hard limit entry
    pub fn with_hard(mut self, key: impl Into<String>, value: impl Into<Quantity>) -> Self {
        self.hard.insert(key.into(), value.into());
        self
    }
}
