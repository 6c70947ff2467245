//! Configuration management for vshare
//!
//! Supports YAML files and environment variable overrides layered over defaults.

use crate::error::ErrorContext;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Default prefix stripped from quota object keys
pub const DEFAULT_QUOTA_KEY_PREFIX: &str = "requests.";

/// Default device type marker for usage accounting
pub const DEFAULT_VENDOR_MARKER: &str = "NVIDIA";

/// Default accelerator memory dimension
pub const DEFAULT_MEMORY_DIMENSION: &str = "nvidia.com/gpumem";

/// Default accelerator compute dimension
pub const DEFAULT_CORES_DIMENSION: &str = "nvidia.com/gpucores";

/// Settings for the quota ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Prefix stripped from quota object keys to obtain a dimension name
    pub quota_key_prefix: String,

    /// Substring a device type must contain for its usage to be counted
    pub vendor_marker: String,

    /// Name (and marker) of the memory dimension
    pub memory_dimension: String,

    /// Name (and marker) of the compute cores dimension
    pub cores_dimension: String,

    /// Floor `used` at zero when releasing more usage than was recorded
    pub clamp_used_at_zero: bool,
}

impl LedgerConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest)
    /// 2. Configuration file
    /// 3. Defaults (lowest)
    pub fn load() -> Result<Self> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&Self::default())?);

        if let Ok(config_path) = std::env::var("VSHARE_CONFIG") {
            builder = builder.add_source(config::File::with_name(&config_path).required(false));
        } else {
            for path in &["./vshare.yaml", "/etc/vshare/config.yaml"] {
                builder = builder.add_source(config::File::with_name(path).required(false));
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix("VSHARE")
                .prefix_separator("_")
                .try_parsing(true),
        );

        let parsed: Self = builder.build()?.try_deserialize()?;
        parsed.validate()?;
        debug!(?parsed, "Loaded ledger configuration");

        Ok(parsed)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = std::fs::read_to_string(&path)
            .with_context(format!("failed to read {}", path.display()))?;
        debug!("Loading ledger configuration from {}", path.display());
        Self::from_yaml_str(&contents)
    }

    /// Parse configuration from YAML text; missing fields keep their defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let parsed: Self = serde_yaml::from_str(yaml)?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.quota_key_prefix.is_empty() {
            return Err(crate::Error::config("quota_key_prefix cannot be empty"));
        }

        if self.vendor_marker.is_empty() {
            return Err(crate::Error::config("vendor_marker cannot be empty"));
        }

        if self.memory_dimension.is_empty() || self.cores_dimension.is_empty() {
            return Err(crate::Error::config("dimension names cannot be empty"));
        }

        if self.memory_dimension == self.cores_dimension {
            return Err(crate::Error::config(
                "memory_dimension and cores_dimension must differ",
            ));
        }

        Ok(())
    }

    /// Whether a dimension name refers to one of the tracked dimensions
    pub fn is_tracked_dimension(&self, dimension: &str) -> bool {
        dimension.contains(&self.memory_dimension) || dimension.contains(&self.cores_dimension)
    }

    /// Whether a device type is counted towards namespace usage
    pub fn is_vendor_device(&self, device_type: &str) -> bool {
        device_type.contains(&self.vendor_marker)
    }

    /// Strip the quota key prefix, returning `None` for unprefixed keys
    pub fn dimension_from_key<'a>(&self, key: &'a str) -> Option<&'a str> {
        key.strip_prefix(self.quota_key_prefix.as_str())
    }

    pub fn with_vendor_marker(mut self, marker: impl Into<String>) -> Self {
        self.vendor_marker = marker.into();
        self
    }

    pub fn with_dimensions(mut self, memory: impl Into<String>, cores: impl Into<String>) -> Self {
        self.memory_dimension = memory.into();
        self.cores_dimension = cores.into();
        self
    }

    pub fn with_clamped_usage(mut self) -> Self {
        self.clamp_used_at_zero = true;
        self
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            quota_key_prefix: DEFAULT_QUOTA_KEY_PREFIX.to_string(),
            vendor_marker: DEFAULT_VENDOR_MARKER.to_string(),
            memory_dimension: DEFAULT_MEMORY_DIMENSION.to_string(),
            cores_dimension: DEFAULT_CORES_DIMENSION.to_string(),
            clamp_used_at_zero: false,
        }
    }
}
