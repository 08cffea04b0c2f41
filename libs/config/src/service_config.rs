//! Service Configuration Module
//!
//! Provides configuration loading for the smelter service and its warehouse.
//! A TOML file supplies the base values and `SMELTER_` environment variables
//! override individual keys (`SMELTER_PRECISION__POLICY=fixed`).

use crate::defaults::*;
use anyhow::{bail, Context, Result};
use codec::{FractionPolicy, PrecisionPolicy, MAX_DIGITS};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Main service configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct SmelterConfig {
    /// Global settings
    #[serde(default)]
    pub global: GlobalConfig,

    /// Codec precision policy
    #[serde(default)]
    pub precision: PrecisionConfig,

    /// Encoded stream storage
    #[serde(default)]
    pub warehouse: WarehouseConfig,
}

/// Global configuration settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct GlobalConfig {
    pub log_level: String,
    pub json_logs: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            json_logs: false,
        }
    }
}

/// Warehouse location
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct WarehouseConfig {
    pub root: PathBuf,
    /// Create the root directory on connect if it is missing
    pub create_missing: bool,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_WAREHOUSE_ROOT),
            create_missing: true,
        }
    }
}

/// Which fraction policy the codec applies
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    #[default]
    Trim,
    Fixed,
}

/// Precision settings; ceilings apply to `trim`, digit counts to `fixed`
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct PrecisionConfig {
    pub policy: PolicyKind,
    pub price_fraction_digits: u32,
    pub volume_fraction_digits: u32,
    pub price_ceiling: u32,
    pub volume_ceiling: u32,
}

impl Default for PrecisionConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::Trim,
            price_fraction_digits: DEFAULT_FIXED_DIGITS,
            volume_fraction_digits: DEFAULT_FIXED_DIGITS,
            price_ceiling: codec::DEFAULT_FRACTION_CEILING,
            volume_ceiling: codec::DEFAULT_FRACTION_CEILING,
        }
    }
}

impl PrecisionConfig {
    /// Reject digit counts the lexical format cannot carry
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("price_fraction_digits", self.price_fraction_digits),
            ("volume_fraction_digits", self.volume_fraction_digits),
            ("price_ceiling", self.price_ceiling),
            ("volume_ceiling", self.volume_ceiling),
        ];
        for (name, digits) in checks {
            if digits > MAX_DIGITS {
                bail!("precision.{name} = {digits} exceeds the {MAX_DIGITS} digit limit");
            }
        }
        Ok(())
    }

    /// Codec policy for these settings
    pub fn to_policy(&self) -> Result<PrecisionPolicy> {
        self.validate()?;
        let policy = match self.policy {
            PolicyKind::Trim => PrecisionPolicy {
                price: FractionPolicy::Trim {
                    ceiling: self.price_ceiling,
                },
                volume: FractionPolicy::Trim {
                    ceiling: self.volume_ceiling,
                },
            },
            PolicyKind::Fixed => {
                PrecisionPolicy::fixed(self.price_fraction_digits, self.volume_fraction_digits)
            }
        };
        debug!("Precision policy: {:?}", policy);
        Ok(policy)
    }
}

impl SmelterConfig {
    /// Load configuration from a file with environment overrides.
    ///
    /// With no explicit path the default location is used if it exists;
    /// an explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        match path {
            Some(path) => {
                info!("Loading smelter config: {:?}", path);
                builder = builder.add_source(File::from(path).required(true));
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    info!("Loading smelter config: {:?}", default_path);
                    builder = builder.add_source(File::from(default_path));
                } else {
                    warn!("No config at {:?}, using defaults", default_path);
                }
            }
        }

        // Override with environment variables (SMELTER_ prefix)
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        );

        let config: Self = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.precision.validate()?;
        Ok(config)
    }

    /// Parse a TOML file directly, without environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML configuration")?;
        config.precision.validate()?;
        Ok(config)
    }
}

/// Convenience function to load configuration with defaults
pub fn load_config(path: Option<&Path>) -> Result<SmelterConfig> {
    SmelterConfig::load(path)
}
