//! Default configuration values
//!
//! Used when neither the configuration file nor the environment sets a key.

/// Environment variable prefix for overrides (`SMELTER_PRECISION__PRICE_CEILING`)
pub const ENV_PREFIX: &str = "SMELTER";

/// Separator between nested keys in environment variable names
pub const ENV_SEPARATOR: &str = "__";

/// Configuration file looked for when no path is given
pub const DEFAULT_CONFIG_PATH: &str = "config/smelter.toml";

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Warehouse root directory
pub const DEFAULT_WAREHOUSE_ROOT: &str = "./warehouse";

/// Fraction digits used by the fixed policy unless configured
pub const DEFAULT_FIXED_DIGITS: u32 = 8;
