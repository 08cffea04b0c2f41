//! # Smelter Configuration
//!
//! Configuration loading for the smelter service: codec precision policy,
//! warehouse location and logging settings.
//!
//! ## Layering
//!
//! 1. Built-in defaults ([`defaults`])
//! 2. TOML file (`config/smelter.toml` unless a path is given)
//! 3. `SMELTER_` environment variables, nested keys joined by `__`
//!
//! ## Usage
//!
//! ```rust
//! use smelter_config::SmelterConfig;
//!
//! let config = SmelterConfig::from_toml_str(
//!     "[precision]\npolicy = \"fixed\"\nprice_fraction_digits = 2\nvolume_fraction_digits = 0\n",
//! )
//! .unwrap();
//! let policy = config.precision.to_policy().unwrap();
//! assert_eq!(policy, codec::PrecisionPolicy::fixed(2, 0));
//! ```

pub mod defaults;
pub mod service_config;

pub use service_config::{
    load_config, GlobalConfig, PolicyKind, PrecisionConfig, SmelterConfig, WarehouseConfig,
};
