//! # Smelter CLI
//!
//! Library side of the `smelter` binary. Each subcommand is a function in
//! [`commands`] returning `anyhow::Result`.

pub mod commands;

pub use commands::{
    deliver, inspect, list, open_warehouse, smelt, sticks_json, union, unsmelt, HeaderSummary,
    SmeltTarget,
};
