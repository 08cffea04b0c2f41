//! # OHLCV Binary Lexical Codec
//!
//! ## Purpose
//!
//! This crate is the "Rules" layer of the lexical workspace:
//! - dataset-wide precision discovery (whole and fraction digit counts)
//! - Header-1 / Header-2 assembly and blind parsing
//! - fixed-width record packing with delta-encoded timestamps
//! - the standby-buffer ingestion pipeline that feeds the codec
//!
//! ## Architecture Role
//!
//! ```text
//! libs/types → [codec] → libs/warehouse → services/smelter
//!     ↑           ↓            ↓
//! BitSequence  Headers     Files on disk
//! CandleStick  Records     Union / validation
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use codec::OriginalLexical;
//! use types::CandleStickFixed;
//!
//! let sticks = [
//!     CandleStickFixed::new(1000, 10.5, 11.0, 10.0, 10.8, 100.0),
//!     CandleStickFixed::new(1060, 10.8, 10.9, 10.7, 10.75, 50.25),
//! ];
//! let codec = OriginalLexical::new("TEST", "60");
//! let bits = codec.binary_data_flat(&sticks).unwrap();
//! let decoded = OriginalLexical::refined_data_flat(&bits).unwrap();
//! assert_eq!(decoded.sticks, sticks);
//! ```
//!
//! ## What This Crate Does NOT Contain
//! - File persistence or stream union (belongs in warehouse)
//! - Configuration loading (belongs in config)

pub mod constants;
pub mod error;
pub mod header;
pub mod lexical;
pub mod precision;
pub mod smelter;

// Re-export key types for convenience
pub use constants::*;
pub use error::{CodecError, CodecResult};
pub use header::{format_interval, parse_interval, validate_symbol, RecordLayout, StreamHeader};
pub use lexical::{DecodedStream, EncodedStream, OriginalLexical};
pub use precision::{
    split_whole_fraction, split_whole_fraction_trim, DigitCounts, FractionPolicy, PrecisionPolicy,
    WholeFraction,
};
pub use smelter::{LexicalSmelter, RawStick, Smelter};
