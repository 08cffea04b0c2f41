//! # Lexical Types Library
//!
//! Leaf crate of the OHLCV binary lexical workspace.
//!
//! ## Design Philosophy
//!
//! - **One place for bit arithmetic**: every fixed-width unsigned or two's
//!   complement field is read and written through [`BitSequence`]
//! - **Packed storage**: bits live MSB-first in bytes with an explicit length
//! - **Exact records**: candlestick equality compares bit patterns, never
//!   within an epsilon
//!
//! ## Quick Start
//!
//! ```rust
//! use types::{minimum_bit_width, BitSequence, CandleStickFixed, Stick};
//!
//! let gap = BitSequence::from_unsigned(60, minimum_bit_width(60)).unwrap();
//! assert_eq!(gap.to_string(), "111100");
//!
//! let bar = CandleStickFixed::new(1000, 10.5, 11.0, 10.0, 10.8, 100.0);
//! assert_eq!(bar.utc(), 1000);
//! ```
//!
//! ## Integration Points
//!
//! - **codec**: precision discovery, header assembly and record packing
//! - **warehouse**: byte persistence of encoded streams

pub mod common;

pub use common::bits::{minimum_bit_width, minimum_twos_complement_width, BitSequence, MAX_FIELD_WIDTH};
pub use common::errors::{BitError, BitResult};
pub use common::stick::{compare_to, is_equal, CandleStick, CandleStickFixed, Stick};
