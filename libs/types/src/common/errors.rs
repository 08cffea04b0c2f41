//! Error types for bit sequence operations
//!
//! Every toolkit operation that can overrun a range or overflow a declared
//! width reports it here. Nothing is clamped or truncated silently; callers
//! decide what a violation means for their layer.

use thiserror::Error;

/// Errors raised by the bit sequence toolkit
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BitError {
    /// Requested range falls outside the sequence
    #[error("Bit range [{start}, {end}) out of bounds for sequence of {len} bits")]
    OutOfBounds { start: usize, end: usize, len: usize },

    /// Value cannot be represented within the declared width
    #[error("Value {value} does not fit in {width} bits as {encoding}")]
    ValueOverflow {
        value: i128,
        width: u32,
        encoding: &'static str,
    },

    /// Width is not usable for the requested conversion
    #[error("Invalid bit width {width}: {expected}")]
    InvalidWidth { width: usize, expected: &'static str },

    /// Character cannot be packed as a single 8-bit code
    #[error("Non-ASCII character {character:?} at position {position}")]
    NonAscii { character: char, position: usize },
}

impl BitError {
    pub fn out_of_bounds(start: usize, end: usize, len: usize) -> Self {
        Self::OutOfBounds { start, end, len }
    }

    pub fn unsigned_overflow(value: u64, width: u32) -> Self {
        Self::ValueOverflow {
            value: value as i128,
            width,
            encoding: "unsigned",
        }
    }

    pub fn signed_overflow(value: i64, width: u32) -> Self {
        Self::ValueOverflow {
            value: value as i128,
            width,
            encoding: "two's complement",
        }
    }

    pub fn invalid_width(width: usize, expected: &'static str) -> Self {
        Self::InvalidWidth { width, expected }
    }
}

/// Result type for bit sequence operations
pub type BitResult<T> = std::result::Result<T, BitError>;
