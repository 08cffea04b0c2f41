//! Codec-level errors for lexical encoding and decoding
//!
//! Precision loss and structural corruption are separate variants so callers
//! can tell "this dataset cannot be represented" apart from "these bits are
//! not a valid stream". Neither is ever corrected silently.

use thiserror::Error;
use types::BitError;

/// Errors raised while encoding or decoding a lexical stream
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodecError {
    /// A value cannot be represented at the available precision or magnitude
    #[error("Precision loss for value {value}: {reason}")]
    PrecisionLoss { value: f64, reason: String },

    /// Encoded bits are shorter, longer or otherwise inconsistent with their header
    #[error("Structural corruption at bit {offset}: {description} (stream: {stream_len} bits)")]
    StructuralCorruption {
        offset: usize,
        description: String,
        stream_len: usize,
    },

    /// Toolkit bounds or width violation while packing
    #[error("Bit operation failed: {0}")]
    Bits(#[from] BitError),

    /// Records must be supplied in non-decreasing timestamp order
    #[error("Timestamps out of order: {utc} follows {previous}")]
    OutOfOrder { previous: i64, utc: i64 },

    /// Symbol cannot be packed into Header-2
    #[error("Invalid symbol {symbol:?}: {reason}")]
    InvalidSymbol { symbol: String, reason: String },

    /// Interval label is not a recognised duration
    #[error("Invalid interval {label:?}: {reason}")]
    InvalidInterval { label: String, reason: String },

    /// Raw input could not be read into records
    #[error("Malformed input ({context}): {reason}")]
    MalformedInput { context: String, reason: String },
}

impl CodecError {
    pub fn precision_loss(value: f64, reason: impl Into<String>) -> Self {
        Self::PrecisionLoss {
            value,
            reason: reason.into(),
        }
    }

    pub fn corruption(offset: usize, description: impl Into<String>, stream_len: usize) -> Self {
        Self::StructuralCorruption {
            offset,
            description: description.into(),
            stream_len,
        }
    }

    pub fn invalid_symbol(symbol: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSymbol {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_interval(label: &str, reason: impl Into<String>) -> Self {
        Self::InvalidInterval {
            label: label.to_string(),
            reason: reason.into(),
        }
    }

    pub fn malformed_input(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            context: context.into(),
            reason: reason.into(),
        }
    }

    pub fn is_precision_loss(&self) -> bool {
        matches!(self, Self::PrecisionLoss { .. })
    }

    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::StructuralCorruption { .. })
    }
}

/// Result type for codec operations
pub type CodecResult<T> = std::result::Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(CodecError::precision_loss(10.75, "needs 2 digits").is_precision_loss());
        assert!(CodecError::corruption(41, "truncated", 40).is_corruption());

        let bits: CodecError = BitError::out_of_bounds(0, 9, 8).into();
        assert!(!bits.is_corruption());
        assert!(!bits.is_precision_loss());
    }

    #[test]
    fn test_messages_carry_context() {
        let err = CodecError::corruption(60, "record section truncated", 58);
        let msg = err.to_string();
        assert!(msg.contains("bit 60"));
        assert!(msg.contains("58 bits"));

        let err = CodecError::OutOfOrder {
            previous: 1060,
            utc: 1000,
        };
        assert_eq!(err.to_string(), "Timestamps out of order: 1000 follows 1060");
    }
}
