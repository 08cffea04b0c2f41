//! Error formatting tests for codec diagnostics
//!
//! Validates that Display output carries enough context to locate a fault in
//! a stream, and that Debug keeps the variant name for logs.

use codec::{CodecError, OriginalLexical};
use types::{BitError, BitSequence};

#[test]
fn test_corruption_formatting() {
    let error = CodecError::corruption(120, "record section truncated", 118);

    let debug_output = format!("{:?}", error);
    assert!(debug_output.contains("StructuralCorruption"));

    let display_output = format!("{}", error);
    assert!(display_output.contains("Structural corruption"));
    assert!(display_output.contains("at bit 120"));
    assert!(display_output.contains("record section truncated"));
    assert!(display_output.contains("stream: 118 bits"));
}

#[test]
fn test_precision_loss_formatting() {
    let error = CodecError::precision_loss(10.75, "needs 2 fraction digits, only 1 available");
    let display_output = format!("{}", error);
    assert!(display_output.contains("Precision loss for value 10.75"));
    assert!(display_output.contains("only 1 available"));
}

#[test]
fn test_bit_errors_wrap_transparently() {
    let error: CodecError = BitError::unsigned_overflow(64, 6).into();
    let display_output = format!("{}", error);
    assert!(display_output.contains("Bit operation failed"));
    assert!(display_output.contains("64 does not fit in 6 bits as unsigned"));
}

#[test]
fn test_decode_errors_point_at_offsets() {
    let error = OriginalLexical::refined_data_flat(&BitSequence::zeroed(12)).unwrap_err();
    let display_output = format!("{}", error);
    assert!(display_output.contains("Header-1 needs 41 bits"));
    assert!(display_output.contains("stream: 12 bits"));
}

#[test]
fn test_error_chain_compatibility() {
    let error = CodecError::invalid_interval("5y", "unknown unit 'y'");

    let _: &dyn std::error::Error = &error;

    let error2 = error.clone();
    assert_eq!(error, error2);
    assert_eq!(
        error.to_string(),
        "Invalid interval \"5y\": unknown unit 'y'"
    );
}
