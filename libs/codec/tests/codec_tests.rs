//! # Lexical Codec Integration Tests
//!
//! End-to-end checks through the public API:
//! - the two-bar TEST/60 scenario, field by field
//! - header/record concatenation against the flat encoding
//! - corruption and precision-loss classification

use codec::{
    CodecError, DigitCounts, OriginalLexical, PrecisionPolicy, StreamHeader, H1_TOTAL_LEN,
};
use types::{BitSequence, CandleStickFixed, Stick};

fn scenario() -> Vec<CandleStickFixed> {
    vec![
        CandleStickFixed::new(1000, 10.5, 11.0, 10.0, 10.8, 100.0),
        CandleStickFixed::new(1060, 10.8, 10.9, 10.7, 10.75, 50.25),
    ]
}

#[test]
fn test_scenario_digits_and_round_trip() {
    let codec = OriginalLexical::new("TEST", "60");
    let sticks = scenario();

    assert_eq!(codec.base10_price_digits(&sticks).unwrap(), DigitCounts::new(2, 2));
    assert_eq!(codec.base10_volume_digits(&sticks).unwrap(), DigitCounts::new(3, 2));

    let bits = codec.binary_data_flat(&sticks).unwrap();
    let decoded = OriginalLexical::refined_data_flat(&bits).unwrap();

    assert_eq!(decoded.symbol(), "TEST");
    assert_eq!(decoded.interval_secs(), 60);
    assert_eq!(decoded.header.gap_width, 6);
    assert_eq!(decoded.sticks, sticks);
    assert_eq!(decoded.sticks[1].utc(), 1000 + 60);
    assert_eq!(decoded.sticks[1].close(), 10.75);
    assert_eq!(decoded.sticks[1].volume(), 50.25);
}

#[test]
fn test_scenario_stream_length() {
    let codec = OriginalLexical::new("TEST", "60");
    let stream = codec.binary_data_points(&scenario()).unwrap();

    assert_eq!(stream.header1.len(), H1_TOTAL_LEN);
    // by-id 1, symbol length 3, symbol 32, interval 6, utc 11, gap width 3,
    // digits 2+2+2+2, count width 2, count 2
    assert_eq!(stream.header2.len(), 1 + 3 + 32 + 6 + 11 + 3 + 8 + 2 + 2);
    // gap 6, prices 4 * (7 + 7), volume 10 + 7
    assert!(stream.records.iter().all(|r| r.len() == 79));
}

#[test]
fn test_concatenated_parts_equal_flat() {
    let codec = OriginalLexical::new("TEST", "60");
    let sticks = scenario();
    let header = codec.plan(&sticks).unwrap();

    let mut joined = codec.gen_binary_header1(&header).unwrap();
    joined.append(&codec.gen_binary_header2(&header).unwrap());
    let mut prev = None;
    for stick in &sticks {
        joined.append(&codec.binary_data(&header, stick, prev).unwrap());
        prev = Some(stick.utc());
    }

    assert_eq!(joined, codec.binary_data_flat(&sticks).unwrap());
}

#[test]
fn test_header_length_is_constant() {
    let long_symbol = "X".repeat(127);
    let datasets: Vec<(&str, Vec<CandleStickFixed>)> = vec![
        ("A", vec![]),
        ("TEST", scenario()),
        (
            long_symbol.as_str(),
            vec![
                CandleStickFixed::new(-5_000_000_000, 98_765.4321, 1e12, 0.0, 1.5, 1e15),
                CandleStickFixed::new(1_700_000_000, 0.000001, 2.0, 3.0, 4.0, 0.5),
            ],
        ),
    ];

    for (symbol, sticks) in datasets {
        let stream = OriginalLexical::new(symbol, "1d").binary_data_points(&sticks).unwrap();
        assert_eq!(stream.header1.len(), H1_TOTAL_LEN);
    }
}

#[test]
fn test_empty_dataset_round_trips() {
    let codec = OriginalLexical::new("EMPTY", "5m");
    let sticks: Vec<CandleStickFixed> = vec![];
    let decoded = OriginalLexical::refined_data_flat(&codec.binary_data_flat(&sticks).unwrap()).unwrap();
    assert!(decoded.is_empty());
    assert_eq!(decoded.interval_secs(), 300);
}

#[test]
fn test_truncation_is_structural_corruption() {
    let codec = OriginalLexical::new("TEST", "60");
    let bits = codec.binary_data_flat(&scenario()).unwrap();

    let short = bits.left_subset(bits.len() - 1).unwrap();
    let err = OriginalLexical::refined_data_flat(&short).unwrap_err();
    assert!(err.is_corruption(), "{err}");
    assert!(!err.is_precision_loss());
}

#[test]
fn test_byte_padding_accepted_extra_bits_rejected() {
    let codec = OriginalLexical::new("TEST", "60");
    let bits = codec.binary_data_flat(&scenario()).unwrap();

    // Byte persistence pads with zeros
    let padded = BitSequence::from_byte_slice(&bits.to_bytes());
    assert!(padded.len() - bits.len() < 8);
    assert_eq!(OriginalLexical::refined_data_flat(&padded).unwrap().sticks, scenario());

    let mut extra = bits.clone();
    extra.append(&BitSequence::zeroed(8));
    assert!(OriginalLexical::refined_data_flat(&extra).unwrap_err().is_corruption());

    let mut dirty = bits.clone();
    dirty.push(true);
    assert!(OriginalLexical::refined_data_flat(&dirty).unwrap_err().is_corruption());
}

#[test]
fn test_fixed_policy_precision_loss() {
    let codec = OriginalLexical::new("TEST", "60").with_policy(PrecisionPolicy::fixed(1, 2));
    let err = codec.binary_data_flat(&scenario()).unwrap_err();
    assert!(err.is_precision_loss(), "{err}");
}

#[test]
fn test_fixed_policy_keeps_declared_digits() {
    let codec = OriginalLexical::new("TEST", "60").with_policy(PrecisionPolicy::fixed(4, 3));
    let stream = codec.binary_data_points(&scenario()).unwrap();
    assert_eq!(stream.header.price, DigitCounts::new(2, 4));
    assert_eq!(stream.header.volume, DigitCounts::new(3, 3));

    let decoded = OriginalLexical::refined_data_array(&stream).unwrap();
    assert_eq!(decoded.sticks, scenario());
}

#[test]
fn test_trim_ceiling_rounds_values() {
    let codec = OriginalLexical::new("TEST", "60").with_policy(PrecisionPolicy::trim(2));
    let sticks = [CandleStickFixed::new(0, 1.23456, 1.0, 1.0, 1.0, 2.005)];
    let decoded = OriginalLexical::refined_data_flat(&codec.binary_data_flat(&sticks).unwrap()).unwrap();
    assert_eq!(decoded.sticks[0].open(), 1.23);
    assert_eq!(decoded.sticks[0].volume(), 2.01);
}

#[test]
fn test_same_values_different_widths_not_equal() {
    let sticks = scenario();
    let trimmed = OriginalLexical::new("TEST", "60").binary_data_flat(&sticks).unwrap();
    let fixed = OriginalLexical::new("TEST", "60")
        .with_policy(PrecisionPolicy::fixed(4, 4))
        .binary_data_flat(&sticks)
        .unwrap();

    let a = OriginalLexical::refined_data_flat(&trimmed).unwrap();
    let b = OriginalLexical::refined_data_flat(&fixed).unwrap();
    assert_eq!(a.sticks, b.sticks);
    assert_ne!(a, b);
}

#[test]
fn test_invalid_symbol_and_interval() {
    let sticks = scenario();
    assert!(matches!(
        OriginalLexical::new("", "60").plan(&sticks),
        Err(CodecError::InvalidSymbol { .. })
    ));
    assert!(matches!(
        OriginalLexical::new("TEST", "sixty").plan(&sticks),
        Err(CodecError::InvalidInterval { .. })
    ));
}

#[test]
fn test_parse_reports_record_offset() {
    let codec = OriginalLexical::new("TEST", "60");
    let stream = codec.binary_data_points(&scenario()).unwrap();
    let (header, offset) = StreamHeader::parse(&stream.flatten()).unwrap();
    assert_eq!(header, stream.header);
    assert_eq!(offset, stream.header1.len() + stream.header2.len());
}
