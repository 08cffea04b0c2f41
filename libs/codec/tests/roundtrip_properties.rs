//! Lexical Round-Trip Property Tests
//!
//! For any sorted dataset whose values fit the default precision ceiling,
//! decoding the encoding reproduces every record exactly.

use codec::{OriginalLexical, H1_TOTAL_LEN};
use proptest::prelude::*;
use types::CandleStickFixed;

/// Values with at most `digits` fraction digits, built from integers so the
/// shortest representation never exceeds them
fn arb_value(max_whole: u64, digits: u32) -> impl Strategy<Value = f64> {
    let scale = 10u64.pow(digits);
    (0..max_whole, 0..scale).prop_map(move |(whole, fraction)| {
        format!("{whole}.{fraction:0width$}", width = digits as usize)
            .parse::<f64>()
            .unwrap()
    })
}

fn arb_sticks() -> impl Strategy<Value = Vec<CandleStickFixed>> {
    let bar = (
        0i64..86_400,
        arb_value(100_000, 4),
        arb_value(100_000, 4),
        arb_value(100_000, 4),
        arb_value(100_000, 4),
        arb_value(10_000_000, 3),
    );
    (
        -2_000_000_000i64..2_000_000_000,
        prop::collection::vec(bar, 0..40),
    )
        .prop_map(|(start, bars)| {
            let mut utc = start;
            bars.into_iter()
                .map(|(gap, o, h, l, c, v)| {
                    utc += gap;
                    CandleStickFixed::new(utc, o, h, l, c, v)
                })
                .collect()
        })
}

proptest! {
    #[test]
    fn flat_round_trip_is_exact(sticks in arb_sticks()) {
        let codec = OriginalLexical::new("PROP", "1m");
        let bits = codec.binary_data_flat(&sticks).unwrap();
        let decoded = OriginalLexical::refined_data_flat(&bits).unwrap();
        prop_assert_eq!(decoded.sticks, sticks);
    }

    #[test]
    fn array_round_trip_matches_flat(sticks in arb_sticks()) {
        let codec = OriginalLexical::new("PROP", "1m");
        let stream = codec.binary_data_points(&sticks).unwrap();
        prop_assert_eq!(stream.header1.len(), H1_TOTAL_LEN);
        prop_assert_eq!(stream.flatten(), codec.binary_data_flat(&sticks).unwrap());

        let decoded = OriginalLexical::refined_data_array(&stream).unwrap();
        prop_assert_eq!(decoded.sticks, sticks);
    }

    #[test]
    fn any_truncation_is_corruption(sticks in arb_sticks(), cut in any::<prop::sample::Index>()) {
        prop_assume!(!sticks.is_empty());
        let bits = OriginalLexical::new("PROP", "1m").binary_data_flat(&sticks).unwrap();
        let keep = cut.index(bits.len());
        let err = OriginalLexical::refined_data_flat(&bits.left_subset(keep).unwrap()).unwrap_err();
        prop_assert!(err.is_corruption());
    }
}
