//! # Lexical Format Constants
//!
//! ## Purpose
//!
//! The fixed Header-1 layout and the index positions of every Header-2 field.
//! Encode and decode both walk these tables, so field positions are never
//! recomputed ad hoc. Reordering any entry breaks every stream written before.
//!
//! ## Architecture Role
//!
//! ```text
//! HEADER1_FIELDS ──► Header-1 (41 bits, blind parse)
//!                        │ values are widths
//!                        ▼
//! H2_WIDTH_SOURCE ──► Header-2 (variable) ──► RecordLayout
//! ```

/// One fixed-width Header-1 field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header1Field {
    pub name: &'static str,
    pub width: u32,
}

impl Header1Field {
    const fn new(name: &'static str, width: u32) -> Self {
        Self { name, width }
    }
}

// Header-1 field indices (wire order)
pub const H1_INDEX_SYMBOL_LEN: usize = 0;
pub const H1_INDEX_INTERVAL: usize = 1;
pub const H1_INDEX_UTC: usize = 2;
pub const H1_INDEX_GAP_LEN: usize = 3;
pub const H1_INDEX_PRICE_WHOLE: usize = 4;
pub const H1_INDEX_PRICE_FRACTION: usize = 5;
pub const H1_INDEX_VOLUME_WHOLE: usize = 6;
pub const H1_INDEX_VOLUME_FRACTION: usize = 7;
pub const H1_INDEX_DATA_COUNT_LEN: usize = 8;
pub const H1_INDEX_COUNT_LEN: usize = 9;
pub const H1_INDEX_BY_ID: usize = 10;

/// Number of Header-1 fields
pub const H1_COUNT: usize = 11;

/// Header-1 layout. Every value stored here is the bit width of a Header-2 field.
pub const HEADER1_FIELDS: [Header1Field; H1_COUNT] = [
    Header1Field::new("symbol-length", 3),
    Header1Field::new("interval", 5),
    Header1Field::new("utc", 7),
    Header1Field::new("utc-gap-length", 3),
    Header1Field::new("price-whole-digits", 3),
    Header1Field::new("price-fraction-digits", 3),
    Header1Field::new("volume-whole-digits", 3),
    Header1Field::new("volume-fraction-digits", 3),
    Header1Field::new("data-count-length", 3),
    Header1Field::new("count-length", 7),
    Header1Field::new("by-id", 1),
];

const fn header1_total() -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < H1_COUNT {
        total += HEADER1_FIELDS[i].width as usize;
        i += 1;
    }
    total
}

/// Header-1 length in bits, identical for every stream
pub const H1_TOTAL_LEN: usize = header1_total();

/// Bit offset of each Header-1 field
pub const fn h1_offset(index: usize) -> usize {
    let mut offset = 0;
    let mut i = 0;
    while i < index {
        offset += HEADER1_FIELDS[i].width as usize;
        i += 1;
    }
    offset
}

// Header-2 field indices (wire order)
pub const H2_INDEX_BY_ID: usize = 0;
pub const H2_INDEX_SYMBOL_LEN: usize = 1;
pub const H2_INDEX_SYMBOL: usize = 2;
pub const H2_INDEX_INTERVAL: usize = 3;
pub const H2_INDEX_UTC: usize = 4;
pub const H2_INDEX_GAP_WIDTH: usize = 5;
pub const H2_INDEX_PRICE_WHOLE: usize = 6;
pub const H2_INDEX_PRICE_FRACTION: usize = 7;
pub const H2_INDEX_VOLUME_WHOLE: usize = 8;
pub const H2_INDEX_VOLUME_FRACTION: usize = 9;
pub const H2_INDEX_DATA_COUNT_WIDTH: usize = 10;
pub const H2_INDEX_DATA_COUNT: usize = 11;

/// Number of Header-2 fields
pub const H2_COUNT: usize = 12;

/// Header-1 field that declares each Header-2 field's width.
/// The symbol is sized by the symbol length instead (8 bits per character).
pub const H2_WIDTH_SOURCE: [Option<usize>; H2_COUNT] = [
    Some(H1_INDEX_BY_ID),
    Some(H1_INDEX_SYMBOL_LEN),
    None,
    Some(H1_INDEX_INTERVAL),
    Some(H1_INDEX_UTC),
    Some(H1_INDEX_GAP_LEN),
    Some(H1_INDEX_PRICE_WHOLE),
    Some(H1_INDEX_PRICE_FRACTION),
    Some(H1_INDEX_VOLUME_WHOLE),
    Some(H1_INDEX_VOLUME_FRACTION),
    Some(H1_INDEX_DATA_COUNT_LEN),
    Some(H1_INDEX_COUNT_LEN),
];

/// Bits per symbol character
pub const SYMBOL_CHAR_BITS: usize = 8;

/// Fields per record: gap, four prices and volume as whole/fraction pairs
pub const RECORD_FIELD_COUNT: usize = 11;

/// Longest symbol the 3-bit symbol-length width can describe
pub const MAX_SYMBOL_CHARS: usize = 127;

/// Widest interval, in seconds, the 5-bit interval width can describe
pub const MAX_INTERVAL_SECS: u64 = (1 << 31) - 1;

/// Most decimal digits in either part of a value (values stay below 10^19)
pub const MAX_DIGITS: u32 = 19;

/// Default ceiling for trimmed fraction digits
pub const DEFAULT_FRACTION_CEILING: u32 = 8;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header1_total_length() {
        assert_eq!(H1_TOTAL_LEN, 41);
        assert_eq!(h1_offset(H1_COUNT), H1_TOTAL_LEN);
        assert_eq!(h1_offset(H1_INDEX_UTC), 8);
        assert_eq!(h1_offset(H1_INDEX_BY_ID), 40);
    }

    #[test]
    fn test_every_numeric_h2_field_has_a_width_source() {
        for (index, source) in H2_WIDTH_SOURCE.iter().enumerate() {
            assert_eq!(source.is_none(), index == H2_INDEX_SYMBOL);
        }
        // Each Header-1 field feeds exactly one Header-2 field
        let mut sources: Vec<usize> = H2_WIDTH_SOURCE.iter().flatten().copied().collect();
        sources.sort_unstable();
        assert_eq!(sources, (0..H1_COUNT).collect::<Vec<_>>());
    }
}
