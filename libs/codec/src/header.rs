//! # Stream Headers
//!
//! ## Purpose
//!
//! Assembly and parsing of the two-level header that makes an encoded stream
//! self-describing.
//!
//! - **Header-1** is [`H1_TOTAL_LEN`] bits at fixed offsets. Each field holds
//!   the bit width of one Header-2 field, so it can be parsed blind.
//! - **Header-2** carries the dataset metadata at the widths Header-1 declared.
//! - [`RecordLayout`] is derived from Header-2 and never stored.
//!
//! Every width written is the minimum sufficient for its value.

use crate::constants::*;
use crate::error::{CodecError, CodecResult};
use crate::precision::DigitCounts;
use types::{minimum_bit_width, minimum_twos_complement_width, BitSequence, MAX_FIELD_WIDTH};

/// Parse an interval label into seconds.
///
/// Accepts a bare count of seconds (`"60"`) or a count with a unit suffix
/// `s`, `m`, `h`, `d` or `w` (`"5m"`, `"1h"`).
pub fn parse_interval(label: &str) -> CodecResult<u32> {
    let trimmed = label.trim();
    let (count, unit) = match trimmed.char_indices().last() {
        Some((at, c)) if c.is_ascii_alphabetic() => (&trimmed[..at], c.to_ascii_lowercase()),
        Some(_) => (trimmed, 's'),
        None => return Err(CodecError::invalid_interval(label, "empty label")),
    };

    let multiplier: u64 = match unit {
        's' => 1,
        'm' => 60,
        'h' => 3_600,
        'd' => 86_400,
        'w' => 604_800,
        other => {
            return Err(CodecError::invalid_interval(
                label,
                format!("unknown unit '{other}'"),
            ))
        }
    };

    let count: u64 = count
        .parse()
        .map_err(|_| CodecError::invalid_interval(label, "count is not a whole number"))?;
    let seconds = count
        .checked_mul(multiplier)
        .filter(|s| (1..=MAX_INTERVAL_SECS).contains(s))
        .ok_or_else(|| {
            CodecError::invalid_interval(
                label,
                format!("must be between 1 and {MAX_INTERVAL_SECS} seconds"),
            )
        })?;
    Ok(seconds as u32)
}

/// Shortest label for a number of seconds, using the largest exact unit
pub fn format_interval(seconds: u32) -> String {
    const UNITS: [(u32, char); 4] = [(604_800, 'w'), (86_400, 'd'), (3_600, 'h'), (60, 'm')];
    for (size, unit) in UNITS {
        if seconds >= size && seconds % size == 0 {
            return format!("{}{}", seconds / size, unit);
        }
    }
    format!("{seconds}s")
}

/// Check that a symbol can be packed into Header-2
pub fn validate_symbol(symbol: &str) -> CodecResult<()> {
    if symbol.is_empty() {
        return Err(CodecError::invalid_symbol(symbol, "symbol is empty"));
    }
    if !symbol.is_ascii() {
        return Err(CodecError::invalid_symbol(symbol, "symbol must be ASCII"));
    }
    if symbol.len() > MAX_SYMBOL_CHARS {
        return Err(CodecError::invalid_symbol(
            symbol,
            format!("{} characters exceeds the {MAX_SYMBOL_CHARS} character limit", symbol.len()),
        ));
    }
    Ok(())
}

/// Per-record field widths derived from Header-2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout {
    pub gap: u32,
    pub price_whole: u32,
    pub price_fraction: u32,
    pub volume_whole: u32,
    pub volume_fraction: u32,
}

impl RecordLayout {
    /// Widths in record field order
    pub fn field_widths(&self) -> [u32; RECORD_FIELD_COUNT] {
        let (pw, pf) = (self.price_whole, self.price_fraction);
        [
            self.gap,
            pw,
            pf,
            pw,
            pf,
            pw,
            pf,
            pw,
            pf,
            self.volume_whole,
            self.volume_fraction,
        ]
    }

    /// Bits per record
    pub fn width(&self) -> usize {
        self.gap as usize
            + 4 * (self.price_whole + self.price_fraction) as usize
            + (self.volume_whole + self.volume_fraction) as usize
    }
}

/// Parsed or planned Header-2 contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
    pub by_id: bool,
    pub symbol: String,
    pub interval_secs: u32,
    pub initial_utc: i64,
    pub gap_width: u32,
    pub price: DigitCounts,
    pub volume: DigitCounts,
    pub data_count: u64,
}

impl StreamHeader {
    pub fn layout(&self) -> RecordLayout {
        RecordLayout {
            gap: self.gap_width,
            price_whole: self.price.whole_bits(),
            price_fraction: self.price.fraction_bits(),
            volume_whole: self.volume.whole_bits(),
            volume_fraction: self.volume.fraction_bits(),
        }
    }

    /// Bits needed for the record count
    pub fn count_width(&self) -> u32 {
        minimum_bit_width(self.data_count)
    }

    pub fn interval_label(&self) -> String {
        format_interval(self.interval_secs)
    }

    /// Width of each Header-2 field, in Header-2 order
    pub fn h2_widths(&self) -> [u32; H2_COUNT] {
        let count_width = self.count_width();
        [
            1,
            minimum_bit_width(self.symbol.len() as u64),
            (self.symbol.len() * SYMBOL_CHAR_BITS) as u32,
            minimum_bit_width(self.interval_secs as u64),
            minimum_twos_complement_width(self.initial_utc),
            minimum_bit_width(self.gap_width as u64),
            minimum_bit_width(self.price.whole as u64),
            minimum_bit_width(self.price.fraction as u64),
            minimum_bit_width(self.volume.whole as u64),
            minimum_bit_width(self.volume.fraction as u64),
            minimum_bit_width(count_width as u64),
            count_width,
        ]
    }

    /// Header-1 values, in Header-1 order
    pub fn h1_values(&self) -> [u32; H1_COUNT] {
        let widths = self.h2_widths();
        let mut values = [0; H1_COUNT];
        for (h2_index, source) in H2_WIDTH_SOURCE.iter().enumerate() {
            if let Some(h1_index) = source {
                values[*h1_index] = widths[h2_index];
            }
        }
        values
    }

    /// Unsigned Header-2 values; the symbol and initial UTC are written separately
    fn h2_unsigned_values(&self) -> [u64; H2_COUNT] {
        [
            self.by_id as u64,
            self.symbol.len() as u64,
            0,
            self.interval_secs as u64,
            0,
            self.gap_width as u64,
            self.price.whole as u64,
            self.price.fraction as u64,
            self.volume.whole as u64,
            self.volume.fraction as u64,
            self.count_width() as u64,
            self.data_count,
        ]
    }

    /// Fixed-layout Header-1
    pub fn header1(&self) -> CodecResult<BitSequence> {
        let values = self.h1_values();
        let mut bits = BitSequence::zeroed(H1_TOTAL_LEN);
        let mut offset = 0;
        for (field, value) in HEADER1_FIELDS.iter().zip(values) {
            bits.set_subset_unsigned(offset, field.width, value as u64)?;
            offset += field.width as usize;
        }
        Ok(bits)
    }

    /// Header-2 at the widths Header-1 declares
    pub fn header2(&self) -> CodecResult<BitSequence> {
        validate_symbol(&self.symbol)?;
        let widths = self.h2_widths();
        let values = self.h2_unsigned_values();

        let mut bits = BitSequence::with_capacity(widths.iter().map(|w| *w as usize).sum());
        for (index, width) in widths.into_iter().enumerate() {
            let part = match index {
                H2_INDEX_SYMBOL => BitSequence::from_ascii(&self.symbol)?,
                H2_INDEX_UTC => BitSequence::from_twos_complement(self.initial_utc, width)?,
                _ => BitSequence::from_unsigned(values[index], width)?,
            };
            bits.append(&part);
        }
        Ok(bits)
    }

    /// Blind-parse Header-1, then Header-2. Returns the header and the bit
    /// offset at which the record section starts.
    pub fn parse(bits: &BitSequence) -> CodecResult<(Self, usize)> {
        let stream_len = bits.len();
        if stream_len < H1_TOTAL_LEN {
            return Err(CodecError::corruption(
                stream_len,
                format!("Header-1 needs {H1_TOTAL_LEN} bits"),
                stream_len,
            ));
        }

        let mut h1 = [0u32; H1_COUNT];
        for (index, field) in HEADER1_FIELDS.iter().enumerate() {
            h1[index] = bits.read_unsigned(h1_offset(index), field.width)? as u32;
            let allowed = if index == H1_INDEX_BY_ID { 0..=1 } else { 1..=MAX_FIELD_WIDTH };
            if !allowed.contains(&h1[index]) {
                return Err(CodecError::corruption(
                    h1_offset(index),
                    format!("Header-1 field '{}' declares width {}", field.name, h1[index]),
                    stream_len,
                ));
            }
        }

        let mut cursor = Cursor {
            bits,
            offset: H1_TOTAL_LEN,
        };
        let width_of = |h2_index: usize| H2_WIDTH_SOURCE[h2_index].map_or(0, |h1_index| h1[h1_index]);

        let by_id = cursor.unsigned(width_of(H2_INDEX_BY_ID), "by-id")? != 0;
        let symbol_len = cursor.unsigned(width_of(H2_INDEX_SYMBOL_LEN), "symbol length")? as usize;
        let symbol = cursor.ascii(symbol_len)?;
        let interval_secs = cursor.unsigned(width_of(H2_INDEX_INTERVAL), "interval")?;
        let initial_utc = cursor.signed(width_of(H2_INDEX_UTC), "initial utc")?;
        let gap_width = cursor.unsigned(width_of(H2_INDEX_GAP_WIDTH), "gap width")?;
        let mut digits = [0u32; 4];
        for (slot, h2_index) in digits.iter_mut().zip(H2_INDEX_PRICE_WHOLE..=H2_INDEX_VOLUME_FRACTION) {
            let value = cursor.unsigned(width_of(h2_index), "digit count")?;
            if value > MAX_DIGITS as u64 {
                return Err(cursor.corrupt(format!("digit count {value} exceeds {MAX_DIGITS}")));
            }
            *slot = value as u32;
        }
        let count_width = cursor.unsigned(width_of(H2_INDEX_DATA_COUNT_WIDTH), "data count width")?;
        let data_count = cursor.unsigned(width_of(H2_INDEX_DATA_COUNT), "data count")?;

        if count_width != width_of(H2_INDEX_DATA_COUNT) as u64 {
            return Err(cursor.corrupt(format!(
                "data count width {count_width} disagrees with Header-1 count length {}",
                width_of(H2_INDEX_DATA_COUNT)
            )));
        }
        if interval_secs == 0 {
            return Err(cursor.corrupt("interval is zero"));
        }
        if gap_width == 0 || gap_width > MAX_FIELD_WIDTH as u64 {
            return Err(cursor.corrupt(format!("gap width {gap_width} is not 1..=64")));
        }

        let header = Self {
            by_id,
            symbol,
            interval_secs: interval_secs as u32,
            initial_utc,
            gap_width: gap_width as u32,
            price: DigitCounts::new(digits[0], digits[1]),
            volume: DigitCounts::new(digits[2], digits[3]),
            data_count,
        };
        Ok((header, cursor.offset))
    }
}

/// Sequential Header-2 reader that reports short input as corruption
struct Cursor<'a> {
    bits: &'a BitSequence,
    offset: usize,
}

impl Cursor<'_> {
    fn corrupt(&self, description: impl Into<String>) -> CodecError {
        CodecError::corruption(self.offset, description, self.bits.len())
    }

    fn claim(&mut self, width: usize, field: &str) -> CodecResult<usize> {
        let remaining = self.bits.len() - self.offset;
        if width > remaining {
            return Err(self.corrupt(format!(
                "Header-2 field '{field}' needs {width} bits, {remaining} remain"
            )));
        }
        let start = self.offset;
        self.offset += width;
        Ok(start)
    }

    fn unsigned(&mut self, width: u32, field: &str) -> CodecResult<u64> {
        if width == 0 {
            return Ok(0);
        }
        let start = self.claim(width as usize, field)?;
        Ok(self.bits.read_unsigned(start, width)?)
    }

    fn signed(&mut self, width: u32, field: &str) -> CodecResult<i64> {
        let start = self.claim(width as usize, field)?;
        Ok(self.bits.read_twos_complement(start, width)?)
    }

    fn ascii(&mut self, chars: usize) -> CodecResult<String> {
        let start = self.claim(chars * SYMBOL_CHAR_BITS, "symbol")?;
        let symbol_bits = self.bits.subset(start, self.offset)?;
        symbol_bits
            .to_ascii()
            .map_err(|e| CodecError::corruption(start, format!("symbol is not ASCII: {e}"), self.bits.len()))
    }
}
