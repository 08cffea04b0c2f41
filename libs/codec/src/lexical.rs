//! # Binary Lexical Codec
//!
//! ## Purpose
//!
//! Translates between an ordered slice of candlesticks and one packed,
//! self-describing bit stream:
//!
//! ```text
//! Header-1 (41 bits) ‖ Header-2 ‖ record₀ ‖ record₁ ‖ … ‖ record_{n-1}
//! ```
//!
//! Every record has the same width: a UTC gap, then open/high/low/close and
//! volume as whole/fraction pairs. Widths come from a dataset-wide precision
//! scan, so the stream is as narrow as the data allows.
//!
//! ## Encoding
//!
//! 1. [`OriginalLexical::plan`] discovers digit counts and the widest gap
//! 2. Header-1 and Header-2 are packed from the resulting [`StreamHeader`]
//! 3. Each record stores `utc[i] - utc[i-1]` (zero for the first record)
//!
//! ## Decoding
//!
//! Header-1 is parsed blind, Header-2 at the widths it declares, then the
//! record section is walked in fixed strides. Each UTC is the previous UTC
//! plus the decoded gap. A record section that disagrees with the declared
//! count is structural corruption; no partial result is returned.

use crate::constants::RECORD_FIELD_COUNT;
use crate::error::{CodecError, CodecResult};
use crate::header::{parse_interval, validate_symbol, RecordLayout, StreamHeader};
use crate::precision::{decimal_digits, pow10, DigitCounts, FractionPolicy, PrecisionPolicy, WholeFraction};
use tracing::debug;
use types::{minimum_bit_width, BitSequence, CandleStick, CandleStickFixed, Stick};

/// Encoded stream with its headers and records kept apart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedStream {
    pub header: StreamHeader,
    pub header1: BitSequence,
    pub header2: BitSequence,
    pub records: Vec<BitSequence>,
}

impl EncodedStream {
    /// `header1 ‖ header2 ‖ records`
    pub fn flatten(&self) -> BitSequence {
        let mut parts: Vec<&BitSequence> = Vec::with_capacity(self.records.len() + 2);
        parts.push(&self.header1);
        parts.push(&self.header2);
        parts.extend(self.records.iter());
        BitSequence::concat(&parts)
    }

    pub fn bit_len(&self) -> usize {
        self.header1.len() + self.header2.len() + self.records.iter().map(BitSequence::len).sum::<usize>()
    }
}

/// Decoded records plus the header they were packed under.
///
/// Equality includes the header, so the same values packed at different
/// widths compare unequal.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedStream {
    pub header: StreamHeader,
    pub sticks: Vec<CandleStickFixed>,
}

impl DecodedStream {
    pub fn symbol(&self) -> &str {
        &self.header.symbol
    }

    pub fn interval_secs(&self) -> u32 {
        self.header.interval_secs
    }

    pub fn len(&self) -> usize {
        self.sticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sticks.is_empty()
    }
}

/// Non-negative distance from `previous` to `utc`
fn utc_gap(previous: i64, utc: i64) -> CodecResult<u64> {
    if utc < previous {
        return Err(CodecError::OutOfOrder { previous, utc });
    }
    Ok(utc.abs_diff(previous))
}

/// The adaptive OHLCV codec for one symbol and interval
#[derive(Debug, Clone, PartialEq)]
pub struct OriginalLexical {
    symbol: String,
    interval: String,
    policy: PrecisionPolicy,
    by_id: bool,
}

impl OriginalLexical {
    /// Symbol and interval are validated when a header is generated
    pub fn new(symbol: impl Into<String>, interval: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            interval: interval.into(),
            policy: PrecisionPolicy::default(),
            by_id: false,
        }
    }

    pub fn with_policy(mut self, policy: PrecisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Mark streams as keyed by identifier rather than symbol text
    pub fn with_by_id(mut self, by_id: bool) -> Self {
        self.by_id = by_id;
        self
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn interval(&self) -> &str {
        &self.interval
    }

    pub fn policy(&self) -> PrecisionPolicy {
        self.policy
    }

    // ------------------------------------------------------------------
    // Precision discovery
    // ------------------------------------------------------------------

    /// Digit counts across every open, high, low and close value
    pub fn base10_price_digits<S: Stick>(&self, sticks: &[S]) -> CodecResult<DigitCounts> {
        let values: Vec<f64> = sticks.iter().flat_map(|s| s.prices()).collect();
        self.policy.price.discover(&values)
    }

    /// Digit counts across every volume value
    pub fn base10_volume_digits<S: Stick>(&self, sticks: &[S]) -> CodecResult<DigitCounts> {
        let values: Vec<f64> = sticks.iter().map(Stick::volume).collect();
        self.policy.volume.discover(&values)
    }

    /// Run discovery and build the header for `sticks`
    pub fn plan<S: Stick>(&self, sticks: &[S]) -> CodecResult<StreamHeader> {
        validate_symbol(&self.symbol)?;
        let interval_secs = parse_interval(&self.interval)?;

        let mut widest_gap = 0;
        for pair in sticks.windows(2) {
            widest_gap = widest_gap.max(utc_gap(pair[0].utc(), pair[1].utc())?);
        }

        Ok(StreamHeader {
            by_id: self.by_id,
            symbol: self.symbol.clone(),
            interval_secs,
            initial_utc: sticks.first().map_or(0, Stick::utc),
            gap_width: minimum_bit_width(widest_gap),
            price: self.base10_price_digits(sticks)?,
            volume: self.base10_volume_digits(sticks)?,
            data_count: sticks.len() as u64,
        })
    }

    // ------------------------------------------------------------------
    // Encoding
    // ------------------------------------------------------------------

    pub fn gen_binary_header1(&self, header: &StreamHeader) -> CodecResult<BitSequence> {
        header.header1()
    }

    pub fn gen_binary_header2(&self, header: &StreamHeader) -> CodecResult<BitSequence> {
        header.header2()
    }

    /// Pack one record. `prev_utc` is `None` for the first record of a stream.
    pub fn binary_data<S: Stick>(
        &self,
        header: &StreamHeader,
        stick: &S,
        prev_utc: Option<i64>,
    ) -> CodecResult<BitSequence> {
        let gap = match prev_utc {
            Some(previous) => utc_gap(previous, stick.utc())?,
            None => 0,
        };

        let mut fields = [0u64; RECORD_FIELD_COUNT];
        fields[0] = gap;
        for (i, price) in stick.prices().into_iter().enumerate() {
            let split = split_within(&self.policy.price, price, header.price)?;
            fields[1 + 2 * i] = split.whole;
            fields[2 + 2 * i] = split.fraction;
        }
        let volume = split_within(&self.policy.volume, stick.volume(), header.volume)?;
        fields[RECORD_FIELD_COUNT - 2] = volume.whole;
        fields[RECORD_FIELD_COUNT - 1] = volume.fraction;

        let layout = header.layout();
        let mut record = BitSequence::zeroed(layout.width());
        let mut offset = 0;
        for (width, value) in layout.field_widths().into_iter().zip(fields) {
            record.set_subset_unsigned(offset, width, value)?;
            offset += width as usize;
        }
        Ok(record)
    }

    /// Headers and one bit sequence per record
    pub fn binary_data_points<S: Stick>(&self, sticks: &[S]) -> CodecResult<EncodedStream> {
        let header = self.plan(sticks)?;
        let header1 = self.gen_binary_header1(&header)?;
        let header2 = self.gen_binary_header2(&header)?;

        let mut records = Vec::with_capacity(sticks.len());
        let mut prev_utc = None;
        for stick in sticks {
            records.push(self.binary_data(&header, stick, prev_utc)?);
            prev_utc = Some(stick.utc());
        }

        debug!(
            "Encoded {} records for {} ({} price digits, {} volume digits, gap width {})",
            records.len(),
            header.symbol,
            header.price.whole + header.price.fraction,
            header.volume.whole + header.volume.fraction,
            header.gap_width
        );

        Ok(EncodedStream {
            header,
            header1,
            header2,
            records,
        })
    }

    /// One contiguous stream: headers then every record
    pub fn binary_data_flat<S: Stick>(&self, sticks: &[S]) -> CodecResult<BitSequence> {
        Ok(self.binary_data_points(sticks)?.flatten())
    }

    // ------------------------------------------------------------------
    // Decoding
    // ------------------------------------------------------------------

    /// Unpack one record. `prev_utc` is `None` for the first record, whose
    /// gap is measured from the header's initial UTC.
    pub fn refined_data(
        header: &StreamHeader,
        record: &BitSequence,
        prev_utc: Option<i64>,
    ) -> CodecResult<CandleStickFixed> {
        let layout = header.layout();
        if record.len() != layout.width() {
            return Err(CodecError::corruption(
                0,
                format!("record is {} bits, layout needs {}", record.len(), layout.width()),
                record.len(),
            ));
        }
        decode_record(header, &layout, record, 0, prev_utc.unwrap_or(header.initial_utc))
    }

    /// Decode a stream whose headers and records are held separately
    pub fn refined_data_array(stream: &EncodedStream) -> CodecResult<DecodedStream> {
        let headers = BitSequence::concat(&[&stream.header1, &stream.header2]);
        let (header, header_len) = StreamHeader::parse(&headers)?;
        if header_len != headers.len() {
            return Err(CodecError::corruption(
                header_len,
                "unexpected bits after Header-2",
                headers.len(),
            ));
        }
        if stream.records.len() as u64 != header.data_count {
            return Err(CodecError::corruption(
                header_len,
                format!(
                    "header declares {} records, {} present",
                    header.data_count,
                    stream.records.len()
                ),
                stream.bit_len(),
            ));
        }

        let mut sticks = Vec::with_capacity(stream.records.len());
        let mut prev_utc = None;
        for record in &stream.records {
            let stick = Self::refined_data(&header, record, prev_utc)?;
            prev_utc = Some(stick.utc());
            sticks.push(stick);
        }
        Ok(DecodedStream { header, sticks })
    }

    /// Decode one contiguous stream. Up to seven zero bits of byte padding
    /// after the last record are accepted.
    pub fn refined_data_flat(bits: &BitSequence) -> CodecResult<DecodedStream> {
        let (header, mut offset) = checked_record_section(bits)?;
        let layout = header.layout();

        let mut sticks = Vec::with_capacity(header.data_count as usize);
        let mut previous = header.initial_utc;
        for _ in 0..header.data_count {
            let stick = decode_record(&header, &layout, bits, offset, previous)?;
            previous = stick.utc();
            offset += layout.width();
            sticks.push(stick);
        }

        debug!("Decoded {} records for {}", sticks.len(), header.symbol);
        Ok(DecodedStream { header, sticks })
    }

    /// Decode `quantity` records starting at record index `from`.
    ///
    /// Records before `from` only have their gap field read. The range is
    /// clamped to the declared record count.
    pub fn refined_data_range(
        bits: &BitSequence,
        from: usize,
        quantity: usize,
    ) -> CodecResult<DecodedStream> {
        let (header, section) = checked_record_section(bits)?;
        let layout = header.layout();
        let count = header.data_count as usize;
        let from = from.min(count);
        let to = from.saturating_add(quantity).min(count);

        let mut previous = header.initial_utc;
        for index in 0..from {
            let gap = bits.read_unsigned(section + index * layout.width(), layout.gap)?;
            previous = previous.checked_add_unsigned(gap).ok_or_else(|| {
                CodecError::corruption(section, "timestamp overflows 64 bits", bits.len())
            })?;
        }

        let mut sticks = Vec::with_capacity(to - from);
        for index in from..to {
            let stick =
                decode_record(&header, &layout, bits, section + index * layout.width(), previous)?;
            previous = stick.utc();
            sticks.push(stick);
        }
        debug!(
            "Decoded records {}..{} of {} for {}",
            from, to, count, header.symbol
        );
        Ok(DecodedStream { header, sticks })
    }
}

/// Parse the headers and check that the record section holds exactly the
/// declared records plus at most seven zero padding bits. Returns the
/// header and the offset of the first record.
fn checked_record_section(bits: &BitSequence) -> CodecResult<(StreamHeader, usize)> {
    let (header, offset) = StreamHeader::parse(bits)?;
    let layout = header.layout();
    let stream_len = bits.len();

    let needed = usize::try_from(header.data_count)
        .ok()
        .and_then(|count| count.checked_mul(layout.width()))
        .ok_or_else(|| {
            CodecError::corruption(offset, "declared record count overflows", stream_len)
        })?;
    let available = stream_len - offset;
    if available < needed {
        return Err(CodecError::corruption(
            offset,
            format!(
                "record section truncated: {} records of {} bits need {needed}, {available} remain",
                header.data_count,
                layout.width()
            ),
            stream_len,
        ));
    }
    let padding = available - needed;
    if padding >= 8 {
        return Err(CodecError::corruption(
            offset + needed,
            format!("{padding} bits follow the last record"),
            stream_len,
        ));
    }
    if (offset + needed..stream_len).any(|i| bits.get(i) == Some(true)) {
        return Err(CodecError::corruption(
            offset + needed,
            "non-zero padding after the last record",
            stream_len,
        ));
    }
    Ok((header, offset))
}

/// Split a value and check that its whole part fits the header's digit count
fn split_within(policy: &FractionPolicy, value: f64, counts: DigitCounts) -> CodecResult<WholeFraction> {
    let split = policy.split(value, counts.fraction)?;
    if decimal_digits(split.whole) > counts.whole {
        return Err(CodecError::precision_loss(
            value,
            format!("whole part needs more than {} digits", counts.whole),
        ));
    }
    Ok(split)
}

fn decode_record(
    header: &StreamHeader,
    layout: &RecordLayout,
    bits: &BitSequence,
    start: usize,
    previous_utc: i64,
) -> CodecResult<CandleStickFixed> {
    let mut fields = [0u64; RECORD_FIELD_COUNT];
    let mut offset = start;
    for (slot, width) in fields.iter_mut().zip(layout.field_widths()) {
        *slot = bits.read_unsigned(offset, width)?;
        offset += width as usize;
    }

    let utc = previous_utc
        .checked_add_unsigned(fields[0])
        .ok_or_else(|| CodecError::corruption(start, "timestamp overflows 64 bits", bits.len()))?;

    let value = |index: usize, counts: DigitCounts| -> CodecResult<f64> {
        let (whole, fraction) = (fields[index], fields[index + 1]);
        if decimal_digits(whole) > counts.whole || fraction >= pow10(counts.fraction) {
            return Err(CodecError::corruption(
                start,
                format!("field {index} holds {whole}.{fraction}, wider than its declared digits"),
                bits.len(),
            ));
        }
        Ok(WholeFraction {
            whole,
            fraction,
            digits: counts.fraction,
        }
        .to_f64())
    };

    let mut stick = CandleStick::at(utc);
    stick.set_open(value(1, header.price)?);
    stick.set_high(value(3, header.price)?);
    stick.set_low(value(5, header.price)?);
    stick.set_close(value(7, header.price)?);
    stick.set_volume(value(9, header.volume)?);
    Ok(stick.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> Vec<CandleStickFixed> {
        vec![
            CandleStickFixed::new(1000, 10.5, 11.0, 10.0, 10.8, 100.0),
            CandleStickFixed::new(1060, 10.8, 10.9, 10.7, 10.75, 50.25),
        ]
    }

    #[test]
    fn test_plan_discovers_scenario_widths() {
        let codec = OriginalLexical::new("TEST", "60");
        let header = codec.plan(&scenario()).unwrap();
        assert_eq!(header.price, DigitCounts::new(2, 2));
        assert_eq!(header.volume, DigitCounts::new(3, 2));
        assert_eq!(header.gap_width, 6);
        assert_eq!(header.initial_utc, 1000);
        assert_eq!(header.interval_secs, 60);
        assert_eq!(header.data_count, 2);
    }

    #[test]
    fn test_first_record_gap_is_zero() {
        let codec = OriginalLexical::new("TEST", "60");
        let sticks = scenario();
        let header = codec.plan(&sticks).unwrap();

        let first = codec.binary_data(&header, &sticks[0], None).unwrap();
        assert_eq!(first.read_unsigned(0, 6).unwrap(), 0);
        let second = codec.binary_data(&header, &sticks[1], Some(1000)).unwrap();
        assert_eq!(second.read_unsigned(0, 6).unwrap(), 60);
        // open whole then open fraction
        assert_eq!(second.read_unsigned(6, 7).unwrap(), 10);
        assert_eq!(second.read_unsigned(13, 7).unwrap(), 80);

        let decoded = OriginalLexical::refined_data(&header, &second, Some(1000)).unwrap();
        assert_eq!(decoded, sticks[1]);
    }

    #[test]
    fn test_out_of_order_rejected() {
        let codec = OriginalLexical::new("TEST", "60");
        let mut sticks = scenario();
        sticks.reverse();
        assert_eq!(
            codec.plan(&sticks).unwrap_err(),
            CodecError::OutOfOrder {
                previous: 1060,
                utc: 1000
            }
        );
    }

    #[test]
    fn test_value_outside_plan_is_precision_loss() {
        let codec = OriginalLexical::new("TEST", "60");
        let header = codec.plan(&scenario()).unwrap();
        let wide = CandleStickFixed::new(1120, 123.0, 123.0, 123.0, 123.0, 1.0);
        let err = codec.binary_data(&header, &wide, Some(1060)).unwrap_err();
        assert!(err.is_precision_loss());
    }

    #[test]
    fn test_record_length_mismatch_is_corruption() {
        let codec = OriginalLexical::new("TEST", "60");
        let header = codec.plan(&scenario()).unwrap();
        let err = OriginalLexical::refined_data(&header, &BitSequence::zeroed(3), None).unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn test_encoded_stream_record_count_checked() {
        let codec = OriginalLexical::new("TEST", "60");
        let mut stream = codec.binary_data_points(&scenario()).unwrap();
        stream.records.pop();
        assert!(OriginalLexical::refined_data_array(&stream)
            .unwrap_err()
            .is_corruption());
    }

    #[test]
    fn test_range_decode_matches_full_decode() {
        let codec = OriginalLexical::new("TEST", "60");
        let sticks: Vec<CandleStickFixed> = (0..6)
            .map(|i| CandleStickFixed::new(1000 + i * 60, 10.0 + i as f64, 12.0, 9.5, 10.25, 3.0))
            .collect();
        let flat = codec.binary_data_flat(&sticks).unwrap();

        let middle = OriginalLexical::refined_data_range(&flat, 2, 3).unwrap();
        assert_eq!(middle.sticks, sticks[2..5].to_vec());
        assert_eq!(middle.header.data_count, 6);

        let tail = OriginalLexical::refined_data_range(&flat, 4, 100).unwrap();
        assert_eq!(tail.sticks, sticks[4..].to_vec());
        assert!(OriginalLexical::refined_data_range(&flat, 9, 1)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_full_range_gap_round_trips() {
        let codec = OriginalLexical::new("TEST", "60");
        let sticks = vec![
            CandleStickFixed::new(-10, 1.0, 1.0, 1.0, 1.0, 1.0),
            CandleStickFixed::new(i64::MAX, 2.0, 2.0, 2.0, 2.0, 2.0),
        ];
        let flat = codec.binary_data_flat(&sticks).unwrap();
        assert_eq!(OriginalLexical::refined_data_flat(&flat).unwrap().sticks, sticks);
        assert_eq!(
            OriginalLexical::refined_data_range(&flat, 1, 1).unwrap().sticks,
            sticks[1..].to_vec()
        );
    }

    #[test]
    fn test_fixed_policy_rejects_sub_scale_value() {
        let codec = OriginalLexical::new("TEST", "60").with_policy(PrecisionPolicy::fixed(8, 0));
        let sticks = [CandleStickFixed::new(0, 1e-30, 1.0, 1.0, 1.0, 1.0)];
        assert!(codec.binary_data_flat(&sticks).unwrap_err().is_precision_loss());
    }
}
