//! # Precision Discovery
//!
//! ## Purpose
//!
//! Fixed-point quantization of `f64` candlestick values. A value is split into
//! a whole part and a fraction part scaled to a dataset-wide digit count, and
//! each part is packed as an unsigned integer of `minimum_bit_width(10^d - 1)`
//! bits.
//!
//! Digits are taken from the shortest decimal representation of the `f64`
//! (what `Display` prints), parsed into a [`Decimal`]. `10.75` therefore has
//! two fraction digits, not the fifty-odd of its exact binary expansion.
//!
//! ## Policies
//!
//! - [`FractionPolicy::Trim`]: use the largest count of significant fraction
//!   digits seen anywhere in the dataset, capped at a ceiling. Values with
//!   more digits than the ceiling are rounded half away from zero first, and
//!   only the digits that survive rounding count.
//! - [`FractionPolicy::Fixed`]: always use exactly `n` digits. A value that
//!   needs more is a precision loss.
//!
//! ## Representable values
//!
//! Finite, below `1e19` and sign-positive. `-0.0` is rejected along with
//! every other negative: it would decode as `0.0`, which is not bit-identical.

use crate::constants::{DEFAULT_FRACTION_CEILING, MAX_DIGITS};
use crate::error::{CodecError, CodecResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use tracing::debug;
use types::minimum_bit_width;

/// Values must stay strictly below this bound
const VALUE_LIMIT: f64 = 1e19;

/// `10^digits` for `digits <= 19`
#[inline]
pub const fn pow10(digits: u32) -> u64 {
    10u64.pow(digits)
}

/// Count of decimal digits in `n`; `0` has none
pub fn decimal_digits(n: u64) -> u32 {
    if n == 0 {
        0
    } else {
        n.ilog10() + 1
    }
}

/// Bits needed for any value of `digits` decimal digits
pub fn digits_to_bits(digits: u32) -> u32 {
    minimum_bit_width(pow10(digits.min(MAX_DIGITS)) - 1)
}

/// Whole and fraction digit counts for one value group (prices or volume)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DigitCounts {
    pub whole: u32,
    pub fraction: u32,
}

impl DigitCounts {
    pub fn new(whole: u32, fraction: u32) -> Self {
        Self { whole, fraction }
    }

    pub fn whole_bits(&self) -> u32 {
        digits_to_bits(self.whole)
    }

    pub fn fraction_bits(&self) -> u32 {
        digits_to_bits(self.fraction)
    }
}

/// A value split for fixed-point packing: `whole + fraction / 10^digits`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WholeFraction {
    pub whole: u64,
    pub fraction: u64,
    pub digits: u32,
}

impl WholeFraction {
    /// Nearest `f64` to the decimal value
    pub fn to_f64(&self) -> f64 {
        if self.digits == 0 {
            return self.whole as f64;
        }
        let scale = pow10(self.digits);
        let numerator = self.whole as u128 * scale as u128 + self.fraction as u128;

        // Both operands exact in f64, so one correctly rounded division
        if numerator < (1u128 << 53) {
            return numerator as f64 / scale as f64;
        }

        let text = format!(
            "{}.{:0width$}",
            self.whole,
            self.fraction,
            width = self.digits as usize
        );
        text.parse()
            .unwrap_or(self.whole as f64 + self.fraction as f64 / scale as f64)
    }
}

fn check_representable(value: f64) -> CodecResult<()> {
    if !value.is_finite() {
        return Err(CodecError::precision_loss(value, "value is not finite"));
    }
    if value.is_sign_negative() {
        return Err(CodecError::precision_loss(value, "negative values are not representable"));
    }
    if value >= VALUE_LIMIT {
        return Err(CodecError::precision_loss(value, "whole part exceeds 19 digits"));
    }
    Ok(())
}

/// Exact decimal form of `value`; no digit may be dropped
fn exact_decimal(value: f64) -> CodecResult<Decimal> {
    check_representable(value)?;
    Decimal::from_str_exact(&value.to_string())
        .map_err(|e| CodecError::precision_loss(value, format!("no exact decimal form: {e}")))
}

/// Decimal form of `value` for rounding; digits past Decimal's 28 digit
/// scale are rounded away
fn rounding_decimal(value: f64) -> CodecResult<Decimal> {
    check_representable(value)?;
    let text = value.to_string();
    Decimal::from_str_exact(&text)
        .or_else(|_| Decimal::from_str(&text))
        .map_err(|e| CodecError::precision_loss(value, format!("decimal conversion failed: {e}")))
}

fn check_digits(value: f64, digits: u32) -> CodecResult<()> {
    if digits > MAX_DIGITS {
        return Err(CodecError::precision_loss(
            value,
            format!("{digits} fraction digits exceeds the {MAX_DIGITS} digit limit"),
        ));
    }
    Ok(())
}

/// Significant fraction digits of `value` (trailing zeros dropped).
///
/// Counted on the shortest decimal text, so values finer than any
/// `Decimal` scale still report every digit.
pub fn significant_fraction_digits(value: f64) -> CodecResult<u32> {
    check_representable(value)?;
    let text = value.to_string();
    let digits = text
        .split_once('.')
        .map_or(0, |(_, fraction)| fraction.trim_end_matches('0').len());
    Ok(digits as u32)
}

/// Round `value` to exactly `digits` fraction digits, half away from zero
pub fn quantize(value: f64, digits: u32) -> CodecResult<WholeFraction> {
    check_digits(value, digits)?;
    quantize_decimal(value, rounding_decimal(value)?, digits)
}

fn quantize_decimal(value: f64, decimal: Decimal, digits: u32) -> CodecResult<WholeFraction> {
    let mut whole = decimal
        .trunc()
        .to_u64()
        .ok_or_else(|| CodecError::precision_loss(value, "whole part does not fit 64 bits"))?;
    let mut fraction = decimal
        .fract()
        .round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero);

    if fraction >= Decimal::ONE {
        whole += 1;
        fraction -= Decimal::ONE;
        if whole >= pow10(MAX_DIGITS) {
            return Err(CodecError::precision_loss(value, "rounding carries past 19 whole digits"));
        }
    }

    fraction.rescale(digits);
    let fraction = u64::try_from(fraction.mantissa())
        .map_err(|_| CodecError::precision_loss(value, "fraction does not fit 64 bits"))?;

    Ok(WholeFraction {
        whole,
        fraction,
        digits,
    })
}

/// Exact split at `digits` fraction digits; fails rather than drop a digit
pub fn split_whole_fraction(value: f64, digits: u32) -> CodecResult<WholeFraction> {
    check_digits(value, digits)?;
    let needed = significant_fraction_digits(value)?;
    if needed > digits {
        return Err(CodecError::precision_loss(
            value,
            format!("needs {needed} fraction digits, only {digits} available"),
        ));
    }
    quantize_decimal(value, exact_decimal(value)?, digits)
}

/// Round to `digits`, then strip trailing zero digits from the fraction
pub fn split_whole_fraction_trim(value: f64, digits: u32) -> CodecResult<WholeFraction> {
    let mut split = quantize(value, digits)?;
    while split.digits > 0 && split.fraction % 10 == 0 {
        split.fraction /= 10;
        split.digits -= 1;
    }
    Ok(split)
}

/// How fraction digits are chosen for one value group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FractionPolicy {
    /// Dataset-wide significant digits, capped at `ceiling`
    Trim { ceiling: u32 },
    /// Always exactly this many digits
    Fixed(u32),
}

impl Default for FractionPolicy {
    fn default() -> Self {
        Self::Trim {
            ceiling: DEFAULT_FRACTION_CEILING,
        }
    }
}

impl FractionPolicy {
    /// Digit counts for a group of values
    pub fn discover(&self, values: &[f64]) -> CodecResult<DigitCounts> {
        let fraction = match *self {
            Self::Trim { ceiling } => {
                let ceiling = ceiling.min(MAX_DIGITS);
                let mut widest = 0;
                let mut rounded = 0usize;
                for &value in values {
                    let mut digits = significant_fraction_digits(value)?;
                    if digits > ceiling {
                        rounded += 1;
                        digits = split_whole_fraction_trim(value, ceiling)?.digits;
                    }
                    widest = widest.max(digits);
                }
                if rounded > 0 {
                    debug!(
                        rounded,
                        ceiling, widest, "Rounding values with more fraction digits than the ceiling"
                    );
                }
                widest
            }
            Self::Fixed(digits) => digits,
        };

        let mut whole = 0;
        for &value in values {
            whole = whole.max(decimal_digits(self.split(value, fraction)?.whole));
        }
        Ok(DigitCounts { whole, fraction })
    }

    /// Split one value at the group's chosen digit count
    pub fn split(&self, value: f64, digits: u32) -> CodecResult<WholeFraction> {
        match self {
            Self::Trim { .. } => quantize(value, digits),
            Self::Fixed(_) => split_whole_fraction(value, digits),
        }
    }
}

/// Fraction policies for the price group (open/high/low/close) and volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrecisionPolicy {
    pub price: FractionPolicy,
    pub volume: FractionPolicy,
}

impl PrecisionPolicy {
    /// Trim both groups at the same ceiling
    pub fn trim(ceiling: u32) -> Self {
        Self {
            price: FractionPolicy::Trim { ceiling },
            volume: FractionPolicy::Trim { ceiling },
        }
    }

    pub fn fixed(price_digits: u32, volume_digits: u32) -> Self {
        Self {
            price: FractionPolicy::Fixed(price_digits),
            volume: FractionPolicy::Fixed(volume_digits),
        }
    }
}
