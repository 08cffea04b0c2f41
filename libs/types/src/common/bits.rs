//! Bit Sequence Toolkit
//!
//! A fixed-length, MSB-first sequence of bits stored packed in bytes. Bit 0 of
//! the sequence is the most significant bit of byte 0. Every higher-level
//! field of the lexical format is a composition of `read_*`/`set_subset_*`
//! calls against known offsets, so this module is the single place where
//! off-by-one bit errors can occur.
//!
//! ## Invariants
//!
//! - `bytes.len() == ceil(len / 8)`
//! - bits past `len` in the final byte are always zero, which keeps derived
//!   `PartialEq`/`Hash` structural
//! - writes into a subrange either fill it exactly or fail

use crate::common::errors::{BitError, BitResult};
use std::fmt;

/// Widest field the integer conversions support
pub const MAX_FIELD_WIDTH: u32 = 64;

/// Smallest number of bits that represents `n` unsigned. `0` needs one bit.
///
/// ```
/// use types::minimum_bit_width;
/// assert_eq!(minimum_bit_width(0), 1);
/// assert_eq!(minimum_bit_width(5), 3);
/// assert_eq!(minimum_bit_width(60), 6);
/// ```
#[inline]
pub const fn minimum_bit_width(n: u64) -> u32 {
    if n == 0 {
        1
    } else {
        64 - n.leading_zeros()
    }
}

/// Smallest number of bits that represents `v` in two's complement.
#[inline]
pub const fn minimum_twos_complement_width(v: i64) -> u32 {
    if v >= 0 {
        65 - v.leading_zeros()
    } else {
        65 - (!v).leading_zeros()
    }
}

#[inline]
fn check_width(width: u32) -> BitResult<()> {
    if width == 0 || width > MAX_FIELD_WIDTH {
        return Err(BitError::invalid_width(width as usize, "expected 1..=64 bits"));
    }
    Ok(())
}

#[inline]
fn fits_unsigned(value: u64, width: u32) -> bool {
    width >= 64 || value >> width == 0
}

#[inline]
fn fits_signed(value: i64, width: u32) -> bool {
    if width >= 64 {
        return true;
    }
    let min = -(1i64 << (width - 1));
    let max = (1i64 << (width - 1)) - 1;
    value >= min && value <= max
}

#[inline]
fn sign_extend(raw: u64, width: u32) -> i64 {
    if width >= 64 {
        raw as i64
    } else {
        let shift = 64 - width;
        ((raw << shift) as i64) >> shift
    }
}

/// Packed, fixed-length, MSB-first bit sequence
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct BitSequence {
    bytes: Vec<u8>,
    len: usize,
}

impl BitSequence {
    /// All-zero sequence of `len` bits
    pub fn zeroed(len: usize) -> Self {
        Self {
            bytes: vec![0; len.div_ceil(8)],
            len,
        }
    }

    /// Empty sequence with room for `bits` appended bits
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bits.div_ceil(8)),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bit at `index`, `None` past the end
    pub fn get(&self, index: usize) -> Option<bool> {
        (index < self.len).then(|| self.bit(index))
    }

    #[inline]
    fn bit(&self, index: usize) -> bool {
        (self.bytes[index >> 3] >> (7 - (index & 7))) & 1 == 1
    }

    #[inline]
    fn put(&mut self, index: usize, value: bool) {
        let mask = 1u8 << (7 - (index & 7));
        if value {
            self.bytes[index >> 3] |= mask;
        } else {
            self.bytes[index >> 3] &= !mask;
        }
    }

    /// Overwrite a single bit
    pub fn set(&mut self, index: usize, value: bool) -> BitResult<()> {
        if index >= self.len {
            return Err(BitError::out_of_bounds(index, index + 1, self.len));
        }
        self.put(index, value);
        Ok(())
    }

    /// Grow by one bit
    pub fn push(&mut self, value: bool) {
        if self.len & 7 == 0 {
            self.bytes.push(0);
        }
        self.len += 1;
        self.put(self.len - 1, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| self.bit(i))
    }

    #[inline]
    fn check_range(&self, start: usize, end: usize) -> BitResult<()> {
        if start > end || end > self.len {
            return Err(BitError::out_of_bounds(start, end, self.len));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Unsigned integers
    // ------------------------------------------------------------------

    /// Encode `value` as exactly `width` unsigned bits
    pub fn from_unsigned(value: u64, width: u32) -> BitResult<Self> {
        let mut bits = Self::zeroed(width as usize);
        bits.set_subset_unsigned(0, width, value)?;
        Ok(bits)
    }

    /// Encode `value` at its minimum unsigned width
    pub fn from_unsigned_minimal(value: u64) -> Self {
        let width = minimum_bit_width(value);
        let mut bits = Self::zeroed(width as usize);
        bits.write_raw(0, width, value);
        bits
    }

    /// Whole sequence as an unsigned integer
    pub fn to_unsigned(&self) -> BitResult<u64> {
        self.read_unsigned(0, self.len as u32)
    }

    /// Unsigned integer stored in `[start, start + width)`
    pub fn read_unsigned(&self, start: usize, width: u32) -> BitResult<u64> {
        check_width(width)?;
        self.check_range(start, start + width as usize)?;
        Ok(self.read_raw(start, width))
    }

    /// Write `value` into exactly `[start, start + width)`, overwriting in place
    pub fn set_subset_unsigned(&mut self, start: usize, width: u32, value: u64) -> BitResult<()> {
        check_width(width)?;
        self.check_range(start, start + width as usize)?;
        if !fits_unsigned(value, width) {
            return Err(BitError::unsigned_overflow(value, width));
        }
        self.write_raw(start, width, value);
        Ok(())
    }

    fn read_raw(&self, start: usize, width: u32) -> u64 {
        let mut value = 0u64;
        let mut index = start;
        let end = start + width as usize;

        // Leading partial byte, whole bytes, trailing partial byte
        while index < end && index & 7 != 0 {
            value = (value << 1) | self.bit(index) as u64;
            index += 1;
        }
        while index + 8 <= end {
            value = (value << 8) | self.bytes[index >> 3] as u64;
            index += 8;
        }
        while index < end {
            value = (value << 1) | self.bit(index) as u64;
            index += 1;
        }
        value
    }

    fn write_raw(&mut self, start: usize, width: u32, value: u64) {
        for offset in 0..width as usize {
            let shift = width as usize - 1 - offset;
            self.put(start + offset, (value >> shift) & 1 == 1);
        }
    }

    // ------------------------------------------------------------------
    // Two's complement integers
    // ------------------------------------------------------------------

    /// Encode `value` as exactly `width` two's-complement bits
    pub fn from_twos_complement(value: i64, width: u32) -> BitResult<Self> {
        let mut bits = Self::zeroed(width as usize);
        bits.set_subset_twos_complement(0, width, value)?;
        Ok(bits)
    }

    /// Whole sequence as a two's-complement integer
    pub fn to_twos_complement(&self) -> BitResult<i64> {
        self.read_twos_complement(0, self.len as u32)
    }

    pub fn read_twos_complement(&self, start: usize, width: u32) -> BitResult<i64> {
        let raw = self.read_unsigned(start, width)?;
        Ok(sign_extend(raw, width))
    }

    pub fn set_subset_twos_complement(
        &mut self,
        start: usize,
        width: u32,
        value: i64,
    ) -> BitResult<()> {
        check_width(width)?;
        self.check_range(start, start + width as usize)?;
        if !fits_signed(value, width) {
            return Err(BitError::signed_overflow(value, width));
        }
        let mask = if width >= 64 { u64::MAX } else { (1u64 << width) - 1 };
        self.write_raw(start, width, value as u64 & mask);
        Ok(())
    }

    /// Negate the two's-complement value in place.
    ///
    /// Keeps every bit up to and including the least significant set bit and
    /// inverts the rest. Zero and the most negative value map to themselves.
    pub fn negate_twos_complement(&mut self) {
        let lowest_set = (0..self.len).rev().find(|&i| self.bit(i));
        if let Some(pivot) = lowest_set {
            for i in 0..pivot {
                let flipped = !self.bit(i);
                self.put(i, flipped);
            }
        }
    }

    /// Negated copy
    pub fn negated(&self) -> Self {
        let mut copy = self.clone();
        copy.negate_twos_complement();
        copy
    }

    /// Bit `k` counted from the least significant end, extended past the MSB
    fn extended_bit(&self, k: usize, signed: bool) -> bool {
        if k < self.len {
            self.bit(self.len - 1 - k)
        } else {
            signed && self.len > 0 && self.bit(0)
        }
    }

    /// Equal as unsigned values regardless of width (zero extension)
    pub fn unsigned_eq(a: &Self, b: &Self) -> bool {
        let span = a.len.max(b.len);
        (0..span).all(|k| a.extended_bit(k, false) == b.extended_bit(k, false))
    }

    /// Equal as two's-complement values regardless of width (sign extension)
    pub fn twos_complement_eq(a: &Self, b: &Self) -> bool {
        let span = a.len.max(b.len);
        (0..span).all(|k| a.extended_bit(k, true) == b.extended_bit(k, true))
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    /// Length-additive, order-preserving concatenation
    pub fn concat(parts: &[&BitSequence]) -> Self {
        let total = parts.iter().map(|p| p.len).sum();
        let mut joined = Self::with_capacity(total);
        for part in parts {
            joined.append(part);
        }
        joined
    }

    /// Append `other` to the end of this sequence
    pub fn append(&mut self, other: &BitSequence) {
        if self.len & 7 == 0 {
            self.bytes.extend_from_slice(&other.bytes);
            self.len += other.len;
            return;
        }
        self.bytes.reserve(other.bytes.len());
        for bit in other.iter() {
            self.push(bit);
        }
    }

    /// Half-open range `[start, end)` as a new sequence
    pub fn subset(&self, start: usize, end: usize) -> BitResult<Self> {
        self.check_range(start, end)?;
        let mut out = Self::zeroed(end - start);
        if start & 7 == 0 {
            let first = start >> 3;
            let count = out.bytes.len();
            out.bytes.copy_from_slice(&self.bytes[first..first + count]);
            out.clear_tail();
        } else {
            for (offset, index) in (start..end).enumerate() {
                out.put(offset, self.bit(index));
            }
        }
        Ok(out)
    }

    /// Bits `[0, k)`
    pub fn left_subset(&self, k: usize) -> BitResult<Self> {
        self.subset(0, k)
    }

    /// Bits `[k, len)`
    pub fn right_subset(&self, k: usize) -> BitResult<Self> {
        self.subset(k, self.len)
    }

    fn clear_tail(&mut self) {
        let used = self.len & 7;
        if used != 0 {
            if let Some(last) = self.bytes.last_mut() {
                *last &= 0xFFu8 << (8 - used);
            }
        }
    }

    // ------------------------------------------------------------------
    // Text and bytes
    // ------------------------------------------------------------------

    /// Pack an ASCII string at 8 bits per character
    pub fn from_ascii(text: &str) -> BitResult<Self> {
        if let Some((position, character)) = text.chars().enumerate().find(|(_, c)| !c.is_ascii()) {
            return Err(BitError::NonAscii { character, position });
        }
        Ok(Self {
            bytes: text.as_bytes().to_vec(),
            len: text.len() * 8,
        })
    }

    /// Unpack 8-bit characters; the length must be a multiple of 8
    pub fn to_ascii(&self) -> BitResult<String> {
        if self.len & 7 != 0 {
            return Err(BitError::invalid_width(self.len, "character data must be a multiple of 8 bits"));
        }
        self.bytes
            .iter()
            .enumerate()
            .map(|(position, &b)| {
                if b.is_ascii() {
                    Ok(b as char)
                } else {
                    Err(BitError::NonAscii {
                        character: char::from(b),
                        position,
                    })
                }
            })
            .collect()
    }

    /// Packed bytes, last byte zero padded
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// First `bit_len` bits of `bytes`
    pub fn from_bytes(bytes: &[u8], bit_len: usize) -> BitResult<Self> {
        if bit_len > bytes.len() * 8 {
            return Err(BitError::out_of_bounds(0, bit_len, bytes.len() * 8));
        }
        let mut bits = Self {
            bytes: bytes[..bit_len.div_ceil(8)].to_vec(),
            len: bit_len,
        };
        bits.clear_tail();
        Ok(bits)
    }

    /// Every bit of `bytes`
    pub fn from_byte_slice(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            len: bytes.len() * 8,
        }
    }
}

impl FromIterator<bool> for BitSequence {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut bits = Self::with_capacity(iter.size_hint().0);
        for bit in iter {
            bits.push(bit);
        }
        bits
    }
}

impl From<&[bool]> for BitSequence {
    fn from(bools: &[bool]) -> Self {
        bools.iter().copied().collect()
    }
}

/// Renders as a run of `0`/`1` characters
impl fmt::Display for BitSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.iter() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for BitSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitSequence({} bits, 0x{})", self.len, hex::encode(&self.bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(text: &str) -> BitSequence {
        text.chars().map(|c| c == '1').collect()
    }

    #[test]
    fn test_minimum_bit_width() {
        assert_eq!(minimum_bit_width(0), 1);
        assert_eq!(minimum_bit_width(1), 1);
        assert_eq!(minimum_bit_width(3), 2);
        assert_eq!(minimum_bit_width(5), 3);
        assert_eq!(minimum_bit_width(60), 6);
        assert_eq!(minimum_bit_width(99), 7);
        assert_eq!(minimum_bit_width(u64::MAX), 64);
    }

    #[test]
    fn test_minimum_twos_complement_width() {
        assert_eq!(minimum_twos_complement_width(0), 1);
        assert_eq!(minimum_twos_complement_width(-1), 1);
        assert_eq!(minimum_twos_complement_width(1), 2);
        assert_eq!(minimum_twos_complement_width(-2), 2);
        assert_eq!(minimum_twos_complement_width(7), 4);
        assert_eq!(minimum_twos_complement_width(-8), 4);
        assert_eq!(minimum_twos_complement_width(i64::MAX), 64);
        assert_eq!(minimum_twos_complement_width(i64::MIN), 64);
    }

    #[test]
    fn test_unsigned_conversion() {
        let seven = BitSequence::from_unsigned(7, 5).unwrap();
        assert_eq!(seven.to_string(), "00111");
        assert_eq!(seven.to_unsigned().unwrap(), 7);

        assert_eq!(bits("110").to_unsigned().unwrap(), 6);
        assert_eq!(
            BitSequence::from_unsigned(8, 3),
            Err(BitError::unsigned_overflow(8, 3))
        );
        assert!(BitSequence::from_unsigned(u64::MAX, 64).is_ok());
    }

    #[test]
    fn test_twos_complement_conversion() {
        assert_eq!(bits("111").to_twos_complement().unwrap(), -1);
        assert_eq!(bits("0111").to_twos_complement().unwrap(), 7);
        assert_eq!(bits("110").to_twos_complement().unwrap(), -2);

        let minus_five = BitSequence::from_twos_complement(-5, 4).unwrap();
        assert_eq!(minus_five.to_string(), "1011");
        assert!(BitSequence::from_twos_complement(8, 4).is_err());
        assert!(BitSequence::from_twos_complement(-9, 4).is_err());
    }

    #[test]
    fn test_negate_in_place() {
        let mut value = bits("0101");
        value.negate_twos_complement();
        assert_eq!(value.to_string(), "1011");
        value.negate_twos_complement();
        assert_eq!(value.to_string(), "0101");

        let mut zero = bits("00");
        zero.negate_twos_complement();
        assert_eq!(zero.to_string(), "00");

        assert_eq!(bits("111").negated().to_string(), "001");
    }

    #[test]
    fn test_width_insensitive_equality() {
        assert!(BitSequence::twos_complement_eq(&bits("111"), &bits("1111111")));
        assert!(!BitSequence::twos_complement_eq(&bits("0111"), &bits("111")));
        assert!(BitSequence::unsigned_eq(&bits("0111"), &bits("111")));
        assert!(!BitSequence::unsigned_eq(&bits("1000"), &bits("000")));
    }

    #[test]
    fn test_subset_operations() {
        let source = bits("10101");
        assert_eq!(source.subset(1, 4).unwrap().to_string(), "010");
        assert_eq!(source.left_subset(2).unwrap().to_string(), "10");
        assert_eq!(source.right_subset(2).unwrap().to_string(), "101");
        assert_eq!(source.subset(5, 5).unwrap().len(), 0);
        assert_eq!(
            source.subset(3, 6),
            Err(BitError::out_of_bounds(3, 6, 5))
        );
        assert!(source.subset(4, 2).is_err());
    }

    #[test]
    fn test_set_subset_exact_fill() {
        let mut target = bits("10101");
        target.set_subset_unsigned(1, 3, 7).unwrap();
        assert_eq!(target.to_string(), "11111");

        let mut target = bits("00000");
        target.set_subset_unsigned(1, 3, 1).unwrap();
        assert_eq!(target.to_string(), "00010");

        assert!(target.set_subset_unsigned(1, 3, 8).is_err());
        assert!(target.set_subset_unsigned(3, 3, 1).is_err());
        // Failed writes leave the sequence untouched
        assert_eq!(target.to_string(), "00010");
    }

    #[test]
    fn test_read_across_byte_boundaries() {
        let mut seq = BitSequence::zeroed(40);
        seq.set_subset_unsigned(5, 30, 0x2ABC_DEF1).unwrap();
        assert_eq!(seq.read_unsigned(5, 30).unwrap(), 0x2ABC_DEF1);
        assert_eq!(seq.read_unsigned(0, 5).unwrap(), 0);
        assert_eq!(seq.read_unsigned(35, 5).unwrap(), 0);
    }

    #[test]
    fn test_concat_and_append() {
        let joined = BitSequence::concat(&[&bits("101"), &bits(""), &bits("00001111"), &bits("1")]);
        assert_eq!(joined.len(), 12);
        assert_eq!(joined.to_string(), "101000011111");

        let mut aligned = bits("11110000");
        aligned.append(&bits("101"));
        assert_eq!(aligned.to_string(), "11110000101");
    }

    #[test]
    fn test_ascii_round_trip() {
        let symbol = BitSequence::from_ascii("TEST").unwrap();
        assert_eq!(symbol.len(), 32);
        assert_eq!(symbol.read_unsigned(0, 8).unwrap(), b'T' as u64);
        assert_eq!(symbol.to_ascii().unwrap(), "TEST");
        assert!(matches!(
            BitSequence::from_ascii("BTC€"),
            Err(BitError::NonAscii { position: 3, .. })
        ));
        assert!(bits("1010").to_ascii().is_err());
    }

    #[test]
    fn test_bytes_round_trip_masks_tail() {
        let seq = bits("1011001");
        assert_eq!(seq.as_bytes(), &[0b1011_0010]);

        let restored = BitSequence::from_bytes(&[0b1011_0011], 7).unwrap();
        assert_eq!(restored, seq);
        assert!(BitSequence::from_bytes(&[0xFF], 9).is_err());
    }

    #[test]
    fn test_structural_equality_and_clone() {
        let a = bits("1001");
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, bits("10010"));
        assert_eq!(format!("{:?}", a), "BitSequence(4 bits, 0x90)");
    }
}
