//! Candlestick value types
//!
//! One OHLCV bar: an epoch timestamp plus five `f64` values. Two concrete
//! records share the read-only [`Stick`] trait:
//!
//! - [`CandleStick`] exposes per-field setters and is used while a record is
//!   being assembled field by field during decode
//! - [`CandleStickFixed`] is fully determined at construction and is what the
//!   codec hands back to callers
//!
//! Equality is exact: two records are equal only when every field has an
//! identical bit pattern. Callers that need tolerance must round first.

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Read access shared by every candlestick record
pub trait Stick {
    fn utc(&self) -> i64;
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;

    /// The four price fields in wire order
    fn prices(&self) -> [f64; 4] {
        [self.open(), self.high(), self.low(), self.close()]
    }
}

/// Order two records by timestamp only
pub fn compare_to<A: Stick + ?Sized, B: Stick + ?Sized>(a: &A, b: &B) -> Ordering {
    a.utc().cmp(&b.utc())
}

/// Exact six-field comparison; `f64` fields must be bit-identical
pub fn is_equal<A: Stick + ?Sized, B: Stick + ?Sized>(a: &A, b: &B) -> bool {
    a.utc() == b.utc()
        && a.open().to_bits() == b.open().to_bits()
        && a.high().to_bits() == b.high().to_bits()
        && a.low().to_bits() == b.low().to_bits()
        && a.close().to_bits() == b.close().to_bits()
        && a.volume().to_bits() == b.volume().to_bits()
}

macro_rules! impl_stick_accessors {
    ($ty:ty) => {
        impl Stick for $ty {
            #[inline]
            fn utc(&self) -> i64 {
                self.utc
            }
            #[inline]
            fn open(&self) -> f64 {
                self.open
            }
            #[inline]
            fn high(&self) -> f64 {
                self.high
            }
            #[inline]
            fn low(&self) -> f64 {
                self.low
            }
            #[inline]
            fn close(&self) -> f64 {
                self.close
            }
            #[inline]
            fn volume(&self) -> f64 {
                self.volume
            }
        }

        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                is_equal(self, other)
            }
        }
    };
}

/// Candlestick with mutable fields
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct CandleStick {
    utc: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl CandleStick {
    pub fn new(utc: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            utc,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Empty record at `utc`, values filled in later
    pub fn at(utc: i64) -> Self {
        Self {
            utc,
            ..Self::default()
        }
    }

    pub fn set_utc(&mut self, utc: i64) {
        self.utc = utc;
    }

    pub fn set_open(&mut self, open: f64) {
        self.open = open;
    }

    pub fn set_high(&mut self, high: f64) {
        self.high = high;
    }

    pub fn set_low(&mut self, low: f64) {
        self.low = low;
    }

    pub fn set_close(&mut self, close: f64) {
        self.close = close;
    }

    pub fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }

    /// Freeze into the immutable variant
    pub fn freeze(self) -> CandleStickFixed {
        CandleStickFixed::from(self)
    }
}

/// Candlestick whose values are fixed at construction
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct CandleStickFixed {
    utc: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl CandleStickFixed {
    pub const fn new(utc: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            utc,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Copy any record into the immutable variant
    pub fn from_stick<S: Stick + ?Sized>(stick: &S) -> Self {
        Self::new(
            stick.utc(),
            stick.open(),
            stick.high(),
            stick.low(),
            stick.close(),
            stick.volume(),
        )
    }
}

impl_stick_accessors!(CandleStick);
impl_stick_accessors!(CandleStickFixed);

impl From<CandleStick> for CandleStickFixed {
    fn from(s: CandleStick) -> Self {
        Self::new(s.utc, s.open, s.high, s.low, s.close, s.volume)
    }
}

impl From<CandleStickFixed> for CandleStick {
    fn from(s: CandleStickFixed) -> Self {
        Self::new(s.utc, s.open, s.high, s.low, s.close, s.volume)
    }
}
