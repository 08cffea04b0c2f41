//! # Ingestion Pipeline
//!
//! Raw bars are buffered on a standby queue and smelted into an encoded
//! stream on demand. The codec itself assumes sorted, duplicate-free input;
//! the smelter is where that is enforced.
//!
//! ## Standby rules
//!
//! - `smelt` sorts standby by UTC, keeps the last record seen for any
//!   repeated timestamp, encodes, and drains standby on success
//! - `fetch` removes and returns the earliest records without encoding
//! - a failed `smelt` keeps every record on standby

use crate::error::{CodecError, CodecResult};
use crate::lexical::{EncodedStream, OriginalLexical};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use types::{CandleStickFixed, Stick};

/// One aggregate bar as delivered by a Polygon-style API. `t` is epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawStick {
    pub t: i64,
    pub o: f64,
    pub h: f64,
    pub l: f64,
    pub c: f64,
    pub v: f64,
}

impl RawStick {
    /// Convert to a candlestick keyed by epoch seconds
    pub fn refine(&self) -> CodecResult<CandleStickFixed> {
        if self.t % 1000 != 0 {
            return Err(CodecError::malformed_input(
                "raw bar",
                format!("timestamp {}ms is not a whole second", self.t),
            ));
        }
        Ok(CandleStickFixed::new(
            self.t / 1000,
            self.o,
            self.h,
            self.l,
            self.c,
            self.v,
        ))
    }
}

/// Aggregate responses arrive either wrapped in `results` or as a bare array
#[derive(Deserialize)]
#[serde(untagged)]
enum RawBatch {
    Wrapped { results: Vec<RawStick> },
    Bare(Vec<RawStick>),
}

/// Buffers records on standby and turns them into encoded streams
pub trait Smelter {
    /// Queue one raw bar
    fn accept_raw(&mut self, raw: RawStick) -> CodecResult<()>;

    /// Queue every bar in a JSON aggregate payload; returns how many were queued
    fn accept_raw_json(&mut self, json: &str) -> CodecResult<usize>;

    /// Queue an already refined record
    fn accept_refined(&mut self, stick: CandleStickFixed);

    /// Encode everything on standby and drain it
    fn smelt(&mut self) -> CodecResult<EncodedStream>;

    /// Remove and return up to `count` of the earliest standby records
    fn fetch(&mut self, count: usize) -> Vec<CandleStickFixed>;

    fn clear_standby(&mut self);

    fn standby_len(&self) -> usize;
}

/// [`Smelter`] backed by an [`OriginalLexical`] codec
#[derive(Debug, Clone)]
pub struct LexicalSmelter {
    codec: OriginalLexical,
    standby: Vec<CandleStickFixed>,
}

impl LexicalSmelter {
    pub fn new(codec: OriginalLexical) -> Self {
        Self {
            codec,
            standby: Vec::new(),
        }
    }

    pub fn codec(&self) -> &OriginalLexical {
        &self.codec
    }

    /// Sort by UTC and keep the last arrival for each timestamp
    fn settle(&mut self) {
        // Stable sort keeps arrival order within equal timestamps
        self.standby.sort_by_key(|s| s.utc());
        let before = self.standby.len();
        let mut settled: Vec<CandleStickFixed> = Vec::with_capacity(before);
        for stick in self.standby.drain(..) {
            match settled.last_mut() {
                Some(last) if last.utc() == stick.utc() => *last = stick,
                _ => settled.push(stick),
            }
        }
        if settled.len() < before {
            debug!(
                "Dropped {} duplicate timestamps from standby",
                before - settled.len()
            );
        }
        self.standby = settled;
    }
}

impl Smelter for LexicalSmelter {
    fn accept_raw(&mut self, raw: RawStick) -> CodecResult<()> {
        self.standby.push(raw.refine()?);
        Ok(())
    }

    fn accept_raw_json(&mut self, json: &str) -> CodecResult<usize> {
        let batch: RawBatch = serde_json::from_str(json)
            .map_err(|e| CodecError::malformed_input("aggregate JSON", e.to_string()))?;
        let raws = match batch {
            RawBatch::Wrapped { results } => results,
            RawBatch::Bare(raws) => raws,
        };

        // Refine everything first so a bad bar queues nothing
        let refined = raws
            .iter()
            .map(RawStick::refine)
            .collect::<CodecResult<Vec<_>>>()?;
        let accepted = refined.len();
        self.standby.extend(refined);
        Ok(accepted)
    }

    fn accept_refined(&mut self, stick: CandleStickFixed) {
        self.standby.push(stick);
    }

    fn smelt(&mut self) -> CodecResult<EncodedStream> {
        self.settle();
        let stream = self.codec.binary_data_points(&self.standby)?;
        info!(
            "Smelted {} records for {} into {} bits",
            self.standby.len(),
            self.codec.symbol(),
            stream.bit_len()
        );
        self.standby.clear();
        Ok(stream)
    }

    fn fetch(&mut self, count: usize) -> Vec<CandleStickFixed> {
        self.settle();
        let take = count.min(self.standby.len());
        self.standby.drain(..take).collect()
    }

    fn clear_standby(&mut self) {
        self.standby.clear();
    }

    fn standby_len(&self) -> usize {
        self.standby.len()
    }
}
