//! Command implementations, kept out of `main` so they can be tested directly

use anyhow::{bail, Context, Result};
use chrono::{TimeZone, Utc};
use codec::{
    DecodedStream, LexicalSmelter, OriginalLexical, PrecisionPolicy, Smelter, StreamHeader,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use types::{BitSequence, CandleStickFixed};
use warehouse::{
    read_stream_file, union_files, write_stream_file, BinaryWarehouse, SchemaValidator, StreamKey,
    Warehouse,
};

/// Where a smelted stream goes
#[derive(Debug, Clone)]
pub enum SmeltTarget {
    File(PathBuf),
    Warehouse { root: PathBuf, create_missing: bool },
}

/// Attach to a warehouse root, creating it only when allowed
pub fn open_warehouse(root: &Path, create_missing: bool) -> Result<BinaryWarehouse> {
    let mut warehouse = BinaryWarehouse::new();
    if create_missing {
        warehouse.initialize(root)?;
    } else {
        warehouse
            .connect(root.to_path_buf())
            .with_context(|| format!("Warehouse {:?} is not available", root))?;
    }
    Ok(warehouse)
}

/// Encode a Polygon-style aggregate JSON file
pub fn smelt(
    input: &Path,
    symbol: &str,
    interval: &str,
    policy: PrecisionPolicy,
    by_id: bool,
) -> Result<BitSequence> {
    let json = fs::read_to_string(input)
        .with_context(|| format!("Failed to read bars from {:?}", input))?;

    let codec = OriginalLexical::new(symbol, interval)
        .with_policy(policy)
        .with_by_id(by_id);
    let mut smelter = LexicalSmelter::new(codec);
    let accepted = smelter
        .accept_raw_json(&json)
        .with_context(|| format!("Failed to ingest {:?}", input))?;
    info!("Accepted {} bars from {:?}", accepted, input);

    let stream = smelter.smelt().context("Failed to smelt bars")?;
    Ok(stream.flatten())
}

/// Persist a smelted stream; returns the path written
pub fn deliver(bits: &BitSequence, target: &SmeltTarget) -> Result<PathBuf> {
    match target {
        SmeltTarget::File(path) => {
            write_stream_file(path, bits)?;
            Ok(path.clone())
        }
        SmeltTarget::Warehouse {
            root,
            create_missing,
        } => {
            let warehouse = open_warehouse(root, *create_missing)?;
            let key = warehouse.store(bits)?;
            Ok(warehouse.stream_path(&key)?)
        }
    }
}

/// Decode a stream file, optionally only `count` records from `from`
pub fn unsmelt(path: &Path, range: Option<(usize, usize)>) -> Result<DecodedStream> {
    let bits = read_stream_file(path)?;
    let decoded = match range {
        Some((from, count)) => OriginalLexical::refined_data_range(&bits, from, count),
        None => OriginalLexical::refined_data_flat(&bits),
    }
    .with_context(|| format!("Failed to decode {:?}", path))?;
    Ok(decoded)
}

/// Header fields in a printable form
#[derive(Debug, Serialize)]
pub struct HeaderSummary {
    pub symbol: String,
    pub interval: String,
    pub by_id: bool,
    pub initial_utc: i64,
    pub initial_time: Option<String>,
    pub records: u64,
    pub price_digits: (u32, u32),
    pub volume_digits: (u32, u32),
    pub gap_bits: u32,
    pub record_bits: usize,
    pub header_bits: usize,
}

impl HeaderSummary {
    pub fn new(header: &StreamHeader, header_bits: usize) -> Self {
        Self {
            symbol: header.symbol.clone(),
            interval: header.interval_label(),
            by_id: header.by_id,
            initial_utc: header.initial_utc,
            initial_time: Utc
                .timestamp_opt(header.initial_utc, 0)
                .single()
                .map(|t| t.to_rfc3339()),
            records: header.data_count,
            price_digits: (header.price.whole, header.price.fraction),
            volume_digits: (header.volume.whole, header.volume.fraction),
            gap_bits: header.gap_width,
            record_bits: header.layout().width(),
            header_bits,
        }
    }
}

/// Parse only the headers of a stream file
pub fn inspect(path: &Path) -> Result<HeaderSummary> {
    let bits = read_stream_file(path)?;
    let (header, header_bits) = StreamHeader::parse(&bits)
        .with_context(|| format!("Failed to parse headers of {:?}", path))?;
    Ok(HeaderSummary::new(&header, header_bits))
}

/// Union stream files into `output`
pub fn union(inputs: &[PathBuf], output: &Path, policy: PrecisionPolicy) -> Result<u64> {
    if inputs.is_empty() {
        bail!("union needs at least one input");
    }
    let paths: Vec<&Path> = inputs.iter().map(PathBuf::as_path).collect();
    let written = union_files(&paths, output, policy)
        .with_context(|| format!("Failed to union into {:?}", output))?;
    info!("Wrote {} records to {:?}", written, output);
    Ok(written)
}

/// Stream keys in a warehouse, after checking its layout
pub fn list(root: &Path, create_missing: bool) -> Result<Vec<StreamKey>> {
    let warehouse = open_warehouse(root, create_missing)?;
    let report = warehouse.validate_schema()?;
    info!(
        "Warehouse {:?}: {} streams, {} warnings",
        root,
        report.streams,
        report.warnings.len()
    );
    Ok(warehouse.list()?)
}

/// Records as a JSON array
pub fn sticks_json(sticks: &[CandleStickFixed], pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(sticks)?
    } else {
        serde_json::to_string(sticks)?
    };
    Ok(json)
}
