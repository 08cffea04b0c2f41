//! # Stream Union
//!
//! Merges streams of the same symbol and interval into one stream. Records
//! are decoded, ordered by UTC, deduplicated (the later input wins for a
//! repeated timestamp) and re-encoded, so the result is planned with fresh
//! widths rather than inheriting either input's header.

use crate::error::{WarehouseError, WarehouseResult};
use crate::storage::{read_stream_file, write_stream_file};
use codec::{DecodedStream, OriginalLexical, PrecisionPolicy};
use std::path::Path;
use tracing::info;
use types::{BitSequence, CandleStickFixed, Stick};

/// Union decoded streams; `None` when there is nothing to union
fn union_decoded(
    streams: Vec<DecodedStream>,
    policy: PrecisionPolicy,
) -> WarehouseResult<Option<BitSequence>> {
    let Some(first) = streams.first() else {
        return Ok(None);
    };
    let symbol = first.symbol().to_string();
    let interval_secs = first.interval_secs();
    let by_id = first.header.by_id;
    let expected = format!("{}@{}", symbol, first.header.interval_label());

    let mut merged: Vec<CandleStickFixed> = Vec::new();
    for stream in streams {
        if stream.symbol() != symbol || stream.interval_secs() != interval_secs {
            return Err(WarehouseError::UnionMismatch {
                expected,
                found: format!("{}@{}", stream.symbol(), stream.header.interval_label()),
            });
        }
        merged.extend(stream.sticks);
    }

    // Stable sort keeps input order within equal timestamps
    merged.sort_by_key(|s| s.utc());
    let mut unique: Vec<CandleStickFixed> = Vec::with_capacity(merged.len());
    for stick in merged {
        match unique.last_mut() {
            Some(last) if last.utc() == stick.utc() => *last = stick,
            _ => unique.push(stick),
        }
    }

    let codec = OriginalLexical::new(symbol, format!("{interval_secs}s"))
        .with_policy(policy)
        .with_by_id(by_id);
    let bits = codec.binary_data_flat(&unique)?;
    info!("Union of {} produced {} records", expected, unique.len());
    Ok(Some(bits))
}

/// Union flat streams with the default precision policy
pub fn union_streams(streams: &[BitSequence]) -> WarehouseResult<Option<BitSequence>> {
    union_streams_with_policy(streams, PrecisionPolicy::default())
}

pub fn union_streams_with_policy(
    streams: &[BitSequence],
    policy: PrecisionPolicy,
) -> WarehouseResult<Option<BitSequence>> {
    let decoded = streams
        .iter()
        .map(OriginalLexical::refined_data_flat)
        .collect::<Result<Vec<_>, _>>()?;
    union_decoded(decoded, policy)
}

/// Union stream files into `output`, returning the number of records written
pub fn union_files(
    inputs: &[&Path],
    output: &Path,
    policy: PrecisionPolicy,
) -> WarehouseResult<u64> {
    let streams = inputs
        .iter()
        .map(|path| read_stream_file(path))
        .collect::<WarehouseResult<Vec<_>>>()?;
    let Some(bits) = union_streams_with_policy(&streams, policy)? else {
        return Ok(0);
    };
    write_stream_file(output, &bits)?;
    let (header, _) = codec::StreamHeader::parse(&bits)?;
    Ok(header.data_count)
}
