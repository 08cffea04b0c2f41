//! # Warehouse Validation
//!
//! Two hooks guard the warehouse:
//!
//! - [`SchemaValidator`] checks that the storage layout can receive data
//! - [`DataValidator`] checks that a stream is well formed before it is
//!   stored or after it is read
//!
//! A stream is valid when its headers parse and its record section holds
//! exactly the declared number of records, each within its declared digits.

use crate::error::{WarehouseError, WarehouseResult};
use crate::storage::{BinaryWarehouse, StreamKey, STREAM_EXTENSION};
use codec::{OriginalLexical, StreamHeader};
use std::fs;
use tracing::{debug, warn};
use types::BitSequence;

/// Outcome of a compliant schema check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaReport {
    pub streams: usize,
    /// Entries that do not break the layout but do not belong in it
    pub warnings: Vec<String>,
}

impl SchemaReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Storage layout validation
pub trait SchemaValidator {
    /// Requires a connection. Fails on the first noncompliant entry.
    fn validate_schema(&self) -> WarehouseResult<SchemaReport>;
}

/// Stream content validation
pub trait DataValidator {
    /// Validate one flat stream, returning its header
    fn validate_data(&self, bits: &BitSequence) -> WarehouseResult<StreamHeader>;

    /// Validate every stream, stopping at the first invalid one
    fn validate_data_collection(&self, streams: &[BitSequence]) -> WarehouseResult<Vec<StreamHeader>> {
        streams
            .iter()
            .enumerate()
            .map(|(index, bits)| {
                self.validate_data(bits).map_err(|e| {
                    debug!("Stream {} of {} failed validation: {}", index, streams.len(), e);
                    e
                })
            })
            .collect()
    }
}

/// Data validation that needs no warehouse
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamValidator;

impl DataValidator for StreamValidator {
    fn validate_data(&self, bits: &BitSequence) -> WarehouseResult<StreamHeader> {
        let decoded = OriginalLexical::refined_data_flat(bits)?;
        Ok(decoded.header)
    }
}

impl DataValidator for BinaryWarehouse {
    fn validate_data(&self, bits: &BitSequence) -> WarehouseResult<StreamHeader> {
        StreamValidator.validate_data(bits)
    }
}

impl SchemaValidator for BinaryWarehouse {
    fn validate_schema(&self) -> WarehouseResult<SchemaReport> {
        let root = self.root()?;
        let mut report = SchemaReport::default();

        let entries = fs::read_dir(root).map_err(|e| WarehouseError::io(root, e))?;
        for entry in entries {
            let path = entry.map_err(|e| WarehouseError::io(root, e))?.path();
            if !path.is_dir() {
                report.warnings.push(format!("stray file {:?}", path));
                continue;
            }
            let symbol = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| WarehouseError::schema(&path, "symbol directory name is not UTF-8"))?;

            let files = fs::read_dir(&path).map_err(|e| WarehouseError::io(&path, e))?;
            for file in files {
                let file = file.map_err(|e| WarehouseError::io(&path, e))?.path();
                if file.extension().and_then(|e| e.to_str()) != Some(STREAM_EXTENSION) {
                    report.warnings.push(format!("stray entry {:?}", file));
                    continue;
                }
                let interval = file
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .ok_or_else(|| WarehouseError::schema(&file, "file name is not UTF-8"))?;
                let key = StreamKey::new(symbol, interval)
                    .map_err(|e| WarehouseError::schema(&file, e.to_string()))?;
                if key.interval != interval {
                    return Err(WarehouseError::schema(
                        &file,
                        format!("interval label should be {}", key.interval),
                    ));
                }
                report.streams += 1;
            }
        }

        for warning in &report.warnings {
            warn!("Warehouse schema: {}", warning);
        }
        Ok(report)
    }
}
