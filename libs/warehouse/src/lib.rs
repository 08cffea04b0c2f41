//! # Warehouse
//!
//! Storage layer for OHLCV lexical streams.
//!
//! - [`BinaryWarehouse`]: filesystem store keyed by symbol and interval
//! - [`SchemaValidator`] / [`DataValidator`]: layout and content checks
//! - [`union_streams`] / [`union_files`]: merge streams of one market
//!
//! ```no_run
//! use warehouse::{BinaryWarehouse, StreamKey};
//!
//! let mut warehouse = BinaryWarehouse::new();
//! warehouse.initialize("./warehouse")?;
//! for key in warehouse.list()? {
//!     let stream = warehouse.load(&key)?;
//!     println!("{key}: {} records", stream.len());
//! }
//! # Ok::<(), warehouse::WarehouseError>(())
//! ```

pub mod error;
pub mod storage;
pub mod union;
pub mod validation;

pub use error::{WarehouseError, WarehouseResult};
pub use storage::{
    read_stream_file, write_stream_file, BinaryWarehouse, ConnectionState, StreamKey, Warehouse,
    STREAM_EXTENSION,
};
pub use union::{union_files, union_streams, union_streams_with_policy};
pub use validation::{DataValidator, SchemaReport, SchemaValidator, StreamValidator};
