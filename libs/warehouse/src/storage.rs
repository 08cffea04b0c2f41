//! # Binary Warehouse
//!
//! ## Purpose
//!
//! Filesystem storage for encoded streams. Each stream lives at
//!
//! ```text
//! <root>/<SYMBOL>/<interval>.bin
//! ```
//!
//! where `<interval>` is the canonical label (`60` and `1m` name the same
//! file). Files hold the flat stream zero padded to a whole byte.
//!
//! ## Connection Model
//!
//! A warehouse starts disconnected. [`BinaryWarehouse::initialize`] creates
//! the root if needed and connects; [`Warehouse::connect`] only attaches to
//! an existing directory. Every storage operation requires a connection.

use crate::error::{WarehouseError, WarehouseResult};
use crate::validation::DataValidator;
use codec::{
    format_interval, parse_interval, validate_symbol, CodecError, DecodedStream, OriginalLexical,
    StreamHeader,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use types::BitSequence;

/// File extension of stored streams
pub const STREAM_EXTENSION: &str = "bin";

/// Lifecycle of a warehouse connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
    Failed,
}

impl ConnectionState {
    pub fn is_active(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// A store of candlestick streams, agnostic of the backing medium
pub trait Warehouse {
    /// Whatever the backend needs to attach (a path, a URL)
    type Credentials;

    fn connect(&mut self, credentials: Self::Credentials) -> WarehouseResult<()>;

    fn connection_status(&self) -> ConnectionState;
}

/// Identifies one stored stream
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamKey {
    pub symbol: String,
    /// Canonical interval label
    pub interval: String,
}

impl StreamKey {
    /// Build a key, canonicalizing the interval label
    pub fn new(symbol: impl Into<String>, interval: &str) -> WarehouseResult<Self> {
        let symbol = symbol.into();
        validate_symbol(&symbol)?;
        if symbol == "." || symbol == ".." || symbol.contains(['/', '\\']) {
            return Err(
                CodecError::invalid_symbol(&symbol, "symbol cannot be used as a directory").into(),
            );
        }
        Ok(Self {
            symbol,
            interval: format_interval(parse_interval(interval)?),
        })
    }

    pub fn from_header(header: &StreamHeader) -> WarehouseResult<Self> {
        Self::new(header.symbol.clone(), &header.interval_label())
    }
}

impl std::fmt::Display for StreamKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.symbol, self.interval)
    }
}

/// Read a stream file into bits, padding included
pub fn read_stream_file(path: &Path) -> WarehouseResult<BitSequence> {
    let bytes = fs::read(path).map_err(|e| WarehouseError::io(path, e))?;
    Ok(BitSequence::from_byte_slice(&bytes))
}

/// Write a stream to a file, zero padded to a whole byte
pub fn write_stream_file(path: &Path, bits: &BitSequence) -> WarehouseResult<()> {
    fs::write(path, bits.as_bytes()).map_err(|e| WarehouseError::io(path, e))?;
    debug!("Wrote {} bits to {:?}", bits.len(), path);
    Ok(())
}

/// Filesystem warehouse of lexical streams
#[derive(Debug, Default)]
pub struct BinaryWarehouse {
    root: Option<PathBuf>,
    state: ConnectionState,
}

impl BinaryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the root directory if it is missing, then connect to it
    pub fn initialize(&mut self, root: impl AsRef<Path>) -> WarehouseResult<()> {
        let root = root.as_ref();
        if root.is_dir() {
            debug!("Found existing warehouse root {:?}", root);
        } else if root.exists() {
            self.state = ConnectionState::Failed;
            return Err(WarehouseError::schema(root, "root exists and is not a directory"));
        } else {
            fs::create_dir_all(root).map_err(|e| WarehouseError::io(root, e))?;
            info!("Created warehouse root {:?}", root);
        }
        self.connect(root.to_path_buf())
    }

    pub fn root(&self) -> WarehouseResult<&Path> {
        match (&self.root, self.state) {
            (Some(root), ConnectionState::Connected) => Ok(root),
            _ => Err(WarehouseError::NotConnected),
        }
    }

    /// Location of a stream, whether or not it exists yet
    pub fn stream_path(&self, key: &StreamKey) -> WarehouseResult<PathBuf> {
        Ok(self
            .root()?
            .join(&key.symbol)
            .join(format!("{}.{STREAM_EXTENSION}", key.interval)))
    }

    /// Validate and persist a flat stream, replacing any previous file for
    /// the same symbol and interval
    pub fn store(&self, bits: &BitSequence) -> WarehouseResult<StreamKey> {
        self.validate_data(bits)?;
        let (header, _) = StreamHeader::parse(bits)?;
        let key = StreamKey::from_header(&header)?;
        let path = self.stream_path(&key)?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| WarehouseError::io(dir, e))?;
        }
        write_stream_file(&path, bits)?;
        info!("Stored {} records as {}", header.data_count, key);
        Ok(key)
    }

    /// Raw bits of a stored stream
    pub fn load_bits(&self, key: &StreamKey) -> WarehouseResult<BitSequence> {
        read_stream_file(&self.stream_path(key)?)
    }

    pub fn load(&self, key: &StreamKey) -> WarehouseResult<DecodedStream> {
        let bits = self.load_bits(key)?;
        Ok(OriginalLexical::refined_data_flat(&bits)?)
    }

    /// Decode `quantity` records starting at index `from`
    pub fn load_range(
        &self,
        key: &StreamKey,
        from: usize,
        quantity: usize,
    ) -> WarehouseResult<DecodedStream> {
        let bits = self.load_bits(key)?;
        Ok(OriginalLexical::refined_data_range(&bits, from, quantity)?)
    }

    /// Headers of a stored stream without decoding any record
    pub fn load_header(&self, key: &StreamKey) -> WarehouseResult<StreamHeader> {
        let bits = self.load_bits(key)?;
        Ok(StreamHeader::parse(&bits)?.0)
    }

    /// Every stream under the root, sorted by symbol then interval.
    /// Entries that do not follow the layout are skipped.
    pub fn list(&self) -> WarehouseResult<Vec<StreamKey>> {
        let root = self.root()?;
        let mut keys = Vec::new();
        for symbol_dir in read_dir(root)? {
            if !symbol_dir.is_dir() {
                continue;
            }
            let Some(symbol) = symbol_dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            for file in read_dir(&symbol_dir)? {
                if file.extension().and_then(|e| e.to_str()) != Some(STREAM_EXTENSION) {
                    continue;
                }
                let Some(interval) = file.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                match StreamKey::new(symbol, interval) {
                    Ok(key) => keys.push(key),
                    Err(e) => warn!("Skipping {:?}: {}", file, e),
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

fn read_dir(dir: &Path) -> WarehouseResult<Vec<PathBuf>> {
    fs::read_dir(dir)
        .and_then(|entries| entries.map(|e| e.map(|e| e.path())).collect())
        .map_err(|e| WarehouseError::io(dir, e))
}

impl Warehouse for BinaryWarehouse {
    type Credentials = PathBuf;

    fn connect(&mut self, root: PathBuf) -> WarehouseResult<()> {
        if !root.is_dir() {
            self.state = ConnectionState::Failed;
            return Err(WarehouseError::schema(&root, "warehouse root is not a directory"));
        }
        info!("Connected to warehouse {:?}", root);
        self.root = Some(root);
        self.state = ConnectionState::Connected;
        Ok(())
    }

    fn connection_status(&self) -> ConnectionState {
        self.state
    }
}
