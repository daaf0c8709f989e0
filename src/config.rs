//! Configuration for the wallet contract and the development peer
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use chrono::FixedOffset;

use crate::error::{Result, WalletError};

/// How the storage key of a new record is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStrategy {
    /// The caller passes the key as the first argument of `createRecord`
    Direct,

    /// The key is a composite key built from the record's own fields
    Composite(CompositeSchema),
}

/// Named composite-key schemas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeSchema {
    /// `sender~receiver~time~amount~type`
    Full,

    /// `sender~receiver~transfer_time`
    Short,
}

impl CompositeSchema {
    /// The object type the composite key is filed under
    pub fn name(&self) -> &'static str {
        match self {
            CompositeSchema::Full => "sender~receiver~time~amount~type",
            CompositeSchema::Short => "sender~receiver~transfer_time",
        }
    }
}

/// JSON encoding of `transfer_amount`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountEncoding {
    /// Stored verbatim as a decimal string
    DecimalString,

    /// Parsed and stored as a JSON number
    Float,
}

/// JSON encoding of `transfer_type`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeEncoding {
    /// Stored verbatim as a string code
    Text,

    /// Parsed and stored as an integer code
    Integer,
}

/// Which shape `queryRecord` takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// One argument, the literal key; returns the raw stored bytes
    KeyLookup,

    /// Party identifier with optional limit and skip; runs a rich query
    Rich,
}

/// Configuration of one contract variant
#[derive(Debug, Clone)]
pub struct ContractConfig {
    pub key_strategy: KeyStrategy,

    pub amount_encoding: AmountEncoding,

    pub type_encoding: TypeEncoding,

    pub query_mode: QueryMode,

    /// Limit applied to rich queries when the caller passes none
    pub default_query_limit: u64,

    /// Fixed offset (seconds east of UTC) for generated timestamps.
    /// `None` stamps records in UTC.
    pub utc_offset_secs: Option<i32>,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self::composite_key()
    }
}

impl ContractConfig {
    /// Caller-supplied keys, 5-argument `createRecord`, single-key lookups
    pub fn direct_key() -> Self {
        Self {
            key_strategy: KeyStrategy::Direct,
            amount_encoding: AmountEncoding::DecimalString,
            type_encoding: TypeEncoding::Text,
            query_mode: QueryMode::KeyLookup,
            default_query_limit: 100,
            utc_offset_secs: Some(8 * 3600),
        }
    }

    /// Composite keys, 4-argument `createRecord`, rich party queries
    pub fn composite_key() -> Self {
        Self {
            key_strategy: KeyStrategy::Composite(CompositeSchema::Full),
            amount_encoding: AmountEncoding::DecimalString,
            type_encoding: TypeEncoding::Text,
            query_mode: QueryMode::Rich,
            default_query_limit: 100,
            utc_offset_secs: Some(8 * 3600),
        }
    }

    /// Create a new config builder starting from the default variant
    pub fn builder() -> ContractConfigBuilder {
        ContractConfigBuilder::default()
    }

    /// Check the knobs that would otherwise only fail on first use
    pub fn validate(&self) -> Result<()> {
        if let Some(secs) = self.utc_offset_secs {
            if FixedOffset::east_opt(secs).is_none() {
                return Err(WalletError::Config(format!("UTC offset out of range: {}s", secs)));
            }
        }
        Ok(())
    }
}

/// Offset in seconds for a whole number of hours east of UTC
pub fn offset_from_hours(hours: i32) -> Result<i32> {
    hours
        .checked_mul(3600)
        .filter(|secs| FixedOffset::east_opt(*secs).is_some())
        .ok_or_else(|| WalletError::Config(format!("UTC offset out of range: {}h", hours)))
}

/// Builder for ContractConfig
#[derive(Default)]
pub struct ContractConfigBuilder {
    config: ContractConfig,
}

impl ContractConfigBuilder {
    /// Start from an existing config (usually a preset)
    pub fn from_config(config: ContractConfig) -> Self {
        Self { config }
    }

    pub fn key_strategy(mut self, strategy: KeyStrategy) -> Self {
        self.config.key_strategy = strategy;
        self
    }

    pub fn amount_encoding(mut self, encoding: AmountEncoding) -> Self {
        self.config.amount_encoding = encoding;
        self
    }

    pub fn type_encoding(mut self, encoding: TypeEncoding) -> Self {
        self.config.type_encoding = encoding;
        self
    }

    pub fn query_mode(mut self, mode: QueryMode) -> Self {
        self.config.query_mode = mode;
        self
    }

    pub fn default_query_limit(mut self, limit: u64) -> Self {
        self.config.default_query_limit = limit;
        self
    }

    /// Set the timestamp offset in seconds east of UTC (`None` for UTC)
    pub fn utc_offset_secs(mut self, offset: Option<i32>) -> Self {
        self.config.utc_offset_secs = offset;
        self
    }

    pub fn build(self) -> ContractConfig {
        self.config
    }
}

/// Configuration of the local development peer
#[derive(Debug, Clone)]
pub struct PeerConfig {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Number of worker threads serving connections
    pub worker_threads: usize,

    /// Connection read timeout (milliseconds, 0 disables)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 disables)
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Snapshot file loaded at start and rewritten after every write
    pub snapshot_path: Option<PathBuf>,

    // -------------------------------------------------------------------------
    // Contract Configuration
    // -------------------------------------------------------------------------
    pub contract: ContractConfig,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:7051".to_string(),
            worker_threads: 4,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
            snapshot_path: None,
            contract: ContractConfig::default(),
        }
    }
}

impl PeerConfig {
    /// Create a new config builder
    pub fn builder() -> PeerConfigBuilder {
        PeerConfigBuilder::default()
    }
}

/// Builder for PeerConfig
#[derive(Default)]
pub struct PeerConfigBuilder {
    config: PeerConfig,
}

impl PeerConfigBuilder {
    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the number of connection workers
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.config.worker_threads = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the snapshot file
    pub fn snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.snapshot_path = Some(path.into());
        self
    }

    /// Set the hosted contract's configuration
    pub fn contract(mut self, contract: ContractConfig) -> Self {
        self.config.contract = contract;
        self
    }

    pub fn build(self) -> PeerConfig {
        self.config
    }
}
