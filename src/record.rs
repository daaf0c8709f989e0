//! Record definitions
//!
//! The transfer record persisted by the contract, plus the helpers that
//! stamp and validate its `transfer_time`.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{AmountEncoding, TypeEncoding};
use crate::error::{Result, WalletError};

/// Tag stored in `object_type` on every record
pub const OBJECT_TYPE: &str = "record";

/// Layout of `transfer_time`
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A money-transfer event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Record kind within the shared keyspace (always `"record"`)
    pub object_type: String,

    /// Paying party
    pub sender: String,

    /// Receiving party
    pub receiver: String,

    pub transfer_amount: Amount,

    /// `YYYY-MM-DD HH:MM:SS`
    pub transfer_time: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_type: Option<TransferType>,
}

impl Record {
    /// Build a record, rejecting an empty sender or receiver
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        transfer_amount: Amount,
        transfer_time: impl Into<String>,
        transfer_type: Option<TransferType>,
    ) -> Result<Self> {
        let record = Self {
            object_type: OBJECT_TYPE.to_string(),
            sender: sender.into(),
            receiver: receiver.into(),
            transfer_amount,
            transfer_time: transfer_time.into(),
            transfer_type,
        };
        record.validate()?;
        Ok(record)
    }

    /// Check the invariants every persisted record must satisfy
    pub fn validate(&self) -> Result<()> {
        if self.sender.is_empty() {
            return Err(WalletError::InvalidArgument("sender must not be empty".to_string()));
        }
        if self.receiver.is_empty() {
            return Err(WalletError::InvalidArgument("receiver must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Transfer amount, either the caller's decimal string or a parsed number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Decimal(String),
    Float(f64),
}

impl Amount {
    /// Parse a caller argument under the given encoding
    pub fn parse(raw: &str, encoding: AmountEncoding) -> Result<Self> {
        match encoding {
            AmountEncoding::DecimalString => Ok(Amount::Decimal(raw.to_string())),
            AmountEncoding::Float => {
                let value: f64 = raw.trim().parse().map_err(|_| {
                    WalletError::InvalidArgument(format!("amount is not a number: {:?}", raw))
                })?;
                if !value.is_finite() {
                    return Err(WalletError::InvalidArgument(format!(
                        "amount must be finite: {:?}",
                        raw
                    )));
                }
                Ok(Amount::Float(value))
            }
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Decimal(s) => f.write_str(s),
            Amount::Float(v) => write!(f, "{}", v),
        }
    }
}

/// Transfer classification code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransferType {
    Code(i64),
    Text(String),
}

impl TransferType {
    /// Parse a caller argument under the given encoding
    pub fn parse(raw: &str, encoding: TypeEncoding) -> Result<Self> {
        match encoding {
            TypeEncoding::Text => Ok(TransferType::Text(raw.to_string())),
            TypeEncoding::Integer => raw.trim().parse().map(TransferType::Code).map_err(|_| {
                WalletError::InvalidArgument(format!("transfer type is not an integer: {:?}", raw))
            }),
        }
    }
}

impl fmt::Display for TransferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferType::Code(c) => write!(f, "{}", c),
            TransferType::Text(s) => f.write_str(s),
        }
    }
}

// =============================================================================
// Time
// =============================================================================

/// Source of wall-clock time for generated timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Format an instant as `YYYY-MM-DD HH:MM:SS` in a fixed offset (UTC when `None`)
pub fn format_transfer_time(instant: DateTime<Utc>, utc_offset_secs: Option<i32>) -> Result<String> {
    let secs = utc_offset_secs.unwrap_or(0);
    let offset = FixedOffset::east_opt(secs)
        .ok_or_else(|| WalletError::Config(format!("UTC offset out of range: {}s", secs)))?;
    Ok(instant.with_timezone(&offset).format(TIME_FORMAT).to_string())
}

/// Whether `raw` is a well-formed `transfer_time`
pub fn is_transfer_time(raw: &str) -> bool {
    NaiveDateTime::parse_from_str(raw, TIME_FORMAT).is_ok()
}
