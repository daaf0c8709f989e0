//! Invocation definitions
//!
//! Parses and validates a named call into an [`Invocation`].

use std::fmt;
use std::str::FromStr;

use crate::config::{ContractConfig, KeyStrategy, QueryMode};
use crate::error::{Result, WalletError};
use crate::record::{is_transfer_time, Amount, TransferType};

/// Contract functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    InitLedger,
    CreateRecord,
    QueryRecord,
}

impl Function {
    /// Name used on the invocation boundary
    pub fn name(&self) -> &'static str {
        match self {
            Function::InitLedger => "initLedger",
            Function::CreateRecord => "createRecord",
            Function::QueryRecord => "queryRecord",
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Function {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "initLedger" => Ok(Function::InitLedger),
            "createRecord" => Ok(Function::CreateRecord),
            "queryRecord" => Ok(Function::QueryRecord),
            other => Err(WalletError::InvalidFunction(other.to_string())),
        }
    }
}

/// Validated arguments of `createRecord`
#[derive(Debug, Clone, PartialEq)]
pub enum CreateArgs {
    /// Stored under the caller's key with the caller's timestamp
    Direct {
        key: String,
        sender: String,
        receiver: String,
        amount: Amount,
        transfer_time: String,
    },

    /// Stored under a composite key, stamped with the current time
    Composite {
        sender: String,
        receiver: String,
        amount: Amount,
        transfer_type: TransferType,
    },
}

/// Validated arguments of `queryRecord`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryArgs {
    /// Return the raw value stored under this key
    Key(String),

    /// Records where `party` is sender or receiver
    Party {
        party: String,
        limit: Option<u64>,
        skip: Option<u64>,
    },
}

/// A parsed, arity-checked contract call
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    InitLedger,
    CreateRecord(CreateArgs),
    QueryRecord(QueryArgs),
}

impl Invocation {
    /// Parse `(function, args)` for the contract variant described by `config`
    pub fn parse(function: &str, args: Vec<String>, config: &ContractConfig) -> Result<Self> {
        match function.parse::<Function>()? {
            Function::InitLedger => {
                expect_arity(Function::InitLedger, &args, 0, 0)?;
                Ok(Invocation::InitLedger)
            }
            Function::CreateRecord => parse_create(args, config).map(Invocation::CreateRecord),
            Function::QueryRecord => parse_query(args, config).map(Invocation::QueryRecord),
        }
    }
}

fn parse_create(args: Vec<String>, config: &ContractConfig) -> Result<CreateArgs> {
    match config.key_strategy {
        KeyStrategy::Direct => {
            expect_arity(Function::CreateRecord, &args, 5, 5)?;
            let [key, sender, receiver, amount, transfer_time]: [String; 5] = into_array(args)?;

            if key.is_empty() {
                return Err(WalletError::InvalidArgument("key must not be empty".to_string()));
            }
            require_party("sender", &sender)?;
            require_party("receiver", &receiver)?;
            if !is_transfer_time(&transfer_time) {
                return Err(WalletError::InvalidArgument(format!(
                    "transfer time must be YYYY-MM-DD HH:MM:SS, got {:?}",
                    transfer_time
                )));
            }

            Ok(CreateArgs::Direct {
                key,
                sender,
                receiver,
                amount: Amount::parse(&amount, config.amount_encoding)?,
                transfer_time,
            })
        }
        KeyStrategy::Composite(_) => {
            expect_arity(Function::CreateRecord, &args, 4, 4)?;
            let [sender, receiver, amount, transfer_type]: [String; 4] = into_array(args)?;

            require_party("sender", &sender)?;
            require_party("receiver", &receiver)?;

            Ok(CreateArgs::Composite {
                sender,
                receiver,
                amount: Amount::parse(&amount, config.amount_encoding)?,
                transfer_type: TransferType::parse(&transfer_type, config.type_encoding)?,
            })
        }
    }
}

fn parse_query(args: Vec<String>, config: &ContractConfig) -> Result<QueryArgs> {
    match config.query_mode {
        QueryMode::KeyLookup => {
            expect_arity(Function::QueryRecord, &args, 1, 1)?;
            let [key]: [String; 1] = into_array(args)?;
            Ok(QueryArgs::Key(key))
        }
        QueryMode::Rich => {
            expect_arity(Function::QueryRecord, &args, 1, 3)?;
            let mut args = args.into_iter();
            let party = args.next().unwrap_or_default();
            require_party("party", &party)?;

            let limit = args.next().map(|raw| parse_count("limit", &raw)).transpose()?;
            let skip = args.next().map(|raw| parse_count("skip", &raw)).transpose()?;

            Ok(QueryArgs::Party { party, limit, skip })
        }
    }
}

fn expect_arity(function: Function, args: &[String], min: usize, max: usize) -> Result<()> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{} to {}", min, max)
        };
        return Err(WalletError::Arity {
            function: function.name(),
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn into_array<const N: usize>(args: Vec<String>) -> Result<[String; N]> {
    args.try_into().map_err(|args: Vec<String>| {
        WalletError::InvalidArgument(format!("expected {} arguments, got {}", N, args.len()))
    })
}

fn require_party(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(WalletError::InvalidArgument(format!("{} must not be empty", name)));
    }
    Ok(())
}

fn parse_count(name: &str, raw: &str) -> Result<u64> {
    raw.trim().parse().map_err(|_| {
        WalletError::InvalidArgument(format!("{} must be a non-negative integer, got {:?}", name, raw))
    })
}
