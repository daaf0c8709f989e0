//! Contract Module
//!
//! The record store facade: maps the three contract functions onto the
//! host's state operations.
//!
//! ## Responsibilities
//! - Seed the ledger with sample transfers
//! - Create transfer records under direct or composite keys
//! - Answer key lookups and party queries
//! - Turn every failure into an error response
//!
//! The contract holds no mutable state. Each call gets the host store
//! passed in and runs to completion synchronously.

use crate::config::{CompositeSchema, ContractConfig, KeyStrategy};
use crate::error::Result;
use crate::invocation::{CreateArgs, Invocation, QueryArgs, Response};
use crate::query::RichQuery;
use crate::record::{format_transfer_time, Amount, Clock, Record, SystemClock, TransferType};
use crate::stub::{ChaincodeStub, QueryCursor};

/// Prefix of the keys written by `initLedger` in the direct-key variant
pub const SEED_KEY_PREFIX: &str = "RECORD";

/// The wallet contract
pub struct WalletContract {
    /// Variant knobs
    config: ContractConfig,

    /// Wall clock for generated timestamps
    clock: Box<dyn Clock>,
}

impl WalletContract {
    /// Create a contract that stamps records with the system clock
    pub fn new(config: ContractConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }

    /// Create a contract with a custom clock
    pub fn with_clock(config: ContractConfig, clock: impl Clock + 'static) -> Self {
        Self {
            config,
            clock: Box::new(clock),
        }
    }

    /// Handle one call from the invocation boundary
    ///
    /// Never fails: errors come back as an error response.
    pub fn invoke(&self, stub: &dyn ChaincodeStub, function: &str, args: Vec<String>) -> Response {
        tracing::debug!("Invoking {} with {} args", function, args.len());

        let result = Invocation::parse(function, args, &self.config)
            .and_then(|invocation| self.execute(stub, invocation));

        match result {
            Ok(payload) => Response::ok(payload),
            Err(e) => {
                tracing::warn!("{} failed: {}", function, e);
                Response::error(e.to_string())
            }
        }
    }

    /// Execute a parsed invocation
    ///
    /// Routes to the appropriate handler
    pub fn execute(&self, stub: &dyn ChaincodeStub, invocation: Invocation) -> Result<Vec<u8>> {
        match invocation {
            Invocation::InitLedger => {
                self.init_ledger(stub)?;
                Ok(Vec::new())
            }
            Invocation::CreateRecord(args) => {
                self.create_record(stub, args)?;
                Ok(Vec::new())
            }
            Invocation::QueryRecord(args) => self.query_record(stub, args),
        }
    }

    /// Write the sample transfers
    ///
    /// Not idempotent: a second call rewrites the same keys.
    pub fn init_ledger(&self, stub: &dyn ChaincodeStub) -> Result<()> {
        let seeds = self.seed_records()?;

        for (index, record) in seeds.iter().enumerate() {
            let key = match self.config.key_strategy {
                KeyStrategy::Direct => format!("{}{}", SEED_KEY_PREFIX, index),
                KeyStrategy::Composite(schema) => composite_key(stub, schema, record)?,
            };
            stub.put_state(&key, &record.to_json()?)?;
            tracing::debug!("Added seed record {}: {} -> {}", index, record.sender, record.receiver);
        }

        Ok(())
    }

    /// Persist one transfer
    pub fn create_record(&self, stub: &dyn ChaincodeStub, args: CreateArgs) -> Result<()> {
        let (key, record) = match args {
            CreateArgs::Direct {
                key,
                sender,
                receiver,
                amount,
                transfer_time,
            } => {
                let record = Record::new(sender, receiver, amount, transfer_time, None)?;
                (key, record)
            }
            CreateArgs::Composite {
                sender,
                receiver,
                amount,
                transfer_type,
            } => {
                let transfer_time =
                    format_transfer_time(self.clock.now(), self.config.utc_offset_secs)?;
                let record =
                    Record::new(sender, receiver, amount, transfer_time, Some(transfer_type))?;
                let schema = match self.config.key_strategy {
                    KeyStrategy::Composite(schema) => schema,
                    KeyStrategy::Direct => CompositeSchema::Full,
                };
                (composite_key(stub, schema, &record)?, record)
            }
        };

        stub.put_state(&key, &record.to_json()?)?;
        tracing::debug!(
            "Created record {} -> {} at {}",
            record.sender,
            record.receiver,
            record.transfer_time
        );

        Ok(())
    }

    /// Look up a key or query by party
    ///
    /// A key that was never written yields an empty payload, not an error.
    pub fn query_record(&self, stub: &dyn ChaincodeStub, args: QueryArgs) -> Result<Vec<u8>> {
        match args {
            QueryArgs::Key(key) => Ok(stub.get_state(&key)?.unwrap_or_default()),
            QueryArgs::Party { party, limit, skip } => {
                let records = self.query_by_party(stub, &party, limit, skip)?;
                Ok(serde_json::to_vec(&records)?)
            }
        }
    }

    /// Records sent or received by `party`, in the order the host returns them
    pub fn query_by_party(
        &self,
        stub: &dyn ChaincodeStub,
        party: &str,
        limit: Option<u64>,
        skip: Option<u64>,
    ) -> Result<Vec<Record>> {
        let limit = limit.unwrap_or(self.config.default_query_limit);
        let query = RichQuery::by_party(party, limit, skip).to_json()?;

        let mut cursor = QueryCursor::new(stub.get_query_result(&query)?);
        let mut records = Vec::new();
        for item in &mut cursor {
            let entry = item?;
            records.push(Record::from_json(&entry.value)?);
        }
        cursor.close()?;

        tracing::debug!("Query for {} returned {} records", party, records.len());
        Ok(records)
    }

    /// Get the configuration
    pub fn config(&self) -> &ContractConfig {
        &self.config
    }

    fn seed_records(&self) -> Result<Vec<Record>> {
        let amount = |raw: &str| Amount::parse(raw, self.config.amount_encoding);

        match self.config.key_strategy {
            KeyStrategy::Direct => {
                let time = "2019-10-31 00:00:00";
                Ok(vec![
                    Record::new("李四", "张三", amount("100")?, time, None)?,
                    Record::new("李四", "赵五", amount("10")?, time, None)?,
                    Record::new("张三", "李四", amount("100")?, time, None)?,
                ])
            }
            KeyStrategy::Composite(_) => {
                let kind = || TransferType::parse("1", self.config.type_encoding);
                Ok(vec![
                    Record::new("李四", "赵五", amount("10")?, "2019-01-29 12:57:51", Some(kind()?))?,
                    Record::new("赵五", "李四", amount("30")?, "2019-01-29 18:31:11", Some(kind()?))?,
                ])
            }
        }
    }
}

/// Composite key of `record` under `schema`
fn composite_key(stub: &dyn ChaincodeStub, schema: CompositeSchema, record: &Record) -> Result<String> {
    match schema {
        CompositeSchema::Full => {
            let amount = record.transfer_amount.to_string();
            let transfer_type = record
                .transfer_type
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            stub.create_composite_key(
                schema.name(),
                &[
                    record.sender.as_str(),
                    record.receiver.as_str(),
                    record.transfer_time.as_str(),
                    amount.as_str(),
                    transfer_type.as_str(),
                ],
            )
        }
        CompositeSchema::Short => stub.create_composite_key(
            schema.name(),
            &[
                record.sender.as_str(),
                record.receiver.as_str(),
                record.transfer_time.as_str(),
            ],
        ),
    }
}
