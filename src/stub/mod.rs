//! Host Store Module
//!
//! The capability a peer runtime injects into the contract.
//!
//! ## Responsibilities
//! - Point reads and writes of world state
//! - Rich (JSON predicate) queries returning a cursor
//! - Composite key construction
//!
//! The contract never owns durability, replication or commit; it only
//! consumes this trait. `MemoryStub` in `crate::memstore` is the in-process
//! implementation used by tests and the development peer.

mod composite;
mod cursor;

pub use composite::{compose_key, split_composite_key, COMPOSITE_KEY_NAMESPACE};
pub use cursor::{KeyValue, QueryCursor, StateQueryIterator};

use crate::error::Result;

/// World-state operations offered by the host
pub trait ChaincodeStub: Send + Sync {
    /// Read the value stored under `key` (`None` when absent)
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write `value` under `key`
    fn put_state(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Execute a rich query and return a cursor over the matches.
    ///
    /// The caller must close the returned iterator; wrap it in a
    /// [`QueryCursor`] to have that happen on every exit path.
    fn get_query_result(&self, query: &str) -> Result<Box<dyn StateQueryIterator>>;

    /// Build a composite key for `object_type` from `attributes`
    fn create_composite_key(&self, object_type: &str, attributes: &[&str]) -> Result<String>;
}

impl<T: ChaincodeStub + ?Sized> ChaincodeStub for std::sync::Arc<T> {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get_state(key)
    }

    fn put_state(&self, key: &str, value: &[u8]) -> Result<()> {
        (**self).put_state(key, value)
    }

    fn get_query_result(&self, query: &str) -> Result<Box<dyn StateQueryIterator>> {
        (**self).get_query_result(query)
    }

    fn create_composite_key(&self, object_type: &str, attributes: &[&str]) -> Result<String> {
        (**self).create_composite_key(object_type, attributes)
    }
}
