//! In-Memory Host Module
//!
//! A `ChaincodeStub` that keeps world state in process.
//!
//! ## Responsibilities
//! - Point reads and writes over an ordered map
//! - Rich query evaluation (selector, sort, skip, limit)
//! - Tracking of open query cursors
//! - Snapshot files for the development peer
//!
//! ## Data Structure Choice
//! BTreeMap wrapped in RwLock:
//! - Ordered keys give a stable iteration order for query ties
//! - Many concurrent readers, one writer

mod snapshot;
mod store;

pub use store::MemoryStub;

/// What kind of queries the backing state database can answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryCapability {
    /// Only key lookups; rich queries are rejected
    KeyValueOnly,

    /// Key lookups and JSON predicate queries
    Rich,
}
