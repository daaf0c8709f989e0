//! MemoryStub implementation
//!
//! BTreeMap-based world state with RwLock for concurrency.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use super::QueryCapability;
use crate::error::{Result, WalletError};
use crate::query::RichQuery;
use crate::stub::{compose_key, ChaincodeStub, KeyValue, StateQueryIterator};

/// In-process world state
///
/// ## Concurrency:
/// - `data`: Protected by RwLock (many concurrent readers, exclusive writer)
/// - `open_cursors`: Atomic counter shared with every live iterator
/// - All methods use `&self`
pub struct MemoryStub {
    /// Key → raw value, in key order
    pub(super) data: RwLock<BTreeMap<String, Vec<u8>>>,

    /// Whether rich queries are accepted
    capability: QueryCapability,

    /// Iterators handed out and not yet closed
    open_cursors: Arc<AtomicUsize>,
}

impl MemoryStub {
    /// Create an empty store that answers rich queries
    pub fn new() -> Self {
        Self::with_capability(QueryCapability::Rich)
    }

    /// Create an empty store that only supports key lookups
    pub fn key_value_only() -> Self {
        Self::with_capability(QueryCapability::KeyValueOnly)
    }

    pub fn with_capability(capability: QueryCapability) -> Self {
        Self::from_entries(BTreeMap::new(), capability)
    }

    pub(super) fn from_entries(data: BTreeMap<String, Vec<u8>>, capability: QueryCapability) -> Self {
        Self {
            data: RwLock::new(data),
            capability,
            open_cursors: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn capability(&self) -> QueryCapability {
        self.capability
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// All keys in order
    pub fn keys(&self) -> Vec<String> {
        self.data.read().keys().cloned().collect()
    }

    /// Query iterators that have not been closed
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }

    /// Copy of the current state that writes can be staged on
    ///
    /// Changes to the copy stay invisible here until [`MemoryStub::commit`].
    pub fn staged(&self) -> Self {
        Self::from_entries(self.data.read().clone(), self.capability)
    }

    /// Replace the current state with a staged copy
    pub fn commit(&self, staged: MemoryStub) {
        *self.data.write() = staged.data.into_inner();
    }
}

impl Default for MemoryStub {
    fn default() -> Self {
        Self::new()
    }
}

impl ChaincodeStub for MemoryStub {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn put_state(&self, key: &str, value: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(WalletError::Store("key must not be empty".to_string()));
        }
        self.data.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get_query_result(&self, query: &str) -> Result<Box<dyn StateQueryIterator>> {
        if self.capability == QueryCapability::KeyValueOnly {
            return Err(WalletError::UnsupportedQuery(
                "rich queries need a query-capable state database".to_string(),
            ));
        }

        let query = RichQuery::from_json(query)
            .map_err(|e| WalletError::Store(format!("invalid query: {}", e)))?;
        query.validate()?;

        // Stable sort: ties keep key order
        let mut matched: Vec<(KeyValue, Value)> = self
            .data
            .read()
            .iter()
            .filter_map(|(key, value)| {
                let doc: Value = serde_json::from_slice(value).ok()?;
                if !doc.is_object() || !query.matches(&doc) {
                    return None;
                }
                Some((KeyValue { key: key.clone(), value: value.clone() }, doc))
            })
            .collect();
        matched.sort_by(|a, b| query.compare(&a.1, &b.1));

        let skip = query.skip.map_or(0, |s| usize::try_from(s).unwrap_or(usize::MAX));
        let limit = query.limit.map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
        let results: Vec<KeyValue> = matched
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|(kv, _)| kv)
            .collect();

        tracing::trace!("Rich query matched {} entries", results.len());

        self.open_cursors.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryQueryIterator {
            results: results.into_iter(),
            open_cursors: Arc::clone(&self.open_cursors),
            closed: false,
        }))
    }

    fn create_composite_key(&self, object_type: &str, attributes: &[&str]) -> Result<String> {
        compose_key(object_type, attributes)
    }
}

/// Iterator over materialized query results
struct MemoryQueryIterator {
    results: std::vec::IntoIter<KeyValue>,
    open_cursors: Arc<AtomicUsize>,
    closed: bool,
}

impl Iterator for MemoryQueryIterator {
    type Item = Result<KeyValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.closed {
            return None;
        }
        self.results.next().map(Ok)
    }
}

impl StateQueryIterator for MemoryQueryIterator {
    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.open_cursors.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
