//! Query cursors
//!
//! A rich query hands back a host-side iterator that must be released.

use crate::error::Result;

/// One key/value pair yielded by a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
}

/// Host-side iterator over query results
pub trait StateQueryIterator: Iterator<Item = Result<KeyValue>> + Send {
    /// Release the host resources held by this iterator
    fn close(&mut self) -> Result<()>;
}

/// Owns a [`StateQueryIterator`] and closes it exactly once.
///
/// `close` reports the host's answer; dropping an unclosed cursor closes it
/// too and logs a failure, so `?` inside the consuming loop never leaks.
pub struct QueryCursor {
    inner: Box<dyn StateQueryIterator>,
    closed: bool,
}

impl QueryCursor {
    pub fn new(inner: Box<dyn StateQueryIterator>) -> Self {
        Self { inner, closed: false }
    }

    /// Close the underlying iterator
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.inner.close()
    }
}

impl Iterator for QueryCursor {
    type Item = Result<KeyValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.closed {
            return None;
        }
        self.inner.next()
    }
}

impl Drop for QueryCursor {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            if let Err(e) = self.inner.close() {
                tracing::warn!("Failed to close query cursor: {}", e);
            }
        }
    }
}
