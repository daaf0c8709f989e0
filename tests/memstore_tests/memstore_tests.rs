//! Tests for MemoryStub
//!
//! These tests verify:
//! - Point reads and writes
//! - Rich query selection, sort, skip and limit
//! - Key-value-only capability
//! - Cursor accounting
//! - Staged copies and commit
//! - Snapshot save/load and corruption detection
//! - Concurrent readers alongside a writer

use std::fs;
use std::sync::Arc;
use std::thread;

use serde_json::json;
use tempfile::TempDir;
use wallet::memstore::{MemoryStub, QueryCapability};
use wallet::stub::{ChaincodeStub, KeyValue, StateQueryIterator};
use wallet::WalletError;

// =============================================================================
// Helper Functions
// =============================================================================

fn put_json(stub: &MemoryStub, key: &str, value: serde_json::Value) {
    stub.put_state(key, value.to_string().as_bytes()).unwrap();
}

fn run_query(stub: &MemoryStub, query: &str) -> Vec<String> {
    let mut iter = stub.get_query_result(query).unwrap();
    let keys = iter
        .by_ref()
        .map(|kv| kv.unwrap().key)
        .collect::<Vec<_>>();
    iter.close().unwrap();
    keys
}

fn seeded_stub() -> MemoryStub {
    let stub = MemoryStub::new();
    put_json(&stub, "a", json!({"sender": "alice", "receiver": "bob", "transfer_time": "2020-01-02 00:00:00"}));
    put_json(&stub, "b", json!({"sender": "bob", "receiver": "carol", "transfer_time": "2020-01-03 00:00:00"}));
    put_json(&stub, "c", json!({"sender": "carol", "receiver": "alice", "transfer_time": "2020-01-01 00:00:00"}));
    stub.put_state("d", b"plain bytes").unwrap();
    stub
}

// =============================================================================
// Point Operations
// =============================================================================

#[test]
fn test_put_get() {
    let stub = MemoryStub::new();

    stub.put_state("hello", b"world").unwrap();

    assert_eq!(stub.get_state("hello").unwrap(), Some(b"world".to_vec()));
    assert_eq!(stub.get_state("missing").unwrap(), None);
}

#[test]
fn test_put_overwrites() {
    let stub = MemoryStub::new();

    stub.put_state("key", b"v1").unwrap();
    stub.put_state("key", b"v2").unwrap();

    assert_eq!(stub.get_state("key").unwrap(), Some(b"v2".to_vec()));
    assert_eq!(stub.len(), 1);
}

#[test]
fn test_put_rejects_empty_key() {
    let stub = MemoryStub::new();
    assert!(matches!(stub.put_state("", b"v"), Err(WalletError::Store(_))));
    assert!(stub.is_empty());
}

#[test]
fn test_create_composite_key() {
    let stub = MemoryStub::new();
    let key = stub.create_composite_key("kind", &["a", "b"]).unwrap();
    assert_eq!(key, "\u{0}kind\u{0}a\u{0}b\u{0}");
}

// =============================================================================
// Rich Queries
// =============================================================================

#[test]
fn test_or_selector_matches_both_roles() {
    let stub = seeded_stub();
    let keys = run_query(
        &stub,
        r#"{"selector":{"$or":[{"sender":"alice"},{"receiver":"alice"}]}}"#,
    );

    assert_eq!(keys, vec!["a", "c"]);
}

#[test]
fn test_sort_descending() {
    let stub = seeded_stub();
    let keys = run_query(
        &stub,
        r#"{"selector":{"$or":[{"sender":"bob"},{"receiver":"bob"},{"sender":"carol"}]},"sort":[{"transfer_time":"desc"}]}"#,
    );

    assert_eq!(keys, vec!["b", "a", "c"]);
}

#[test]
fn test_skip_then_limit() {
    let stub = seeded_stub();
    let all = r#"{"selector":{"$or":[{"sender":"alice"},{"sender":"bob"},{"sender":"carol"}]},"sort":[{"transfer_time":"asc"}]"#;

    assert_eq!(run_query(&stub, &format!("{}}}", all)), vec!["c", "a", "b"]);
    assert_eq!(run_query(&stub, &format!(r#"{},"limit":1,"skip":1}}"#, all)), vec!["a"]);
    assert_eq!(run_query(&stub, &format!(r#"{},"skip":5}}"#, all)), Vec::<String>::new());
}

#[test]
fn test_non_json_values_are_skipped() {
    let stub = seeded_stub();
    let keys = run_query(&stub, r#"{"selector":{}}"#);

    assert_eq!(keys, vec!["a", "b", "c"]);
}

#[test]
fn test_query_returns_stored_values() {
    let stub = MemoryStub::new();
    put_json(&stub, "only", json!({"sender": "x", "receiver": "y"}));

    let mut iter = stub.get_query_result(r#"{"selector":{"sender":"x"}}"#).unwrap();
    let first: KeyValue = iter.next().unwrap().unwrap();
    iter.close().unwrap();

    assert_eq!(first.key, "only");
    assert_eq!(stub.get_state("only").unwrap(), Some(first.value));
}

#[test]
fn test_malformed_query_rejected() {
    let stub = seeded_stub();

    assert!(matches!(stub.get_query_result("not json"), Err(WalletError::Store(_))));
    assert!(matches!(
        stub.get_query_result(r#"{"selector":{"amount":{"$gt":5}}}"#),
        Err(WalletError::UnsupportedQuery(_))
    ));
    assert_eq!(stub.open_cursors(), 0);
}

#[test]
fn test_key_value_only_rejects_rich_queries() {
    let stub = MemoryStub::key_value_only();
    stub.put_state("k", b"{}").unwrap();

    assert_eq!(stub.capability(), QueryCapability::KeyValueOnly);
    assert!(matches!(
        stub.get_query_result(r#"{"selector":{}}"#),
        Err(WalletError::UnsupportedQuery(_))
    ));
    assert_eq!(stub.get_state("k").unwrap(), Some(b"{}".to_vec()));
}

// =============================================================================
// Cursor Accounting
// =============================================================================

#[test]
fn test_open_cursor_tracking() {
    let stub = seeded_stub();

    let mut first = stub.get_query_result(r#"{"selector":{}}"#).unwrap();
    let mut second = stub.get_query_result(r#"{"selector":{}}"#).unwrap();
    assert_eq!(stub.open_cursors(), 2);

    first.close().unwrap();
    first.close().unwrap();
    assert_eq!(stub.open_cursors(), 1);
    assert!(first.next().is_none());

    second.close().unwrap();
    assert_eq!(stub.open_cursors(), 0);
}

// =============================================================================
// Staging Tests
// =============================================================================

#[test]
fn test_staged_writes_hidden_until_commit() {
    let stub = MemoryStub::new();
    stub.put_state("a", b"1").unwrap();

    let staged = stub.staged();
    staged.put_state("b", b"2").unwrap();
    assert_eq!(stub.get_state("b").unwrap(), None);
    assert_eq!(staged.capability(), QueryCapability::Rich);

    stub.commit(staged);
    assert_eq!(stub.keys(), vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn test_dropped_stage_leaves_state_alone() {
    let stub = MemoryStub::key_value_only();
    stub.put_state("a", b"1").unwrap();

    {
        let staged = stub.staged();
        staged.put_state("a", b"changed").unwrap();
    }

    assert_eq!(stub.get_state("a").unwrap(), Some(b"1".to_vec()));
}

// =============================================================================
// Snapshots
// =============================================================================

#[test]
fn test_snapshot_round_trip() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("state.snap");

    let stub = seeded_stub();
    stub.save_snapshot(&path).unwrap();

    let restored = MemoryStub::load_snapshot(&path, QueryCapability::Rich).unwrap();

    assert_eq!(restored.keys(), stub.keys());
    assert_eq!(restored.get_state("d").unwrap(), Some(b"plain bytes".to_vec()));
    assert!(!path.with_extension("tmp").exists());
}

#[test]
fn test_snapshot_of_empty_store() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("empty.snap");

    MemoryStub::new().save_snapshot(&path).unwrap();
    let restored = MemoryStub::load_snapshot(&path, QueryCapability::KeyValueOnly).unwrap();

    assert!(restored.is_empty());
    assert_eq!(restored.capability(), QueryCapability::KeyValueOnly);
}

#[test]
fn test_snapshot_detects_bit_flip() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("state.snap");
    seeded_stub().save_snapshot(&path).unwrap();

    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    fs::write(&path, &bytes).unwrap();

    assert!(matches!(
        MemoryStub::load_snapshot(&path, QueryCapability::Rich),
        Err(WalletError::SnapshotCorruption(_))
    ));
}

#[test]
fn test_snapshot_detects_truncation() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("state.snap");
    seeded_stub().save_snapshot(&path).unwrap();

    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();
    assert!(matches!(
        MemoryStub::load_snapshot(&path, QueryCapability::Rich),
        Err(WalletError::SnapshotCorruption(_))
    ));

    fs::write(&path, &bytes[..4]).unwrap();
    assert!(matches!(
        MemoryStub::load_snapshot(&path, QueryCapability::Rich),
        Err(WalletError::SnapshotCorruption(_))
    ));
}

#[test]
fn test_snapshot_missing_file() {
    let temp = TempDir::new().unwrap();
    let result = MemoryStub::load_snapshot(&temp.path().join("nope"), QueryCapability::Rich);

    assert!(matches!(result, Err(WalletError::Io(_))));
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn test_concurrent_readers_and_writer() {
    let stub = Arc::new(MemoryStub::new());

    let writer = {
        let stub = Arc::clone(&stub);
        thread::spawn(move || {
            for i in 0..200 {
                let value = json!({"sender": "w", "receiver": "r", "transfer_time": format!("{:04}", i)});
                stub.put_state(&format!("k{:04}", i), value.to_string().as_bytes()).unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let stub = Arc::clone(&stub);
            thread::spawn(move || {
                for _ in 0..50 {
                    let mut iter = stub.get_query_result(r#"{"selector":{"sender":"w"}}"#).unwrap();
                    for kv in iter.by_ref() {
                        kv.unwrap();
                    }
                    iter.close().unwrap();
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(stub.len(), 200);
    assert_eq!(stub.open_cursors(), 0);
}
