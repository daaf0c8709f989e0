//! Tests for Engine
//!
//! These tests verify:
//! - Request routing (invoke and ping)
//! - Store capability chosen from the contract variant
//! - Config validation at open
//! - Snapshot persistence across engine restarts
//! - Writes staying invisible until their snapshot is saved
//! - Concurrent writers through the write lock

use std::sync::Arc;
use std::thread;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;
use wallet::config::{ContractConfig, PeerConfig};
use wallet::invocation::Status;
use wallet::memstore::QueryCapability;
use wallet::protocol::Request;
use wallet::record::{FixedClock, Record};
use wallet::{Engine, WalletContract, WalletError};

// =============================================================================
// Helper Functions
// =============================================================================

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn setup_engine(contract: ContractConfig) -> Engine {
    let config = PeerConfig::builder().contract(contract).build();
    Engine::open(config).unwrap()
}

fn setup_engine_with_snapshot(temp: &TempDir) -> Engine {
    let config = PeerConfig::builder()
        .snapshot_path(temp.path().join("world.snap"))
        .contract(ContractConfig::direct_key())
        .build();
    Engine::open(config).unwrap()
}

// =============================================================================
// Routing Tests
// =============================================================================

#[test]
fn test_ping() {
    let engine = setup_engine(ContractConfig::default());
    let response = engine.execute(Request::Ping);

    assert_eq!(response.status, Status::Ok);
    assert_eq!(response.payload, b"PONG".to_vec());
}

#[test]
fn test_invoke_request_routes_to_contract() {
    let engine = setup_engine(ContractConfig::default());

    assert!(engine.execute(Request::invoke("initLedger", Vec::<String>::new())).is_ok());
    let response = engine.execute(Request::invoke("queryRecord", ["李四"]));

    let found: Vec<Record> = serde_json::from_slice(&response.payload).unwrap();
    assert_eq!(found.len(), 2);
}

#[test]
fn test_invalid_function_through_engine() {
    let engine = setup_engine(ContractConfig::default());
    let response = engine.invoke("transfer", vec![]);

    assert_eq!(response.status, Status::Error);
    assert_eq!(engine.stub().len(), 0);
}

#[test]
fn test_capability_follows_query_mode() {
    let rich = setup_engine(ContractConfig::composite_key());
    let key_value = setup_engine(ContractConfig::direct_key());

    assert_eq!(rich.stub().capability(), QueryCapability::Rich);
    assert_eq!(key_value.stub().capability(), QueryCapability::KeyValueOnly);
}

#[test]
fn test_with_contract_uses_given_clock() {
    let clock = FixedClock(Utc.with_ymd_and_hms(2023, 12, 31, 16, 0, 0).unwrap());
    let contract = WalletContract::with_clock(ContractConfig::composite_key(), clock);
    let engine = Engine::with_contract(PeerConfig::default(), contract).unwrap();

    engine.invoke("createRecord", args(&["a", "b", "1", "1"]));
    let found = engine
        .contract()
        .query_by_party(engine.stub(), "a", None, None)
        .unwrap();

    assert_eq!(found[0].transfer_time, "2024-01-01 00:00:00");
}

#[test]
fn test_out_of_range_offset_fails_open() {
    let contract = ContractConfig::builder().utc_offset_secs(Some(30 * 3600)).build();
    let config = PeerConfig::builder().contract(contract).build();

    assert!(matches!(Engine::open(config), Err(WalletError::Config(_))));
}

// =============================================================================
// Snapshot Tests
// =============================================================================

#[test]
fn test_snapshot_survives_restart() {
    let temp = TempDir::new().unwrap();

    {
        let engine = setup_engine_with_snapshot(&temp);
        assert!(engine.invoke("initLedger", vec![]).is_ok());
        assert!(engine
            .invoke("createRecord", args(&["R9", "alice", "bob", "5", "2019-11-01 10:00:00"]))
            .is_ok());
        assert!(engine.snapshot_path().unwrap().exists());
    }

    let engine = setup_engine_with_snapshot(&temp);
    assert_eq!(engine.stub().len(), 4);

    let response = engine.invoke("queryRecord", args(&["R9"]));
    let record = Record::from_json(&response.payload).unwrap();
    assert_eq!(record.receiver, "bob");
}

#[test]
fn test_failed_write_does_not_create_snapshot() {
    let temp = TempDir::new().unwrap();
    let engine = setup_engine_with_snapshot(&temp);

    let response = engine.invoke("createRecord", args(&["only", "two"]));

    assert_eq!(response.status, Status::Error);
    assert!(!temp.path().join("world.snap").exists());
}

#[test]
fn test_unsaved_write_is_not_visible() {
    let temp = TempDir::new().unwrap();
    let config = PeerConfig::builder()
        .snapshot_path(temp.path().join("missing_dir").join("state.snap"))
        .contract(ContractConfig::composite_key())
        .build();
    let engine = Engine::open(config).unwrap();

    let response = engine.invoke("createRecord", args(&["alice", "bob", "50", "1"]));
    assert_eq!(response.status, Status::Error);
    assert_eq!(engine.stub().len(), 0);

    let response = engine.invoke("queryRecord", args(&["alice"]));
    assert!(response.is_ok());
    assert_eq!(response.payload, b"[]".to_vec());
}

#[test]
fn test_write_commits_after_snapshot_saved() {
    let temp = TempDir::new().unwrap();
    let engine = setup_engine_with_snapshot(&temp);

    assert!(engine.invoke("initLedger", vec![]).is_ok());
    assert_eq!(engine.stub().len(), 3);

    // Later failures leave earlier commits alone
    let response = engine.invoke("createRecord", args(&["R9", "", "bob", "5", "2019-11-01 10:00:00"]));
    assert_eq!(response.status, Status::Error);
    assert_eq!(engine.stub().len(), 3);
    assert_eq!(engine.stub().open_cursors(), 0);
}

#[test]
fn test_queries_do_not_touch_snapshot() {
    let temp = TempDir::new().unwrap();
    let engine = setup_engine_with_snapshot(&temp);

    assert!(engine.invoke("queryRecord", args(&["RECORD0"])).is_ok());
    assert!(!temp.path().join("world.snap").exists());
}

#[test]
fn test_corrupt_snapshot_fails_open() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("world.snap"), b"garbage!garbage").unwrap();

    let config = PeerConfig::builder()
        .snapshot_path(temp.path().join("world.snap"))
        .build();

    assert!(Engine::open(config).is_err());
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_writers() {
    let engine = Arc::new(setup_engine(ContractConfig::direct_key()));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for i in 0..25 {
                    let key = format!("T{}-{}", t, i);
                    let response = engine.invoke(
                        "createRecord",
                        args(&[key.as_str(), "alice", "bob", "1", "2020-01-01 00:00:00"]),
                    );
                    assert!(response.is_ok());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(engine.stub().len(), 200);
}
