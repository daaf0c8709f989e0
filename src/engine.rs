//! Engine Module
//!
//! Hosts one wallet contract over an in-memory world state for the
//! development peer.
//!
//! ## Responsibilities
//! - Load the world state from a snapshot on startup
//! - Route requests to the contract
//! - Serialize state-changing invocations
//! - Rewrite the snapshot after every successful write

use std::path::Path;
use std::sync::Mutex;

use crate::config::{PeerConfig, QueryMode};
use crate::contract::WalletContract;
use crate::error::{Result, WalletError};
use crate::invocation::{Function, Response};
use crate::memstore::{MemoryStub, QueryCapability};
use crate::protocol::Request;

/// The development peer's engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (`initLedger`, `createRecord`): Serialized by `write_lock`,
///   which also covers the snapshot rewrite that follows them. With a
///   snapshot configured they run on a staged copy of the world state that
///   is committed only after the snapshot is saved
/// - **Reads** (`queryRecord`): No write_lock needed; the world state uses an
///   internal RwLock
pub struct Engine {
    /// Peer configuration
    config: PeerConfig,

    /// The hosted contract
    contract: WalletContract,

    /// World state
    stub: MemoryStub,

    /// Serializes write invocations
    write_lock: Mutex<()>,
}

impl Engine {
    /// Open an engine with the given config
    ///
    /// On startup:
    /// 1. Reject a contract config that could never serve a write
    /// 2. Pick the store capability matching the contract's query mode
    /// 3. Load the snapshot if one is configured and present
    /// 4. Ready to serve requests
    pub fn open(config: PeerConfig) -> Result<Self> {
        let contract = WalletContract::new(config.contract.clone());
        Self::with_contract(config, contract)
    }

    /// Open with an explicitly built contract (custom clock)
    pub fn with_contract(config: PeerConfig, contract: WalletContract) -> Result<Self> {
        contract.config().validate()?;

        let capability = match contract.config().query_mode {
            QueryMode::Rich => QueryCapability::Rich,
            QueryMode::KeyLookup => QueryCapability::KeyValueOnly,
        };

        let stub = match config.snapshot_path.as_deref() {
            Some(path) if path.exists() => {
                let stub = MemoryStub::load_snapshot(path, capability)?;
                tracing::info!("Recovered {} keys from {}", stub.len(), path.display());
                stub
            }
            _ => MemoryStub::with_capability(capability),
        };

        Ok(Self {
            config,
            contract,
            stub,
            write_lock: Mutex::new(()),
        })
    }

    /// Execute a request
    pub fn execute(&self, request: Request) -> Response {
        match request {
            Request::Invoke { function, args } => self.invoke(&function, args),
            Request::Ping => Response::ok(b"PONG".to_vec()),
        }
    }

    /// Invoke a contract function
    pub fn invoke(&self, function: &str, args: Vec<String>) -> Response {
        let writes = matches!(
            function.parse::<Function>(),
            Ok(Function::InitLedger) | Ok(Function::CreateRecord)
        );
        if !writes {
            return self.contract.invoke(&self.stub, function, args);
        }

        let _write_guard = match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(e) => {
                let err = WalletError::LockPoisoned(format!("Write lock poisoned: {}", e));
                return Response::error(err.to_string());
            }
        };

        let Some(path) = self.config.snapshot_path.as_deref() else {
            return self.contract.invoke(&self.stub, function, args);
        };

        // The write only becomes visible once it is on disk
        let staged = self.stub.staged();
        let response = self.contract.invoke(&staged, function, args);
        if !response.is_ok() {
            return response;
        }
        if let Err(e) = staged.save_snapshot(path) {
            tracing::error!("Failed to save snapshot to {}: {}", path.display(), e);
            return Response::error(e.to_string());
        }
        self.stub.commit(staged);
        response
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the world state
    pub fn stub(&self) -> &MemoryStub {
        &self.stub
    }

    /// Get the hosted contract
    pub fn contract(&self) -> &WalletContract {
        &self.contract
    }

    /// Get the snapshot path, if any
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.config.snapshot_path.as_deref()
    }

    /// Get the configuration
    pub fn config(&self) -> &PeerConfig {
        &self.config
    }
}
