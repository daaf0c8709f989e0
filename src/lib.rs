//! # Wallet
//!
//! A ledger contract that records money transfers and answers queries
//! about the transfers involving a party:
//! - One record schema shared by every contract variant
//! - Direct or composite storage keys
//! - Key lookups or rich (JSON predicate) party queries
//! - An in-memory host store and a local development peer
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │            wallet-cli  ──TCP──▶  wallet-peer                │
//! │                                 (Server / Connection)       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ Request
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Engine                               │
//! │            (Single Writer / Multi Reader)                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ (function, args)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   WalletContract                            │
//! │        Invocation ─▶ initLedger / createRecord /            │
//! │                      queryRecord                            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ ChaincodeStub
//!                       ▼
//!               ┌───────────────┐
//!               │  MemoryStub   │  (or a real peer's state)
//!               │  (RwLock)     │
//!               └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod contract;
pub mod engine;
pub mod invocation;
pub mod memstore;
pub mod network;
pub mod protocol;
pub mod query;
pub mod record;
pub mod stub;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::{ContractConfig, PeerConfig};
pub use contract::WalletContract;
pub use engine::Engine;
pub use error::{Result, WalletError};
pub use invocation::{Invocation, Response};
pub use memstore::MemoryStub;
pub use record::Record;
pub use stub::ChaincodeStub;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of the wallet crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
