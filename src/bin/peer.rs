//! Wallet Peer Binary
//!
//! Starts a local development peer hosting the wallet contract.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};
use wallet::config::{
    offset_from_hours, AmountEncoding, CompositeSchema, ContractConfig, ContractConfigBuilder,
    KeyStrategy, TypeEncoding,
};
use wallet::network::Server;
use wallet::{Engine, PeerConfig};

/// Contract variant presets
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Variant {
    /// Caller-supplied keys, single-key lookups
    Direct,
    /// Composite keys (sender~receiver~time~amount~type), rich queries
    Composite,
    /// Composite keys (sender~receiver~transfer_time), rich queries
    CompositeShort,
}

/// Wallet development peer
#[derive(Parser, Debug)]
#[command(name = "wallet-peer")]
#[command(about = "Local development peer for the wallet contract")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7051")]
    listen: String,

    /// Worker threads serving connections
    #[arg(short, long, default_value = "4")]
    workers: usize,

    /// Contract variant
    #[arg(long, value_enum, default_value = "composite")]
    variant: Variant,

    /// Store amounts as JSON numbers instead of decimal strings
    #[arg(long)]
    float_amounts: bool,

    /// Store transfer types as integers
    #[arg(long)]
    integer_types: bool,

    /// Timestamp offset from UTC in hours
    #[arg(long, default_value = "8", allow_hyphen_values = true)]
    utc_offset_hours: i32,

    /// Snapshot file (loaded at start, rewritten after every write)
    #[arg(short, long)]
    snapshot: Option<PathBuf>,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,wallet=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("Wallet peer v{}", wallet::VERSION);
    tracing::info!("Listen address: {}", args.listen);
    tracing::info!("Contract variant: {:?}", args.variant);

    let preset = match args.variant {
        Variant::Direct => ContractConfig::direct_key(),
        Variant::Composite => ContractConfig::composite_key(),
        Variant::CompositeShort => ContractConfig::builder()
            .key_strategy(KeyStrategy::Composite(CompositeSchema::Short))
            .build(),
    };

    let offset_secs = match offset_from_hours(args.utc_offset_hours) {
        Ok(secs) => secs,
        Err(e) => {
            tracing::error!("Invalid --utc-offset-hours: {}", e);
            std::process::exit(1);
        }
    };

    let mut contract = ContractConfigBuilder::from_config(preset).utc_offset_secs(Some(offset_secs));
    if args.float_amounts {
        contract = contract.amount_encoding(AmountEncoding::Float);
    }
    if args.integer_types {
        contract = contract.type_encoding(TypeEncoding::Integer);
    }

    let mut builder = PeerConfig::builder()
        .listen_addr(&args.listen)
        .worker_threads(args.workers)
        .contract(contract.build());
    if let Some(path) = &args.snapshot {
        tracing::info!("Snapshot file: {}", path.display());
        builder = builder.snapshot_path(path);
    }
    let config = builder.build();

    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Engine initialized successfully");

    let mut server = Server::new(config, engine);
    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
