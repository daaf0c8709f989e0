//! Wallet CLI Client
//!
//! Command-line interface for invoking the wallet contract on a peer.

use clap::{Parser, Subcommand};
use wallet::network::Client;
use wallet::protocol::Request;

/// Wallet CLI
#[derive(Parser, Debug)]
#[command(name = "wallet-cli")]
#[command(about = "CLI for the wallet development peer")]
struct Args {
    /// Peer address
    #[arg(short, long, default_value = "127.0.0.1:7051")]
    server: String,

    /// Read/write timeout in milliseconds (0 disables)
    #[arg(long, default_value = "5000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Seed the ledger with sample transfers
    Init,

    /// Record a transfer (arguments depend on the peer's variant)
    Create {
        /// `key sender receiver amount time` or `sender receiver amount type`
        args: Vec<String>,
    },

    /// Look up a key or list a party's transfers (`party [limit] [skip]`)
    Query {
        args: Vec<String>,
    },

    /// Call any contract function
    Invoke {
        /// Function name
        function: String,

        /// Function arguments
        args: Vec<String>,
    },

    /// Ping the peer
    Ping,
}

fn main() {
    let args = Args::parse();

    let request = match args.command {
        Commands::Init => Request::invoke("initLedger", Vec::<String>::new()),
        Commands::Create { args } => Request::invoke("createRecord", args),
        Commands::Query { args } => Request::invoke("queryRecord", args),
        Commands::Invoke { function, args } => Request::invoke(function, args),
        Commands::Ping => Request::Ping,
    };

    let response = Client::connect(&args.server, args.timeout_ms).and_then(|mut c| c.call(&request));

    match response {
        Ok(response) if response.is_ok() => {
            if !response.payload.is_empty() {
                println!("{}", String::from_utf8_lossy(&response.payload));
            }
        }
        Ok(response) => {
            eprintln!("Error: {}", response.message.unwrap_or_default());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}
