//! Network Module
//!
//! TCP server and client for the development peer.
//!
//! ## Architecture
//! - Single acceptor thread
//! - Worker thread pool for connections
//! - Requests routed through Engine

mod client;
mod connection;
mod server;

pub use client::Client;
pub use connection::Connection;
pub use server::{Server, ShutdownHandle};
