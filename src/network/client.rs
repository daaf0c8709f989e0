//! TCP Client
//!
//! Blocking request/response client for the development peer.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::time::Duration;

use crate::error::{Result, WalletError};
use crate::invocation::Response;
use crate::protocol::{read_response, write_request, Request};

/// A connection to a `wallet-peer`
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    /// Connect to `addr`, applying `timeout_ms` to reads and writes (0 disables)
    pub fn connect(addr: &str, timeout_ms: u64) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .map_err(|e| WalletError::Network(format!("Failed to connect to {}: {}", addr, e)))?;
        stream.set_nodelay(true)?;
        if timeout_ms > 0 {
            let timeout = Some(Duration::from_millis(timeout_ms));
            stream.set_read_timeout(timeout)?;
            stream.set_write_timeout(timeout)?;
        }

        let read_stream = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
        })
    }

    /// Send one request and wait for its response
    pub fn call(&mut self, request: &Request) -> Result<Response> {
        write_request(&mut self.writer, request)?;
        read_response(&mut self.reader)
    }

    /// Invoke a contract function
    pub fn invoke(&mut self, function: &str, args: &[String]) -> Result<Response> {
        self.call(&Request::invoke(function, args.iter().cloned()))
    }
}
