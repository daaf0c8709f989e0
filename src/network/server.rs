//! TCP Server
//!
//! Accepts connections and dispatches to worker threads.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam::channel;

use super::Connection;
use crate::config::PeerConfig;
use crate::engine::Engine;
use crate::error::{Result, WalletError};

/// TCP server for the development peer
pub struct Server {
    config: PeerConfig,
    engine: Arc<Engine>,
    listener: Option<TcpListener>,
    shutdown: Arc<AtomicBool>,
}

/// Stops a running [`Server`] from another thread
#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    addr: SocketAddr,
}

impl ShutdownHandle {
    /// Signal the server to stop accepting and wake its acceptor
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
        // Unblocks the pending accept
        let _ = TcpStream::connect(self.addr);
    }
}

impl Server {
    /// Create a new server with the given config and engine
    pub fn new(config: PeerConfig, engine: Arc<Engine>) -> Self {
        Self {
            config,
            engine,
            listener: None,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Bind the listen address, returning the bound address
    pub fn bind(&mut self) -> Result<SocketAddr> {
        if let Some(listener) = &self.listener {
            return Ok(listener.local_addr()?);
        }
        let listener = TcpListener::bind(&self.config.listen_addr).map_err(|e| {
            WalletError::Network(format!("Failed to bind {}: {}", self.config.listen_addr, e))
        })?;
        let addr = listener.local_addr()?;
        self.listener = Some(listener);
        Ok(addr)
    }

    /// Handle for stopping the server; binds first if needed
    pub fn shutdown_handle(&mut self) -> Result<ShutdownHandle> {
        let addr = self.bind()?;
        Ok(ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
            addr,
        })
    }

    /// Start the server (blocking until shutdown)
    pub fn run(&mut self) -> Result<()> {
        let addr = self.bind()?;
        let listener = self
            .listener
            .take()
            .ok_or_else(|| WalletError::Network("listener not bound".to_string()))?;

        let workers = self.config.worker_threads.max(1);
        let (tx, rx) = channel::bounded::<TcpStream>(workers * 16);

        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let rx = rx.clone();
            let engine = Arc::clone(&self.engine);
            let (read_ms, write_ms) = (self.config.read_timeout_ms, self.config.write_timeout_ms);

            let handle = thread::Builder::new()
                .name(format!("wallet-worker-{}", id))
                .spawn(move || {
                    for stream in rx.iter() {
                        let result = Connection::new(stream, Arc::clone(&engine)).and_then(|mut conn| {
                            conn.set_timeouts(read_ms, write_ms)?;
                            conn.handle()
                        });
                        if let Err(e) = result {
                            tracing::warn!("Connection error: {}", e);
                        }
                    }
                })?;
            handles.push(handle);
        }
        drop(rx);

        tracing::info!("Listening on {} with {} workers", addr, workers);

        for stream in listener.incoming() {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }
            match stream {
                Ok(stream) => {
                    if tx.send(stream).is_err() {
                        break;
                    }
                }
                Err(e) => tracing::warn!("Failed to accept connection: {}", e),
            }
        }

        drop(tx);
        for handle in handles {
            if handle.join().is_err() {
                tracing::error!("Worker thread panicked");
            }
        }

        tracing::info!("Server on {} stopped", addr);
        Ok(())
    }
}
