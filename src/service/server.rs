//! Master server: TCP listener loop and connection lifecycle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::MasterConfig;
use crate::error::{MasterError, Result};
use crate::protocol::engine::handle_connection;
use crate::registry::Registry;
use crate::utils::metrics::Metrics;

/// A bound master server, ready to accept connections.
///
/// Binding and serving are split so callers (tests included) can learn the
/// actual listen address before the accept loop starts.
pub struct MasterServer {
    listener: TcpListener,
    registry: Registry,
    metrics: Arc<Metrics>,
    ttl_secs: u64,
    shutdown_timeout: Duration,
}

impl MasterServer {
    /// Bind the listening socket. A bind failure is fatal to the service;
    /// there is no retry.
    pub async fn bind(config: &MasterConfig) -> Result<Self> {
        config.validate_strict()?;

        let listener = TcpListener::bind(&config.server.address)
            .await
            .map_err(|source| MasterError::ListenerInit {
                addr: config.server.address.clone(),
                source,
            })?;

        info!(address = %config.server.address, ttl_secs = config.registry.ttl_secs, "master server listening");

        Ok(Self {
            listener,
            registry: Registry::new(),
            metrics: Arc::new(Metrics::new()),
            ttl_secs: config.registry.ttl_secs,
            shutdown_timeout: config.server.shutdown_timeout,
        })
    }

    /// The address the listener actually bound to (useful with port 0).
    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle to the shared registry.
    pub fn registry(&self) -> Registry {
        self.registry.clone()
    }

    /// Handle to the shared metrics counters.
    pub fn metrics(&self) -> Arc<Metrics> {
        self.metrics.clone()
    }

    /// Serve until ctrl-c.
    pub async fn run(self) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                info!("received ctrl-c, shutting down");
                let _ = shutdown_tx.send(()).await;
            }
        });

        self.run_with_shutdown(shutdown_rx).await
    }

    /// Serve until a message arrives on the shutdown channel (or all
    /// senders are dropped).
    ///
    /// Returning from this method drops the listener, which closes the
    /// socket; that is what actually unblocks a pending accept, not the
    /// channel by itself.
    pub async fn run_with_shutdown(self, mut shutdown_rx: mpsc::Receiver<()>) -> Result<()> {
        let active_connections = Arc::new(AtomicUsize::new(0));

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("shutting down, waiting for connections to close");
                    self.drain_connections(&active_connections).await;
                    self.metrics.log_summary(self.registry.len());
                    return Ok(());
                }

                accept_result = self.listener.accept() => {
                    match accept_result {
                        Ok((mut stream, peer)) => {
                            debug!(peer = %peer, "accepted connection");
                            self.metrics.connection_accepted();

                            let registry = self.registry.clone();
                            let metrics = self.metrics.clone();
                            let ttl_secs = self.ttl_secs;
                            let active = active_connections.clone();
                            active.fetch_add(1, Ordering::SeqCst);

                            tokio::spawn(async move {
                                let outcome = handle_connection(
                                    &mut stream,
                                    peer,
                                    &registry,
                                    ttl_secs,
                                    &metrics,
                                )
                                .await;

                                match outcome {
                                    Ok(()) => {}
                                    Err(MasterError::Io(e)) => {
                                        metrics.connection_error();
                                        warn!(peer = %peer, error = %e, "connection I/O error");
                                    }
                                    Err(e) => {
                                        // Garbage traffic; drop it quietly
                                        debug!(peer = %peer, error = %e, "dropping connection");
                                    }
                                }

                                active.fetch_sub(1, Ordering::SeqCst);
                            });
                        }
                        Err(e) => {
                            self.metrics.connection_error();
                            error!(error = %e, "error accepting connection");
                        }
                    }
                }
            }
        }
    }

    /// Wait for in-flight connection tasks to finish, up to the configured
    /// shutdown timeout.
    async fn drain_connections(&self, active: &Arc<AtomicUsize>) {
        let deadline = tokio::time::Instant::now() + self.shutdown_timeout;

        loop {
            let remaining = active.load(Ordering::SeqCst);
            if remaining == 0 {
                info!("all connections closed");
                return;
            }
            if tokio::time::Instant::now() >= deadline {
                warn!(remaining, "shutdown timeout reached, abandoning connections");
                return;
            }
            debug!(remaining, "waiting for connections to close");
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}
