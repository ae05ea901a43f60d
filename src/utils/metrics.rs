//! Observability and Metrics
//!
//! Thread-safe counters for monitoring the master server. These are
//! instrumentation only; protocol correctness never depends on them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tracing::info;

/// Counters for master-server operations
#[derive(Debug)]
pub struct Metrics {
    /// Total connections accepted
    connections_total: AtomicU64,
    /// Total server registrations processed (including refreshes)
    registrations_total: AtomicU64,
    /// Total client queries answered
    queries_total: AtomicU64,
    /// Total server entries sent out in query responses
    servers_listed_total: AtomicU64,
    /// Packets dropped for an unrecognized magic number
    unknown_packets: AtomicU64,
    /// Packets dropped for being too short
    malformed_packets: AtomicU64,
    /// Per-connection I/O failures
    connection_errors: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            connections_total: AtomicU64::new(0),
            registrations_total: AtomicU64::new(0),
            queries_total: AtomicU64::new(0),
            servers_listed_total: AtomicU64::new(0),
            unknown_packets: AtomicU64::new(0),
            malformed_packets: AtomicU64::new(0),
            connection_errors: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn connection_accepted(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn registration(&self) {
        self.registrations_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn query(&self, servers_listed: usize) {
        self.queries_total.fetch_add(1, Ordering::Relaxed);
        self.servers_listed_total
            .fetch_add(servers_listed as u64, Ordering::Relaxed);
    }

    pub fn unknown_packet(&self) {
        self.unknown_packets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn malformed_packet(&self) {
        self.malformed_packets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_error(&self) {
        self.connection_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connections_total(&self) -> u64 {
        self.connections_total.load(Ordering::Relaxed)
    }

    pub fn registrations_total(&self) -> u64 {
        self.registrations_total.load(Ordering::Relaxed)
    }

    pub fn queries_total(&self) -> u64 {
        self.queries_total.load(Ordering::Relaxed)
    }

    pub fn servers_listed_total(&self) -> u64 {
        self.servers_listed_total.load(Ordering::Relaxed)
    }

    pub fn unknown_packets(&self) -> u64 {
        self.unknown_packets.load(Ordering::Relaxed)
    }

    pub fn malformed_packets(&self) -> u64 {
        self.malformed_packets.load(Ordering::Relaxed)
    }

    pub fn connection_errors(&self) -> u64 {
        self.connection_errors.load(Ordering::Relaxed)
    }

    /// Log a one-line summary of all counters.
    pub fn log_summary(&self, registry_size: usize) {
        info!(
            uptime_secs = self.start_time.elapsed().as_secs(),
            connections = self.connections_total(),
            registrations = self.registrations_total(),
            queries = self.queries_total(),
            servers_listed = self.servers_listed_total(),
            unknown = self.unknown_packets(),
            malformed = self.malformed_packets(),
            errors = self.connection_errors(),
            registry_size,
            "metrics summary"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
