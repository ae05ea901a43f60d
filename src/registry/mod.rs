//! # Server Registry
//!
//! Thread-safe collection of currently-live game servers.
//!
//! Each registered server is identified by its `(address, port, version)`
//! tuple; re-registering a known identity refreshes its `last_seen` stamp
//! instead of creating a duplicate. Entries that have not re-registered
//! within the TTL are swept out before each query response is built.
//!
//! ## Locking
//! A single `RwLock` guards the whole map. Every operation acquires and
//! releases it for its full duration; the lock is never held across I/O,
//! and callers never see the underlying collection directly.

use std::collections::HashMap;
use std::fmt;
use std::net::Ipv4Addr;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

/// Identity of one registered server.
///
/// Two registrations with the same key are the same server, no matter when
/// they arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServerKey {
    /// Address the server is reachable at (taken from the registering peer)
    pub address: Ipv4Addr,
    /// Port the server itself listens on, not the registration connection's
    pub port: u16,
    /// Protocol/client version tag the server was built against
    pub version: i32,
}

/// One registered server: identity plus its last-seen stamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEntry {
    pub address: Ipv4Addr,
    pub port: u16,
    pub version: i32,
    /// Epoch seconds of the most recent registration
    pub last_seen: u64,
}

impl ServerEntry {
    pub fn new(address: Ipv4Addr, port: u16, version: i32, now: u64) -> Self {
        Self {
            address,
            port,
            version,
            last_seen: now,
        }
    }

    pub fn key(&self) -> ServerKey {
        ServerKey {
            address: self.address,
            port: self.port,
            version: self.version,
        }
    }
}

impl fmt::Display for ServerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} (v{})", self.address, self.port, self.version)
    }
}

/// Thread-safe registry of live servers, keyed by [`ServerKey`].
///
/// Cheap to clone; clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    inner: Arc<RwLock<HashMap<ServerKey, u64>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a server, or refresh its `last_seen` if the identity is
    /// already registered. `last_seen` never moves backwards.
    pub fn upsert(&self, entry: ServerEntry) {
        let mut map = self.write();
        map.entry(entry.key())
            .and_modify(|seen| *seen = (*seen).max(entry.last_seen))
            .or_insert(entry.last_seen);
        debug!(server = %entry, total = map.len(), "server registered");
    }

    /// Remove every entry older than `ttl_secs`, returning how many were
    /// swept. An entry exactly at the TTL boundary survives.
    pub fn evict_expired(&self, now: u64, ttl_secs: u64) -> usize {
        let mut map = self.write();
        let before = map.len();
        map.retain(|_, seen| now.saturating_sub(*seen) <= ttl_secs);
        let removed = before - map.len();
        if removed > 0 {
            debug!(removed, remaining = map.len(), "evicted inactive servers");
        }
        removed
    }

    /// All currently-present entries whose version matches, in unspecified
    /// order. Does not mutate anything; in particular no implicit eviction.
    pub fn snapshot_for_version(&self, version: i32) -> Vec<ServerEntry> {
        self.read()
            .iter()
            .filter(|(key, _)| key.version == version)
            .map(|(key, &seen)| ServerEntry {
                address: key.address,
                port: key.port,
                version: key.version,
                last_seen: seen,
            })
            .collect()
    }

    /// Total entry count across all versions. Instrumentation only.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A poisoned lock still holds a consistent map (all mutations are
    // single statements), so recover the guard instead of propagating.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<ServerKey, u64>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<ServerKey, u64>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
