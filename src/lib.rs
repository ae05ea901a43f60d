//! # masterlist
//!
//! Master server (discovery service) for multiplayer game servers.
//!
//! Game server processes register themselves over TCP; game clients query
//! the same port and receive the list of currently-live servers matching
//! their protocol version. Servers that stop re-registering are evicted
//! after a TTL.
//!
//! ## Architecture
//! - [`core::wire`] — little-endian wire codec and magic classification
//! - [`registry`] — thread-safe registry of live servers with TTL eviction
//! - [`protocol`] — per-connection engine: read, classify, dispatch, respond
//! - [`service`] — TCP listener loop, shutdown handling, client helpers
//! - [`config`], [`error`], [`utils`] — configuration, errors, logging, metrics
//!
//! ## Example
//! ```no_run
//! use masterlist::config::MasterConfig;
//! use masterlist::service::MasterServer;
//!
//! #[tokio::main]
//! async fn main() -> masterlist::Result<()> {
//!     let config = MasterConfig::default();
//!     MasterServer::bind(&config).await?.run().await
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod service;
pub mod utils;

pub use error::{MasterError, Result};
pub use registry::{Registry, ServerEntry};
pub use service::MasterServer;
