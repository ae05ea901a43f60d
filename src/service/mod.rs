//! # Service Layer
//!
//! The runnable master server (listener loop, shutdown handling) and the
//! client helpers used to register with or query a running master.

pub mod client;
pub mod server;

pub use server::MasterServer;
