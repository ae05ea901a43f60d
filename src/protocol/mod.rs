//! # Protocol Engine
//!
//! Per-connection handling of the discovery protocol.
//!
//! Each accepted connection carries exactly one packet: a server
//! registration, a client query, or garbage. The engine reads the packet,
//! classifies it by magic number, and either mutates the registry
//! (registration) or writes back the encoded server list (query).

pub mod engine;
