//! # Error Types
//!
//! Error handling for the master server.
//!
//! This module defines all error variants that can occur while serving the
//! discovery protocol, from low-level I/O failures to malformed packets.
//!
//! ## Error Categories
//! - **I/O Errors**: accept/read/write failures on one connection
//! - **Protocol Errors**: short packets, unrecognized magic numbers
//! - **Startup Errors**: listener bind failures, invalid configuration
//!
//! Per-connection errors are contained: the connection is dropped and the
//! accept loop keeps running. Only `ListenerInit` and `ConfigError` are
//! fatal to the service.

use std::io;
use thiserror::Error;

/// Primary error type for all master-server operations
#[derive(Error, Debug)]
pub enum MasterError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed packet: need {needed} bytes, got {got}")]
    MalformedPacket { needed: usize, got: usize },

    #[error("unrecognized magic number: {0:#010x}")]
    UnrecognizedMagic(i32),

    #[error("failed to bind listener on {addr}: {source}")]
    ListenerInit { addr: String, source: io::Error },

    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl MasterError {
    /// Whether this error should take the whole service down.
    ///
    /// Everything except startup failures is scoped to a single connection.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MasterError::ListenerInit { .. } | MasterError::ConfigError(_)
        )
    }
}

/// Type alias for Results using MasterError
pub type Result<T> = std::result::Result<T, MasterError>;
