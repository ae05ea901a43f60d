//! # Core Protocol Components
//!
//! Low-level wire encoding and packet classification.
//!
//! This module provides the foundation of the discovery protocol: the
//! little-endian integer codec, the address byte-order flip, and the magic
//! number classification used to tell registrations from queries.
//!
//! ## Wire Format
//! ```text
//! registration: [Magic(4, LE)] [Version(4, LE)] [Port(2, LE)]
//! query:        [Magic(4, LE)] [Version(4, LE)]
//! response:     [Count(4, LE)] ([Address(4, flipped)] [Port(2, LE)])*
//! ```
//!
//! Every multi-byte integer on the wire is little-endian; address octets are
//! carried in quad-flipped order (see [`wire::flip_quad_bytes`]).

pub mod wire;
