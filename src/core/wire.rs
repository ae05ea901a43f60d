//! Wire codec primitives.
//!
//! Pure, stateless conversions between the protocol's little-endian on-wire
//! integers and host integers, plus the magic-number classification that
//! routes an incoming packet to the registration or query path.
//!
//! The game's protocol went through a magic-constant swap between releases
//! (the values for the server and client roles traded places). This crate
//! pins one fixed pair and treats it as part of the protocol version:
//! `REGISTRATION_MAGIC` = "HELP", `QUERY_MAGIC` = "THEM".

use crate::error::{MasterError, Result};

/// Magic sent by a game server announcing itself ("HELP" as ASCII).
pub const REGISTRATION_MAGIC: i32 = 0x4845_4C50;

/// Magic sent by a game client requesting the server list ("THEM" as ASCII).
pub const QUERY_MAGIC: i32 = 0x5448_454D;

/// Minimum bytes for any well-formed packet (magic + version).
pub const PACKET_MIN_LEN: usize = 8;

/// Minimum bytes for a registration packet (magic + version + port).
pub const PACKET_REGISTRATION_LEN: usize = 10;

/// What a packet's leading magic number says it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    /// A game server announcing itself for listing
    ServerRegistration,
    /// A game client asking for the list of live servers
    ClientQuery,
    /// Anything else; dropped without a response
    Unknown,
}

/// Classify a decoded magic number.
pub fn classify_magic(magic: i32) -> PacketKind {
    match magic {
        REGISTRATION_MAGIC => PacketKind::ServerRegistration,
        QUERY_MAGIC => PacketKind::ClientQuery,
        _ => PacketKind::Unknown,
    }
}

/// Decode a little-endian i32 from exactly 4 bytes.
pub fn decode_i32_le(bytes: &[u8]) -> Result<i32> {
    let arr: [u8; 4] = bytes
        .try_into()
        .map_err(|_| MasterError::MalformedPacket {
            needed: 4,
            got: bytes.len(),
        })?;
    Ok(i32::from_le_bytes(arr))
}

/// Encode an i32 as 4 little-endian bytes.
pub fn encode_i32_le(value: i32) -> [u8; 4] {
    value.to_le_bytes()
}

/// Decode a little-endian u16 from exactly 2 bytes.
pub fn decode_u16_le(bytes: &[u8]) -> Result<u16> {
    let arr: [u8; 2] = bytes
        .try_into()
        .map_err(|_| MasterError::MalformedPacket {
            needed: 2,
            got: bytes.len(),
        })?;
    Ok(u16::from_le_bytes(arr))
}

/// Encode a u16 as 2 little-endian bytes.
pub fn encode_u16_le(value: u16) -> [u8; 2] {
    value.to_le_bytes()
}

/// Reverse the byte order within each complete 4-byte group, in place
/// (0↔3 and 1↔2). Used to put address octets into the wire's order.
///
/// Applying it twice restores the original buffer. Trailing bytes after the
/// last full group are left untouched.
pub fn flip_quad_bytes(bytes: &mut [u8]) {
    for quad in bytes.chunks_exact_mut(4) {
        quad.swap(0, 3);
        quad.swap(1, 2);
    }
}
