//! Client helpers for talking to a running master server.
//!
//! These mirror what real game servers and game clients send over the
//! wire, and double as the integration-test harness for the service.

use std::net::Ipv4Addr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::debug;

use crate::core::wire::{
    decode_i32_le, decode_u16_le, encode_i32_le, encode_u16_le, flip_quad_bytes, QUERY_MAGIC,
    REGISTRATION_MAGIC,
};
use crate::error::{MasterError, Result};

/// Announce a game server to the master.
///
/// `port` is the port the game server listens on; the master pairs it with
/// the address this connection arrives from. The master sends no reply.
pub async fn register_server<A: ToSocketAddrs>(master: A, version: i32, port: u16) -> Result<()> {
    let mut stream = TcpStream::connect(master).await?;

    let mut packet = Vec::with_capacity(10);
    packet.extend_from_slice(&encode_i32_le(REGISTRATION_MAGIC));
    packet.extend_from_slice(&encode_i32_le(version));
    packet.extend_from_slice(&encode_u16_le(port));

    stream.write_all(&packet).await?;
    stream.shutdown().await?;
    debug!(version, port, "registration sent");
    Ok(())
}

/// Ask the master for all live servers matching `version`.
///
/// Returns the decoded `(address, port)` pairs from the response.
pub async fn query_servers<A: ToSocketAddrs>(
    master: A,
    version: i32,
) -> Result<Vec<(Ipv4Addr, u16)>> {
    let mut stream = TcpStream::connect(master).await?;

    let mut packet = Vec::with_capacity(8);
    packet.extend_from_slice(&encode_i32_le(QUERY_MAGIC));
    packet.extend_from_slice(&encode_i32_le(version));
    stream.write_all(&packet).await?;

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await?;

    decode_server_list(&raw)
}

/// Decode a query response body into `(address, port)` pairs.
pub fn decode_server_list(raw: &[u8]) -> Result<Vec<(Ipv4Addr, u16)>> {
    if raw.len() < 4 {
        return Err(MasterError::MalformedPacket {
            needed: 4,
            got: raw.len(),
        });
    }

    let count = decode_i32_le(&raw[0..4])?;
    let mut servers = Vec::new();

    for chunk in raw[4..].chunks_exact(6) {
        let mut octets: [u8; 4] = chunk[0..4]
            .try_into()
            .map_err(|_| MasterError::MalformedPacket {
                needed: 4,
                got: chunk.len(),
            })?;
        flip_quad_bytes(&mut octets);
        let port = decode_u16_le(&chunk[4..6])?;
        servers.push((Ipv4Addr::from(octets), port));
    }

    if servers.len() != count as usize {
        debug!(
            count,
            decoded = servers.len(),
            "response count does not match decoded entries"
        );
    }

    Ok(servers)
}
