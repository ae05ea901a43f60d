//! Connection state machine: read, classify, dispatch, respond.

use std::net::{IpAddr, SocketAddr};

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::core::wire::{
    classify_magic, decode_i32_le, decode_u16_le, encode_i32_le, encode_u16_le, flip_quad_bytes,
    PacketKind, PACKET_MIN_LEN, PACKET_REGISTRATION_LEN,
};
use crate::error::{MasterError, Result};
use crate::registry::{Registry, ServerEntry};
use crate::utils::metrics::Metrics;
use crate::utils::time::now_secs;

/// Read buffer size per connection
pub const READ_BUFFER_SIZE: usize = 512;

/// Handle one accepted connection from start to close.
///
/// Reads the packet, classifies it, and dispatches:
/// - registration: upsert into the registry, no response
/// - query: sweep expired entries, then write the version-filtered list
/// - unknown magic or short packet: error out with no mutation
///
/// The caller owns the connection's lifecycle; any error returned here is
/// scoped to this connection only.
pub async fn handle_connection<S>(
    stream: &mut S,
    peer: SocketAddr,
    registry: &Registry,
    ttl_secs: u64,
    metrics: &Metrics,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let packet = read_packet(stream).await?;
    debug!(peer = %peer, bytes = packet.len(), "packet received");

    if packet.len() < PACKET_MIN_LEN {
        metrics.malformed_packet();
        return Err(MasterError::MalformedPacket {
            needed: PACKET_MIN_LEN,
            got: packet.len(),
        });
    }

    let magic = decode_i32_le(&packet[0..4])?;
    let version = decode_i32_le(&packet[4..8])?;

    match classify_magic(magic) {
        PacketKind::ServerRegistration => {
            handle_registration(peer, &packet, version, registry, metrics)
        }
        PacketKind::ClientQuery => {
            handle_query(stream, version, registry, ttl_secs, metrics).await
        }
        PacketKind::Unknown => {
            metrics.unknown_packet();
            Err(MasterError::UnrecognizedMagic(magic))
        }
    }
}

/// Accumulate reads until the stream ends or a single read delivers at
/// least [`PACKET_MIN_LEN`] bytes.
///
/// This mirrors the game client's behavior of keeping the connection open
/// after sending its query: waiting for EOF alone would hang forever, so
/// reading stops as soon as a plausible full header has arrived. It is a
/// heuristic, not a framed-length boundary.
async fn read_packet<S>(stream: &mut S) -> Result<BytesMut>
where
    S: AsyncRead + Unpin,
{
    let mut accumulated = BytesMut::new();
    let mut buf = [0u8; READ_BUFFER_SIZE];

    loop {
        let count = stream.read(&mut buf).await?;
        if count == 0 {
            break;
        }
        accumulated.put_slice(&buf[..count]);
        if count >= PACKET_MIN_LEN {
            break;
        }
    }

    Ok(accumulated)
}

fn handle_registration(
    peer: SocketAddr,
    packet: &[u8],
    version: i32,
    registry: &Registry,
    metrics: &Metrics,
) -> Result<()> {
    if packet.len() < PACKET_REGISTRATION_LEN {
        metrics.malformed_packet();
        return Err(MasterError::MalformedPacket {
            needed: PACKET_REGISTRATION_LEN,
            got: packet.len(),
        });
    }

    // The advertised port is the port the game server listens on, not the
    // ephemeral port this registration arrived from.
    let port = decode_u16_le(&packet[8..10])?;

    let address = match peer.ip().to_canonical() {
        IpAddr::V4(v4) => v4,
        IpAddr::V6(_) => {
            // The wire format has a 4-byte address field; nothing else fits.
            warn!(peer = %peer, "ignoring registration from non-IPv4 peer");
            return Ok(());
        }
    };

    let entry = ServerEntry::new(address, port, version, now_secs());
    registry.upsert(entry);
    metrics.registration();
    Ok(())
}

async fn handle_query<S>(
    stream: &mut S,
    version: i32,
    registry: &Registry,
    ttl_secs: u64,
    metrics: &Metrics,
) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    registry.evict_expired(now_secs(), ttl_secs);
    let servers = registry.snapshot_for_version(version);
    debug!(version, count = servers.len(), "answering query");

    let response = encode_query_response(&servers);
    stream.write_all(&response).await?;
    stream.shutdown().await?;

    metrics.query(servers.len());
    Ok(())
}

/// Encode a query response: entry count, then each entry's address octets
/// in quad-flipped order followed by its little-endian port.
pub fn encode_query_response(servers: &[ServerEntry]) -> BytesMut {
    let mut response = BytesMut::with_capacity(4 + servers.len() * 6);
    response.put_slice(&encode_i32_le(servers.len() as i32));

    for server in servers {
        let mut octets = server.address.octets();
        flip_quad_bytes(&mut octets);
        response.put_slice(&octets);
        response.put_slice(&encode_u16_le(server.port));
    }

    response
}
