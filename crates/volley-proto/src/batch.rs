//! Packet batching: several framed packets per datagram.
//!
//! Layout: repeated `VarUInt32(len) + packet`, where each packet is already
//! `VarUInt32(packet_id) + body`.

use std::io::Cursor;

use bytes::{Buf, Bytes, BytesMut};
use tracing::trace;

use crate::codec::{ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::packets::{decode_packet, encode_packet, GamePacket};
use crate::types::VarUInt32;

/// Split a batch payload into its framed sub-packets.
pub fn decode_batch(data: Bytes) -> Result<Vec<Bytes>, ProtoError> {
    if data.is_empty() {
        return Err(ProtoError::EmptyBatch);
    }

    let mut cursor = Cursor::new(&data[..]);
    let mut packets = Vec::new();

    while cursor.has_remaining() {
        let len = VarUInt32::proto_decode(&mut cursor)?.0 as usize;
        if cursor.remaining() < len {
            return Err(ProtoError::BufferTooShort {
                needed: len,
                remaining: cursor.remaining(),
            });
        }
        let start = cursor.position() as usize;
        packets.push(data.slice(start..start + len));
        cursor.set_position((start + len) as u64);
    }

    trace!(count = packets.len(), bytes = data.len(), "decoded batch");
    Ok(packets)
}

/// Join framed sub-packets into one batch payload.
pub fn encode_batch(packets: &[Bytes]) -> Result<Bytes, ProtoError> {
    if packets.is_empty() {
        return Err(ProtoError::EmptyBatch);
    }

    let mut batch = BytesMut::new();
    for pkt in packets {
        VarUInt32(pkt.len() as u32).proto_encode(&mut batch);
        batch.extend_from_slice(pkt);
    }
    Ok(batch.freeze())
}

/// Encode typed packets straight into a batch.
pub fn encode_game_packets(packets: &[GamePacket]) -> Result<Bytes, ProtoError> {
    let framed: Vec<Bytes> = packets.iter().map(encode_packet).collect();
    encode_batch(&framed)
}

/// Decode a batch straight into typed packets.
pub fn decode_game_packets(data: Bytes) -> Result<Vec<GamePacket>, ProtoError> {
    decode_batch(data)?
        .into_iter()
        .map(|mut pkt| decode_packet(&mut pkt))
        .collect()
}
