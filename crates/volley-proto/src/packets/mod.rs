//! Packet definitions and id framing.

pub mod create_bullet;

pub use create_bullet::CreateBullet;

use bytes::{Buf, Bytes, BytesMut};

use crate::codec::{ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::VarUInt32;

/// Packet ids.
pub mod id {
    pub const CREATE_BULLET: u32 = 0x01;
}

/// Every packet the replication layer understands.
#[derive(Debug, Clone, PartialEq)]
pub enum GamePacket {
    CreateBullet(CreateBullet),
}

impl GamePacket {
    pub fn packet_id(&self) -> u32 {
        match self {
            GamePacket::CreateBullet(_) => id::CREATE_BULLET,
        }
    }
}

/// Encode `VarUInt32(packet_id) + body`.
pub fn encode_packet(packet: &GamePacket) -> Bytes {
    let mut buf = BytesMut::new();
    VarUInt32(packet.packet_id()).proto_encode(&mut buf);
    match packet {
        GamePacket::CreateBullet(p) => p.proto_encode(&mut buf),
    }
    buf.freeze()
}

/// Decode a single framed packet.
pub fn decode_packet(buf: &mut impl Buf) -> Result<GamePacket, ProtoError> {
    let packet_id = VarUInt32::proto_decode(buf)?.0;
    match packet_id {
        id::CREATE_BULLET => Ok(GamePacket::CreateBullet(CreateBullet::proto_decode(buf)?)),
        other => Err(ProtoError::UnknownPacketId(other)),
    }
}

impl From<CreateBullet> for GamePacket {
    fn from(p: CreateBullet) -> Self {
        GamePacket::CreateBullet(p)
    }
}
