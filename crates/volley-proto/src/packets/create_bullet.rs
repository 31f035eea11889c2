//! CreateBullet (0x01), server to observers.
//!
//! Carries exactly what an observer needs to rebuild a server-created bullet.
//! Owner and attached payload are never sent.

use bytes::{Buf, BufMut};

use crate::codec::{ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::{VarUInt32, Vec2};

/// Replicated bullet creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreateBullet {
    /// Content handle of the bullet type (registry index).
    pub type_id: u16,
    pub team: u8,
    pub position: Vec2,
    /// Heading in degrees.
    pub angle: f32,
    pub velocity_scale: f32,
    pub lifetime_scale: f32,
}

impl ProtoEncode for CreateBullet {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        VarUInt32(self.type_id as u32).proto_encode(buf);
        buf.put_u8(self.team);
        self.position.proto_encode(buf);
        buf.put_f32_le(self.angle);
        buf.put_f32_le(self.velocity_scale);
        buf.put_f32_le(self.lifetime_scale);
    }
}

impl ProtoDecode for CreateBullet {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let type_id = VarUInt32::proto_decode(buf)?.0;
        let type_id = u16::try_from(type_id)
            .map_err(|_| ProtoError::InvalidData(format!("bullet type id {type_id} out of range")))?;
        let team = u8::proto_decode(buf)?;
        let position = Vec2::proto_decode(buf)?;
        let angle = f32::proto_decode(buf)?;
        let velocity_scale = f32::proto_decode(buf)?;
        let lifetime_scale = f32::proto_decode(buf)?;
        let floats = [
            ("x", position.x),
            ("y", position.y),
            ("angle", angle),
            ("velocity_scale", velocity_scale),
            ("lifetime_scale", lifetime_scale),
        ];
        if let Some((field, value)) = floats.into_iter().find(|(_, v)| !v.is_finite()) {
            return Err(ProtoError::InvalidData(format!("{field} is not finite: {value}")));
        }
        Ok(Self {
            type_id,
            team,
            position,
            angle,
            velocity_scale,
            lifetime_scale,
        })
    }
}
