//! Base data types shared by every packet.

use std::fmt;
use std::ops::{Add, Mul, Sub};

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::{ensure_remaining, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum VarIntError {
    #[error("buffer too short")]
    BufferTooShort,
    #[error("VarInt is too long (more than {max_bytes} bytes)")]
    TooManyBytes { max_bytes: usize },
}

// ---------------------------------------------------------------------------
// VarUInt32 (unsigned LEB128)
// ---------------------------------------------------------------------------

/// Unsigned variable-length integer (plain LEB128).
/// Used for packet ids, lengths and content handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VarUInt32(pub u32);

impl VarUInt32 {
    pub const MAX_BYTES: usize = 5;

    /// Number of bytes this value occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        let mut value = self.0;
        let mut len = 1;
        while value & !0x7F != 0 {
            value >>= 7;
            len += 1;
        }
        len
    }
}

impl ProtoEncode for VarUInt32 {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        let mut value = self.0;
        loop {
            if value & !0x7F == 0 {
                buf.put_u8(value as u8);
                return;
            }
            buf.put_u8((value & 0x7F | 0x80) as u8);
            value >>= 7;
        }
    }
}

impl ProtoDecode for VarUInt32 {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let mut result: u32 = 0;
        let mut shift: u32 = 0;
        for i in 0..Self::MAX_BYTES {
            if !buf.has_remaining() {
                return Err(VarIntError::BufferTooShort.into());
            }
            let byte = buf.get_u8();
            result |= ((byte & 0x7F) as u32) << shift;
            if byte & 0x80 == 0 {
                return Ok(VarUInt32(result));
            }
            shift += 7;
            if i == Self::MAX_BYTES - 1 {
                return Err(VarIntError::TooManyBytes {
                    max_bytes: Self::MAX_BYTES,
                }
                .into());
            }
        }
        Err(VarIntError::BufferTooShort.into())
    }
}

// ---------------------------------------------------------------------------
// Vec2 (f32 x, y)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Vector of the given length pointing at `degrees` (counter-clockwise from +X).
    pub fn from_angle(degrees: f32, length: f32) -> Self {
        let rad = degrees.to_radians();
        Self::new(rad.cos() * length, rad.sin() * length)
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(&self, other: &Vec2) -> f32 {
        (*self - *other).length()
    }

    /// Heading in degrees, normalized to `[0, 360)`.
    pub fn angle(&self) -> f32 {
        let deg = self.y.atan2(self.x).to_degrees();
        if deg < 0.0 {
            deg + 360.0
        } else {
            deg
        }
    }

    /// Same length, new heading.
    pub fn with_angle(&self, degrees: f32) -> Self {
        Self::from_angle(degrees, self.length())
    }

    /// Unit vector, or zero for a zero-length vector.
    pub fn normalized(&self) -> Self {
        let len = self.length();
        if len <= f32::EPSILON {
            Self::ZERO
        } else {
            *self * (1.0 / len)
        }
    }
}

impl ProtoEncode for Vec2 {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_f32_le(self.x);
        buf.put_f32_le(self.y);
    }
}

impl ProtoDecode for Vec2 {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, 8)?;
        Ok(Self {
            x: buf.get_f32_le(),
            y: buf.get_f32_le(),
        })
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
