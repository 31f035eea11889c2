//! Encoding/decoding traits and primitive impls.

use bytes::{Buf, BufMut};

use crate::error::ProtoError;

/// Encode a value onto a buffer.
pub trait ProtoEncode {
    fn proto_encode(&self, buf: &mut impl BufMut);
}

/// Decode a value from a buffer.
pub trait ProtoDecode: Sized {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError>;
}

/// Fail with `BufferTooShort` unless `needed` bytes are left.
pub fn ensure_remaining(buf: &impl Buf, needed: usize) -> Result<(), ProtoError> {
    if buf.remaining() < needed {
        return Err(ProtoError::BufferTooShort {
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

impl ProtoEncode for u8 {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(*self);
    }
}

impl ProtoDecode for u8 {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, 1)?;
        Ok(buf.get_u8())
    }
}

impl ProtoEncode for f32 {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_f32_le(*self);
    }
}

impl ProtoDecode for f32 {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, 4)?;
        Ok(buf.get_f32_le())
    }
}
