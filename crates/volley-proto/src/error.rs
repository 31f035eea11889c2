//! Protocol-level errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("buffer too short: need {needed} more bytes, have {remaining}")]
    BufferTooShort { needed: usize, remaining: usize },

    #[error("VarInt encoding error: {0}")]
    VarInt(#[from] crate::types::VarIntError),

    #[error("packet batch is empty")]
    EmptyBatch,

    #[error("unknown packet id: 0x{0:02X}")]
    UnknownPacketId(u32),

    #[error("invalid data: {0}")]
    InvalidData(String),
}
