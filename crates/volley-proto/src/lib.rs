//! Wire types and codec for bullet replication messages.

pub mod batch;
pub mod codec;
pub mod error;
pub mod packets;
pub mod types;
