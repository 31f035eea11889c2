//! In-process stand-in for an unreliable transport.
//!
//! Each tick's replication messages travel as one encoded batch. A datagram
//! is dropped whole with the configured probability, like a lost UDP packet.

use bytes::Bytes;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;
use volley_proto::batch::{decode_game_packets, encode_game_packets};
use volley_proto::error::ProtoError;
use volley_proto::packets::{CreateBullet, GamePacket};

/// Delivery counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LinkStats {
    pub sent: u64,
    pub delivered: u64,
    pub dropped: u64,
    pub bytes: u64,
}

pub struct LossyLink {
    drop_rate: f64,
    rng: StdRng,
    stats: LinkStats,
}

impl LossyLink {
    pub fn new(drop_rate: f64, seed: u64) -> Self {
        Self {
            drop_rate: drop_rate.clamp(0.0, 1.0),
            rng: StdRng::seed_from_u64(seed),
            stats: LinkStats::default(),
        }
    }

    /// Encode `messages` into a datagram; `None` when there is nothing to send.
    pub fn encode(messages: Vec<CreateBullet>) -> Result<Option<Bytes>, ProtoError> {
        if messages.is_empty() {
            return Ok(None);
        }
        let packets: Vec<GamePacket> = messages.into_iter().map(GamePacket::from).collect();
        encode_game_packets(&packets).map(Some)
    }

    /// Send one tick's messages across the link and return what arrived.
    pub fn transmit(&mut self, messages: Vec<CreateBullet>) -> Result<Vec<CreateBullet>, ProtoError> {
        let count = messages.len() as u64;
        let Some(datagram) = Self::encode(messages)? else {
            return Ok(Vec::new());
        };
        self.stats.sent += count;
        self.stats.bytes += datagram.len() as u64;

        if self.rng.gen_bool(self.drop_rate) {
            self.stats.dropped += count;
            trace!(count, "datagram dropped");
            return Ok(Vec::new());
        }

        let delivered: Vec<CreateBullet> = decode_game_packets(datagram)?
            .into_iter()
            .map(|packet| match packet {
                GamePacket::CreateBullet(msg) => msg,
            })
            .collect();
        self.stats.delivered += delivered.len() as u64;
        Ok(delivered)
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use volley_proto::types::Vec2;

    fn msg(type_id: u16) -> CreateBullet {
        CreateBullet {
            type_id,
            team: 1,
            position: Vec2::new(1.0, 2.0),
            angle: 33.0,
            velocity_scale: 1.0,
            lifetime_scale: 1.0,
        }
    }

    #[test]
    fn lossless_link_delivers_everything() {
        let mut link = LossyLink::new(0.0, 1);
        let sent = vec![msg(0), msg(3), msg(1)];
        let got = link.transmit(sent.clone()).unwrap();
        assert_eq!(got, sent);
        assert_eq!(link.stats().delivered, 3);
        assert_eq!(link.stats().dropped, 0);
    }

    #[test]
    fn dead_link_drops_everything() {
        let mut link = LossyLink::new(1.0, 1);
        for _ in 0..10 {
            assert!(link.transmit(vec![msg(0), msg(1)]).unwrap().is_empty());
        }
        assert_eq!(link.stats().sent, 20);
        assert_eq!(link.stats().dropped, 20);
        assert_eq!(link.stats().delivered, 0);
    }

    #[test]
    fn empty_tick_sends_nothing() {
        let mut link = LossyLink::new(0.5, 1);
        assert!(link.transmit(Vec::new()).unwrap().is_empty());
        assert_eq!(link.stats(), LinkStats::default());
    }

    #[test]
    fn partial_loss_accounts_every_message() {
        let mut link = LossyLink::new(0.3, 7);
        for _ in 0..200 {
            link.transmit(vec![msg(2)]).unwrap();
        }
        let s = link.stats();
        assert_eq!(s.sent, 200);
        assert_eq!(s.delivered + s.dropped, 200);
        assert!(s.dropped > 0 && s.delivered > 0);
    }
}
