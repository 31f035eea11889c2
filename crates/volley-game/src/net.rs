//! Replication gateway: server-created bullets are queued as `CreateBullet`
//! messages and rebuilt on observers.

use std::fmt;

use bevy_ecs::prelude::*;
use tracing::{trace, warn};
use volley_proto::packets::CreateBullet;
use volley_proto::types::Vec2;

use crate::bullet_type::BulletTypeId;
use crate::components::Team;
use crate::error::BulletError;
use crate::world::{BulletSpawn, BulletWorld};

/// Which side of the replication link a world runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Authoritative: decides creation and replicates it.
    Server,
    /// Observer: only rebuilds what the server sends.
    Client,
}

impl Role {
    pub fn is_authoritative(&self) -> bool {
        matches!(self, Role::Server)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Server => f.write_str("server"),
            Role::Client => f.write_str("client"),
        }
    }
}

/// Creation messages waiting for the host to send them.
#[derive(Resource, Default)]
pub struct ReplicationOutbox {
    pub messages: Vec<CreateBullet>,
}

impl BulletWorld {
    /// Create a bullet on the server and queue exactly one `CreateBullet` for
    /// observers. Owner and payload are never replicated.
    #[allow(clippy::too_many_arguments)]
    pub fn create_net(
        &mut self,
        type_id: BulletTypeId,
        team: Team,
        x: f32,
        y: f32,
        angle: f32,
        velocity_scale: f32,
        lifetime_scale: f32,
    ) -> Result<Entity, BulletError> {
        if !self.role.is_authoritative() {
            warn!(%type_id, role = %self.role, "rejected create_net on observer");
            return Err(BulletError::AuthorityViolation {
                operation: "create_net",
                role: self.role,
            });
        }

        let entity = self.create(
            type_id,
            BulletSpawn::new(team, x, y, angle)
                .velocity_scale(velocity_scale)
                .lifetime_scale(lifetime_scale),
        )?;

        self.world
            .resource_mut::<ReplicationOutbox>()
            .messages
            .push(CreateBullet {
                type_id: type_id.0,
                team: team.0,
                position: Vec2::new(x, y),
                angle,
                velocity_scale,
                lifetime_scale,
            });
        Ok(entity)
    }

    /// Rebuild a server-created bullet on an observer.
    pub fn apply_replicated(&mut self, msg: &CreateBullet) -> Result<Entity, BulletError> {
        if self.role.is_authoritative() {
            return Err(BulletError::AuthorityViolation {
                operation: "apply_replicated",
                role: self.role,
            });
        }
        trace!(type_id = msg.type_id, team = msg.team, "replicated bullet");
        self.create(
            BulletTypeId(msg.type_id),
            BulletSpawn::new(Team(msg.team), msg.position.x, msg.position.y, msg.angle)
                .velocity_scale(msg.velocity_scale)
                .lifetime_scale(msg.lifetime_scale),
        )
    }

    /// Drain queued creation messages, oldest first.
    pub fn drain_replication(&mut self) -> Vec<CreateBullet> {
        std::mem::take(&mut self.world.resource_mut::<ReplicationOutbox>().messages)
    }
}
