//! Errors surfaced by the simulation core.

use bevy_ecs::entity::Entity;
use thiserror::Error;

use crate::bullet_type::BulletTypeId;
use crate::net::Role;

#[derive(Debug, Error)]
pub enum BulletError {
    /// Content that cannot be simulated safely (frag cycles, bad coefficients).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An authoritative-only call made from an observer, or vice versa.
    #[error("{operation} is not allowed on the {role} role")]
    AuthorityViolation { operation: &'static str, role: Role },

    #[error("unknown bullet type: {0}")]
    UnknownType(BulletTypeId),

    /// A creation argument that would leave the bullet unable to move or expire.
    #[error("invalid spawn: {field} must be finite, got {value}")]
    InvalidSpawn { field: &'static str, value: f32 },

    /// The owner or parent passed to a creation call has no team.
    #[error("entity {0:?} cannot own a bullet")]
    InvalidOwner(Entity),
}
