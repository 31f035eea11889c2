//! ECS components for bullets and the units they interact with.

use std::fmt;

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use volley_proto::types::Vec2;

use crate::bullet_type::BulletTypeId;

/// World-local identity, used in outgoing events.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuntimeId(pub u64);

/// Team membership. Different teams are hostile to each other.
#[derive(
    Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Team(pub u8);

impl Team {
    pub const SHARDED: Self = Self(1);
    pub const CRUX: Self = Self(2);

    pub fn is_hostile_to(&self, other: Team) -> bool {
        *self != other
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team {}", self.0)
    }
}

/// Position in world units.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn vec(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

impl From<Vec2> for Position {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

/// Velocity in world units per tick. On units this doubles as the
/// "has velocity" capability read by `keep_velocity` bullets.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
}

impl Velocity {
    pub fn vec(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

impl From<Vec2> for Velocity {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

/// Heading in degrees.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Rotation(pub f32);

/// Payload attached to a bullet by the code that fired it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BulletData {
    /// Homing prefers this unit (runtime id) over the nearest one.
    LockedTarget(u64),
    /// Tint override for lightning discharges, RGBA8888.
    Color(u32),
}

/// Live bullet state.
#[derive(Component, Debug, Clone)]
pub struct Bullet {
    pub type_id: BulletTypeId,
    /// Shooter, if any. Replicated bullets never have one.
    pub owner: Option<Entity>,
    /// Elapsed ticks.
    pub time: f32,
    pub lifetime_scale: f32,
    pub velocity_scale: f32,
    /// Captured from the owner at creation.
    pub damage_multiplier: f32,
    pub data: Option<BulletData>,
    /// Runtime ids of units already hit (piercing bullets).
    pub collided: Vec<u64>,
}

/// Marker: a unit mirrored from the external unit system.
#[derive(Component, Debug)]
pub struct Unit;

/// Collision diameter of a unit.
#[derive(Component, Debug, Clone, Copy)]
pub struct HitSize(pub f32);

/// Damageable capability.
#[derive(Component, Debug, Clone, Copy)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

/// Outgoing damage multiplier of a shooter.
#[derive(Component, Debug, Clone, Copy)]
pub struct DamageMultiplier(pub f32);

/// Marker: the unit is airborne.
#[derive(Component, Debug)]
pub struct Flying;

/// Marker: the unit is dead (pending cleanup).
#[derive(Component, Debug)]
pub struct Dead;
